//! The foreign tree: markup exactly as it arrived, before sanitizing.
//!
//! Nothing here is constrained by the editing grammar. Tag and attribute
//! names are lowercased, entities are decoded, everything else is kept.

/// A node of a foreign (pasted or dropped) markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignNode {
    /// Decoded character data.
    Text(String),
    /// An element with its attributes and children.
    Element(ForeignElement),
}

/// An element of a foreign tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForeignElement {
    /// Lowercased tag name.
    pub name: String,
    /// Attributes in source order, names lowercased, values decoded.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<ForeignNode>,
}

impl ForeignNode {
    /// Shorthand for a text node.
    pub fn text(text: impl Into<String>) -> Self {
        ForeignNode::Text(text.into())
    }

    /// Shorthand for an element without attributes.
    pub fn element(name: &str, children: Vec<ForeignNode>) -> Self {
        ForeignNode::Element(ForeignElement {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
            children,
        })
    }

    /// Shorthand for an element with attributes.
    pub fn element_with(
        name: &str,
        attrs: &[(&str, &str)],
        children: Vec<ForeignNode>,
    ) -> Self {
        ForeignNode::Element(ForeignElement {
            name: name.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            children,
        })
    }

    /// Concatenated character data of this subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            ForeignNode::Text(text) => out.push_str(text),
            ForeignNode::Element(el) => {
                for child in &el.children {
                    child.collect_text(out);
                }
            }
        }
    }
}

impl ForeignElement {
    /// First value of the named attribute, if present.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}
