//! Node variants of the document grammar.

/// What a node in the document tree is.
///
/// Leaves are [`NodeKind::Text`], [`NodeKind::Void`] and [`NodeKind::Caret`];
/// everything else may have children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The single root of a document or fragment
    Root,
    /// Character data; offsets into it are counted in `char`s
    Text(String),
    /// Zero-width anchor kept inside an otherwise empty styled region
    Caret,
    /// A leaf that occupies one offset position
    Void(VoidKind),
    /// Inline formatting
    Wrapper(Wrapper),
    /// Block-level container
    Block(Block),
}

impl NodeKind {
    pub fn text(text: impl Into<String>) -> Self {
        NodeKind::Text(text.into())
    }

    pub fn division() -> Self {
        NodeKind::Block(Block::new(BlockTag::Division))
    }

    pub fn indent() -> Self {
        NodeKind::Block(Block {
            tag: BlockTag::Division,
            align: None,
            indent: true,
        })
    }

    pub fn list(kind: ListKind) -> Self {
        NodeKind::Block(Block::new(BlockTag::List(kind)))
    }

    pub fn list_item() -> Self {
        NodeKind::Block(Block::new(BlockTag::ListItem {
            marker_hidden: false,
        }))
    }

    pub fn line_break() -> Self {
        NodeKind::Void(VoidKind::LineBreak)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, NodeKind::Text(_) | NodeKind::Caret | NodeKind::Void(_))
    }

    /// Text, caret, void or wrapper.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeKind::Text(_) | NodeKind::Caret | NodeKind::Void(_) | NodeKind::Wrapper(_)
        )
    }

    pub fn is_block(&self) -> bool {
        matches!(self, NodeKind::Block(_))
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            NodeKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut Block> {
        match self {
            NodeKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_wrapper(&self) -> Option<&Wrapper> {
        match self {
            NodeKind::Wrapper(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    pub fn block_tag(&self) -> Option<BlockTag> {
        self.as_block().map(|b| b.tag)
    }

    pub fn is_list(&self) -> bool {
        matches!(self.block_tag(), Some(BlockTag::List(_)))
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self.block_tag(), Some(BlockTag::ListItem { .. }))
    }

    pub fn is_quote(&self) -> bool {
        matches!(self.block_tag(), Some(BlockTag::Quote))
    }

    pub fn is_indent(&self) -> bool {
        self.as_block().is_some_and(|b| b.indent)
    }
}

/// Leaves without children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoidKind {
    Image(ImageAttrs),
    LineBreak,
    Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageAttrs {
    pub src: String,
    pub alt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Inline formatting wrappers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Wrapper {
    Link { href: String },
    Span(SpanAttrs),
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
}

/// Attribute-valued styles carried by a generic span.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanAttrs {
    pub font_family: Option<String>,
    pub font_size: Option<String>,
    pub color: Option<String>,
    pub background: Option<String>,
}

impl SpanAttrs {
    pub fn is_empty(&self) -> bool {
        self.font_family.is_none()
            && self.font_size.is_none()
            && self.color.is_none()
            && self.background.is_none()
    }

    /// Overlay `inner` on top of `self`; inner values win.
    pub fn merge(&mut self, inner: &SpanAttrs) {
        if inner.font_family.is_some() {
            self.font_family.clone_from(&inner.font_family);
        }
        if inner.font_size.is_some() {
            self.font_size.clone_from(&inner.font_size);
        }
        if inner.color.is_some() {
            self.color.clone_from(&inner.color);
        }
        if inner.background.is_some() {
            self.background.clone_from(&inner.background);
        }
    }
}

/// A block container and its block-level attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub tag: BlockTag,
    pub align: Option<Alignment>,
    /// One fixed left-margin step; only meaningful on divisions
    pub indent: bool,
}

impl Block {
    pub fn new(tag: BlockTag) -> Self {
        Self {
            tag,
            align: None,
            indent: false,
        }
    }

    /// A division carrying no attributes at all.
    pub fn is_plain_division(&self) -> bool {
        self.tag == BlockTag::Division && self.align.is_none() && !self.indent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Division,
    /// Level 1-6
    Heading(u8),
    Quote,
    List(ListKind),
    ListItem { marker_hidden: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListKind {
    Ordered,
    Unordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}
