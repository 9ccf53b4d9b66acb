//! Sink for converting parser events into a foreign tree.

use crate::node::{ForeignElement, ForeignNode};
use crate::parser::event::Event;

/// Converts parser events into [`ForeignNode`]s.
pub struct Sink {
    events: Vec<Event>,
}

impl Sink {
    /// Create a new sink.
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Consume the sink and build the top-level node sequence.
    pub fn finish(self) -> Vec<ForeignNode> {
        let mut top: Vec<ForeignNode> = Vec::new();
        let mut stack: Vec<ForeignElement> = Vec::new();

        for event in self.events {
            match event {
                Event::Open { name, attrs } => stack.push(ForeignElement {
                    name,
                    attrs,
                    children: Vec::new(),
                }),
                Event::Text(text) => {
                    let siblings = match stack.last_mut() {
                        Some(parent) => &mut parent.children,
                        None => &mut top,
                    };
                    // Adjacent character data is one text node
                    if let Some(ForeignNode::Text(prev)) = siblings.last_mut() {
                        prev.push_str(&text);
                    } else {
                        siblings.push(ForeignNode::Text(text));
                    }
                }
                Event::Close => {
                    let Some(element) = stack.pop() else { continue };
                    let node = ForeignNode::Element(element);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => top.push(node),
                    }
                }
            }
        }

        // Unbalanced input never reaches here from the parser, but a
        // hand-built event list might.
        while let Some(element) = stack.pop() {
            let node = ForeignNode::Element(element);
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => top.push(node),
            }
        }

        top
    }
}
