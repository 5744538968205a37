//! Trie nodes for the per-method route tree.
//!
//! # Responsibilities
//! - Hold one segment position of the route tree
//! - Keep children in insertion order and find them by raw text on insert
//! - Pick the child for a request segment by a fixed priority
//!
//! # Design Decisions
//! - Children live in a `Vec`, not a map, so resolution order never depends
//!   on hash iteration
//! - Priority per level: exact static text, then the first parameter child,
//!   then the first wildcard child
//! - Terminal nodes point at a value slot owned by the router

use std::sync::Arc;

use crate::routing::pattern::{binding_name, Segment, SegmentKind};

/// One segment position in a method's trie.
#[derive(Debug)]
pub struct Node {
    part: String,
    kind: SegmentKind,
    children: Vec<Node>,
    pattern: Option<Arc<str>>,
    slot: Option<usize>,
}

impl Node {
    pub(crate) fn root() -> Self {
        Self {
            part: String::new(),
            kind: SegmentKind::Static,
            children: Vec::new(),
            pattern: None,
            slot: None,
        }
    }

    fn from_segment(segment: Segment<'_>) -> Self {
        Self {
            part: segment.raw().to_string(),
            kind: segment.kind(),
            children: Vec::new(),
            pattern: None,
            slot: None,
        }
    }

    /// Raw segment text, marker included.
    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// True when this node matches any segment (parameter or wildcard).
    pub fn is_wild(&self) -> bool {
        self.kind.accepts_any()
    }

    /// Name a parameter or wildcard match binds to.
    pub fn name(&self) -> &str {
        binding_name(&self.part, self.kind)
    }

    /// Full pattern registered at this node, if terminal.
    pub fn pattern(&self) -> Option<&Arc<str>> {
        self.pattern.as_ref()
    }

    pub(crate) fn slot(&self) -> Option<usize> {
        self.slot
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child keyed by the exact raw text of `segment`, created if missing.
    pub(crate) fn child_or_insert(&mut self, segment: Segment<'_>) -> &mut Node {
        let index = match self.children.iter().position(|c| c.part == segment.raw()) {
            Some(index) => index,
            None => {
                self.children.push(Node::from_segment(segment));
                self.children.len() - 1
            }
        };
        &mut self.children[index]
    }

    /// Child accepting one request segment, by static > param > wildcard.
    pub(crate) fn match_child(&self, segment: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.kind == SegmentKind::Static && c.part == segment)
            .or_else(|| self.first_of(SegmentKind::Param))
            .or_else(|| self.first_of(SegmentKind::Wildcard))
    }

    pub(crate) fn wildcard_child(&self) -> Option<&Node> {
        self.first_of(SegmentKind::Wildcard)
    }

    fn first_of(&self, kind: SegmentKind) -> Option<&Node> {
        self.children.iter().find(|c| c.kind == kind)
    }

    pub(crate) fn set_terminal(&mut self, pattern: Arc<str>, slot: usize) {
        self.pattern = Some(pattern);
        self.slot = Some(slot);
    }
}
