//! Route lookup.
//!
//! # Responsibilities
//! - Keep one trie root per HTTP method
//! - Insert patterns with an associated value (last insert wins)
//! - Resolve a concrete path into a value plus parameter bindings
//! - Expose the flat `METHOD-pattern` table for introspection
//!
//! # Design Decisions
//! - Built during a single-writer setup phase, read-only while serving
//! - No backtracking: each level commits to the highest-priority child
//! - No match is `None`, never an error
//! - Values live in a slot table; trie nodes and flat-table entries refer to
//!   slots, so both views always agree on the current value

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::http::Method;

use crate::routing::params::Params;
use crate::routing::pattern::{parse_pattern, split_path, SegmentKind};
use crate::routing::trie::Node;

/// Result of a successful lookup.
#[derive(Debug)]
pub struct Match<'r, T> {
    /// Value registered for the matched pattern.
    pub value: &'r T,
    /// Pattern string stored at the matched node.
    pub pattern: Arc<str>,
    /// Bindings from parameter and wildcard segments.
    pub params: Params,
}

/// Per-method segment trie.
#[derive(Debug)]
pub struct Router<T> {
    roots: HashMap<Method, Node>,
    slots: Vec<T>,
    table: BTreeMap<String, usize>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self {
            roots: HashMap::new(),
            slots: Vec::new(),
            table: BTreeMap::new(),
        }
    }

    /// Register `value` for `(method, pattern)`.
    ///
    /// Re-registering a pattern that lands on an existing terminal node
    /// replaces the value stored there.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) {
        let key = route_key(&method, pattern);
        let mut node = self.roots.entry(method).or_insert_with(Node::root);
        for segment in parse_pattern(pattern) {
            node = node.child_or_insert(segment);
        }

        let slot = match node.slot() {
            Some(slot) => {
                self.slots[slot] = value;
                slot
            }
            None => {
                self.slots.push(value);
                self.slots.len() - 1
            }
        };
        node.set_terminal(Arc::from(pattern), slot);
        self.table.insert(key, slot);
    }

    /// Resolve `path` under `method`.
    pub fn search<'r>(&'r self, method: &Method, path: &str) -> Option<Match<'r, T>> {
        let root = self.roots.get(method)?;
        let parts: Vec<&str> = split_path(path).collect();
        let mut params = Params::new();
        let mut node = root;

        for (i, part) in parts.iter().enumerate() {
            let child = node.match_child(part)?;
            match child.kind() {
                SegmentKind::Wildcard => {
                    params.insert(child.name(), parts[i..].join("/"));
                    return self.resolve(child, params);
                }
                SegmentKind::Param => params.insert(child.name(), *part),
                SegmentKind::Static => {}
            }
            node = child;
        }

        // A wildcard also accepts zero remaining segments.
        if node.slot().is_none() {
            if let Some(wildcard) = node.wildcard_child() {
                params.insert(wildcard.name(), "");
                node = wildcard;
            }
        }
        self.resolve(node, params)
    }

    fn resolve<'r>(&'r self, node: &'r Node, params: Params) -> Option<Match<'r, T>> {
        let slot = node.slot()?;
        let pattern = node.pattern()?.clone();
        Some(Match {
            value: &self.slots[slot],
            pattern,
            params,
        })
    }

    /// Value registered under the exact `(method, pattern)` pair.
    pub fn get(&self, method: &Method, pattern: &str) -> Option<&T> {
        self.table
            .get(&route_key(method, pattern))
            .map(|&slot| &self.slots[slot])
    }

    /// Flat `METHOD-pattern` keys with their values, sorted by key.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &T)> {
        self.table
            .iter()
            .map(|(key, &slot)| (key.as_str(), &self.slots[slot]))
    }

    /// Number of registered `(method, pattern)` keys.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Trie root for a method, if any route was registered under it.
    pub fn root(&self, method: &Method) -> Option<&Node> {
        self.roots.get(method)
    }
}

fn route_key(method: &Method, pattern: &str) -> String {
    format!("{}-{}", method, pattern)
}
