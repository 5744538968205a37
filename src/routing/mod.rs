//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (setup phase):
//!     (method, pattern, value)
//!     → pattern.rs (split into static / :param / *wildcard segments)
//!     → router.rs (walk or grow the method's trie)
//!     → trie.rs (terminal node stores pattern + value slot)
//!
//! Lookup (serving phase):
//!     (method, path)
//!     → pattern.rs (split path)
//!     → trie.rs (per-level child choice: static > param > wildcard)
//!     → Return: Match { value, pattern, params } or None
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - Deterministic: sibling priority is fixed, never map-order dependent
//! - No regex, no backtracking: O(segments × siblings)

pub mod params;
pub mod pattern;
pub mod router;
pub mod trie;

pub use params::Params;
pub use pattern::{parse_pattern, Segment, SegmentKind};
pub use router::{Match, Router};
