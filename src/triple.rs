//! Triple types.
//!
//! A labeled [`Triple`] is what the caller ingests; an [`IndexedTriple`] is the
//! same edge after labels have been replaced by ids from a
//! [`Vocabulary`](crate::Vocabulary).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A (head, relation, tail) triple with arbitrary labels.
///
/// # Example
///
/// ```rust
/// use triple_walk::Triple;
///
/// let t: Triple = Triple::new("Ulm", "located_in", "Germany");
/// assert_eq!(t.head, "Ulm");
/// assert_eq!(t.relation, "located_in");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple<L = String> {
    /// Head entity label.
    pub head: L,
    /// Relation label.
    pub relation: L,
    /// Tail entity label.
    pub tail: L,
}

impl<L> Triple<L> {
    /// Create a new triple.
    pub fn new(head: impl Into<L>, relation: impl Into<L>, tail: impl Into<L>) -> Self {
        Self {
            head: head.into(),
            relation: relation.into(),
            tail: tail.into(),
        }
    }
}

impl<L: fmt::Display> fmt::Display for Triple<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.head, self.relation, self.tail)
    }
}

impl<L> From<(L, L, L)> for Triple<L> {
    fn from((head, relation, tail): (L, L, L)) -> Self {
        Self {
            head,
            relation,
            tail,
        }
    }
}

/// A triple in the shared entity/relation id space.
///
/// Entities occupy `[0, E)` and relations `[E, E + R)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexedTriple {
    pub head: i64,
    pub relation: i64,
    pub tail: i64,
}

impl IndexedTriple {
    pub const fn new(head: i64, relation: i64, tail: i64) -> Self {
        Self {
            head,
            relation,
            tail,
        }
    }

    /// The sentinel triple `(padding_idx, padding_idx, padding_idx)`.
    pub const fn padding(padding_idx: i64) -> Self {
        Self::new(padding_idx, padding_idx, padding_idx)
    }

    pub const fn to_array(self) -> [i64; 3] {
        [self.head, self.relation, self.tail]
    }
}

impl From<[i64; 3]> for IndexedTriple {
    fn from([head, relation, tail]: [i64; 3]) -> Self {
        Self::new(head, relation, tail)
    }
}

impl fmt::Display for IndexedTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.head, self.relation, self.tail)
    }
}
