#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

//! Training data sampling for knowledge graph embeddings.
//!
//! `triple-walk` turns a set of (head, relation, tail) triples into integer
//! tensors for skip-gram or CBOW style contrastive training:
//!
//! 1. [`index_triples`] / [`build_head_range_index`] - ids and a per-head
//!    row range index over the head-sorted triple array
//! 2. [`walk_triples`] - fixed-length walks alternating entity and relation ids
//! 3. [`to_windows_triples`] / [`to_windows_triples_cbow`] - per-hop records with
//!    positive context from the walk and negatives sampled from all triples
//!
//! # One id space
//!
//! Walks hold entities and relations in a single integer row, so the two share
//! one contiguous id space:
//!
//! ```text
//! entities   0 .. E
//! relations  E .. E + R
//! padding    E + R        (conventional; any id outside the vocabulary works)
//! ```
//!
//! The trainer maps `padding_idx` to a zero, no-gradient embedding row.
//!
//! # Determinism and parallelism
//!
//! Nothing here holds a global generator. Every walk row and every window record
//! draws from its own stream derived from `(seed, element)`, and rows are
//! computed in parallel with rayon. The same inputs and seed reproduce the same
//! output bit for bit, whatever the thread count.
//!
//! # Example
//!
//! ```rust
//! use triple_walk::{
//!     build_head_range_index, index_triples, to_windows_triples, walk_triples, Triple,
//!     WalkConfig,
//! };
//!
//! let table: Vec<Triple> = vec![
//!     Triple::new("Einstein", "born_in", "Ulm"),
//!     Triple::new("Ulm", "located_in", "Germany"),
//!     Triple::new("Germany", "member_of", "EU"),
//! ];
//!
//! let (triples, vocab) = index_triples(&table).unwrap();
//! let (index, sorted) = build_head_range_index(triples.view(), &vocab.entity_ids()).unwrap();
//!
//! let padding_idx = vocab.padding_idx();
//! let config = WalkConfig::default()
//!     .with_walk_length(4)
//!     .with_padding_idx(padding_idx);
//! let walks = walk_triples(sorted.view(), &index, &vocab.entity_ids(), config).unwrap();
//! assert_eq!(walks.dim(), (4, 7));
//!
//! let windows = to_windows_triples(
//!     walks.view(),
//!     2,
//!     vocab.len() + 1,
//!     padding_idx,
//!     sorted.view(),
//!     20,
//! )
//! .unwrap();
//! assert_eq!(windows.pos_windows.dim().1, 4);
//! ```

pub mod algo;
mod config;
mod error;
mod index;
pub mod sampler;
mod triple;
mod vocab;

pub use algo::walk::{repeat_start_entities, walk_triples, TripleWalker, WalkConfig};
pub use algo::window::{
    to_windows_triples, to_windows_triples_cbow, CbowWindows, ContextLayout, SkipGramWindows,
    WindowConfig, WindowExtractor,
};
pub use config::SamplerConfig;
pub use error::{Error, Result};
pub use index::{build_head_range_index, index_triples, HeadRangeIndex, NO_RANGE};
pub use sampler::TripleWalkSampler;
pub use triple::{IndexedTriple, Triple};
pub use vocab::Vocabulary;

// Re-export ndarray for callers building inputs
pub use ndarray;
