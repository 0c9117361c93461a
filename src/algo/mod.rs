//! Walk and window algorithms.
//!
//! - [`walk`] - Triple walks over a head range index
//! - [`window`] - Skip-gram and CBOW windows over walks

pub(crate) mod rng;
pub mod walk;
pub mod window;
