//! Error types for triple-walk.

use thiserror::Error;

/// Error type for indexing, walking and windowing.
#[derive(Error, Debug)]
pub enum Error {
    /// A label was looked up in a map that does not contain it.
    #[error("Unknown {kind} label: {label}")]
    UnknownLabel {
        /// "entity" or "relation".
        kind: &'static str,
        /// Debug rendering of the missing label.
        label: String,
    },

    /// Parameters that cannot produce well-formed output.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No triple exists to index or sample from.
    #[error("Triple set is empty")]
    EmptyTriples,

    /// An entity id outside the head range index.
    #[error("Entity {entity} out of range for index of {len} entities")]
    EntityOutOfRange {
        /// The offending id.
        entity: i64,
        /// Number of rows in the range index.
        len: usize,
    },

    /// Output assembly produced an inconsistent shape.
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for triple-walk operations.
pub type Result<T> = std::result::Result<T, Error>;
