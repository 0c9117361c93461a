//! Triple walk generation.
//!
//! A triple walk alternates entity and relation ids:
//!
//! ```text
//! [e0, r1, e1, r2, e2, ..., rk, ek]      walk_length = k + 1 entities
//! ```
//!
//! Each hop picks one outgoing triple of the current entity uniformly at
//! random from its row range in the head-sorted triple array. An entity with
//! no outgoing triples ends the walk early; the rest of the row is filled with
//! `padding_idx`, so every row has the same width `2 * walk_length - 1`.
//!
//! ## Restart
//!
//! With `restart` enabled, each hop first flips a coin weighted by
//! `restart_probability`. Heads, the hop is drawn from the start entity's
//! triples instead of the current entity's. The hop source is settled before
//! the dead-end check, so a restart can carry a walk past an entity with no
//! outgoing triples.
//!
//! ## Performance Notes
//!
//! - O(1) per hop: the range lookup is a table read, the draw a single index
//! - Rows are independent and generated in parallel via rayon; each row owns a
//!   generator seeded from `(seed, row)`

use super::rng::stream;
use crate::{Error, HeadRangeIndex, Result};
use ndarray::{Array2, ArrayView2};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{debug, trace};

/// Configuration for triple walks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Number of entity positions per walk (`k + 1` for `k` hops).
    pub walk_length: usize,
    /// Id written into slots after a dead end.
    pub padding_idx: i64,
    /// Allow hops to be drawn from the start entity's triples.
    pub restart: bool,
    /// Probability that a hop restarts from the start entity.
    /// Ignored unless `restart` is set.
    pub restart_probability: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            walk_length: 6,
            padding_idx: -1,
            restart: false,
            restart_probability: 0.5,
            seed: 42,
        }
    }
}

impl WalkConfig {
    pub fn with_walk_length(mut self, walk_length: usize) -> Self {
        self.walk_length = walk_length;
        self
    }

    pub fn with_padding_idx(mut self, padding_idx: i64) -> Self {
        self.padding_idx = padding_idx;
        self
    }

    /// Enable restarts with the given per-hop probability.
    pub fn with_restart(mut self, restart_probability: f64) -> Self {
        self.restart = true;
        self.restart_probability = restart_probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Width of one walk row: `2 * walk_length - 1`.
    pub fn row_len(&self) -> usize {
        (2 * self.walk_length).saturating_sub(1)
    }

    /// Reject parameters that cannot produce fixed-shape output.
    pub fn validate(&self) -> Result<()> {
        if self.walk_length == 0 {
            return Err(Error::InvalidConfig("walk_length must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.restart_probability) {
            return Err(Error::InvalidConfig(format!(
                "restart_probability must lie in [0, 1], got {}",
                self.restart_probability
            )));
        }
        Ok(())
    }
}

/// Generate one walk per start entity.
///
/// # Arguments
/// * `sorted_triples` - Head-sorted `(T, 3)` triple array
/// * `range_index` - Range index built over `sorted_triples`
/// * `start_entities` - Start entity of each row; duplicates give independent walks
/// * `config` - Walk configuration
///
/// # Returns
/// A `(start_entities.len(), 2 * walk_length - 1)` array of walks.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use triple_walk::{build_head_range_index, walk_triples, WalkConfig};
///
/// // 0 -r3-> 1 -r4-> 2, entity 2 is a dead end
/// let triples = array![[0i64, 3, 1], [1, 4, 2]];
/// let (index, sorted) = build_head_range_index(triples.view(), &[0, 1, 2]).unwrap();
///
/// let config = WalkConfig::default().with_walk_length(4).with_padding_idx(5);
/// let walks = walk_triples(sorted.view(), &index, &[0], config).unwrap();
/// assert_eq!(walks.row(0).to_vec(), vec![0, 3, 1, 4, 2, 5, 5]);
/// ```
pub fn walk_triples<'a>(
    sorted_triples: ArrayView2<'a, i64>,
    range_index: &'a HeadRangeIndex,
    start_entities: &[i64],
    config: WalkConfig,
) -> Result<Array2<i64>> {
    TripleWalker::new(sorted_triples, range_index, config)?.walk(start_entities)
}

/// Triple walker over an immutable sorted triple array and its range index.
pub struct TripleWalker<'a> {
    triples: ArrayView2<'a, i64>,
    index: &'a HeadRangeIndex,
    config: WalkConfig,
}

impl<'a> TripleWalker<'a> {
    /// Create a walker, checking that the index addresses rows of `triples`.
    pub fn new(
        triples: ArrayView2<'a, i64>,
        index: &'a HeadRangeIndex,
        config: WalkConfig,
    ) -> Result<Self> {
        config.validate()?;
        if triples.ncols() != 3 {
            return Err(Error::InvalidConfig(format!(
                "triple array must have 3 columns, got {}",
                triples.ncols()
            )));
        }
        let rows = triples.nrows() as i64;
        if let Some(&end) = index.as_array().iter().find(|&&v| v >= rows) {
            return Err(Error::InvalidConfig(format!(
                "range index points at row {end} of a {rows}-row triple array"
            )));
        }
        Ok(Self {
            triples,
            index,
            config,
        })
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Generate all walks in parallel, one row per start entity.
    pub fn walk(&self, start_entities: &[i64]) -> Result<Array2<i64>> {
        for &start in start_entities {
            self.index.range(start)?;
        }

        let rows: Vec<Vec<i64>> = start_entities
            .par_iter()
            .enumerate()
            .map(|(row, &start)| self.walk_row(row, start))
            .collect::<Result<_>>()?;

        let width = self.config.row_len();
        let truncated = rows
            .iter()
            .filter(|w| self.config.walk_length > 1 && w[width - 1] == self.config.padding_idx)
            .count();
        trace!(truncated, "walks padded after a dead end");

        let walks = Array2::from_shape_vec((rows.len(), width), rows.concat())?;
        debug!(
            walks = walks.nrows(),
            width,
            restart = self.config.restart,
            "generated triple walks"
        );
        Ok(walks)
    }

    /// Generate the walk for batch row `row`.
    ///
    /// The row index selects the random stream, so the same `(seed, row,
    /// start)` always yields the same walk.
    pub fn walk_row(&self, row: usize, start: i64) -> Result<Vec<i64>> {
        self.index.range(start)?;

        let mut rng = stream(self.config.seed, row as u64);
        let width = self.config.row_len();
        let mut walk = Vec::with_capacity(width);
        walk.push(start);

        let mut current = start;
        for _ in 1..self.config.walk_length {
            let source = if self.config.restart && rng.random_bool(self.config.restart_probability)
            {
                start
            } else {
                current
            };
            let Some(range) = self.outgoing(source) else {
                break;
            };

            let pick = rng.random_range(range);
            let (relation, tail) = (self.triples[[pick, 1]], self.triples[[pick, 2]]);
            walk.push(relation);
            walk.push(tail);
            current = tail;
        }

        // sticky padding
        walk.resize(width, self.config.padding_idx);
        Ok(walk)
    }

    /// Outgoing rows of `entity`. Ids beyond the index never occur as heads,
    /// so they have none.
    fn outgoing(&self, entity: i64) -> Option<RangeInclusive<usize>> {
        self.index.range(entity).ok().flatten()
    }
}

/// Repeat every start entity `walks_per_node` times, consecutively:
/// `[a, a, b, b]` for `[a, b]` and two walks per node.
pub fn repeat_start_entities(entities: &[i64], walks_per_node: usize) -> Vec<i64> {
    entities
        .iter()
        .flat_map(|&e| std::iter::repeat(e).take(walks_per_node))
        .collect()
}
