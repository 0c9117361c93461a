//! Walk windowing for skip-gram and CBOW training.
//!
//! A walk of width `2k + 1` holds `k` hop triples. Every hop becomes one
//! record: the hop itself (the *target*), `2 * window_size` positive context
//! triples taken from the same walk, and negative triples drawn uniformly with
//! replacement from the full triple array.
//!
//! ```text
//! walk:     e0 r1 e1 r2 e2 r3 e3 ...
//! record 1: (e0 r1 e1)            target ends at entity 1
//! record 2:       (e1 r2 e2)      target ends at entity 2
//! ```
//!
//! Entity 0 alone has no hop ending at it, so it yields no record. Targets that
//! lie entirely in the padded tail of a walk are skipped; a target with at
//! least one real id is kept.
//!
//! # Context layouts
//!
//! [`ContextLayout::Reference`] reads context slots straight from walk offsets.
//! For a target ending at walk offset `c`, preceding slot `j` (nearest first)
//! is `(w[c-3-2j], w[c-3-2j], w[c-2-2j])` and following slot `j` is
//! `(w[c+2j], w[c+2j+1], w[c+2j+2])`. Each offset outside the walk reads as
//! `padding_idx` on its own, so boundary slots can be partially padded, e.g.
//! `[-1, -1, 11]`. This is the layout trained models and their fixtures
//! expect.
//!
//! [`ContextLayout::Positional`] uses whole hop triples: the `window_size`
//! hops before the target (oldest first), then the `window_size` hops after it
//! (nearest first). Hops outside the walk become the sentinel
//! `(padding_idx, padding_idx, padding_idx)`.
//!
//! # Determinism
//!
//! Negatives for the record ending at entity `i` of walk row `r` come from a
//! generator seeded by `(seed, r * k + i - 1)`, independent of which records
//! were skipped. The CBOW negative of a record is the first
//! skip-gram negative of the same record.

use super::rng::stream;
use crate::{Error, Result};
use ndarray::{Array2, Array3, ArrayView1, ArrayView2};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How positive context slots are read from a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLayout {
    /// Offset-based slots with per-id padding.
    #[default]
    Reference,
    /// Whole hop triples, oldest-first before the target.
    Positional,
}

/// Configuration for window extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Context triples on each side of the target.
    pub window_size: usize,
    /// Size of the id space; real ids must lie in `[0, num_nodes)`.
    /// `None` skips the check.
    pub num_nodes: Option<usize>,
    /// Reserved padding id.
    pub padding_idx: i64,
    /// Random seed for negative sampling.
    pub seed: u64,
    /// Context slot layout.
    pub layout: ContextLayout,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_size: 4,
            num_nodes: None,
            padding_idx: -1,
            seed: 42,
            layout: ContextLayout::Reference,
        }
    }
}

impl WindowConfig {
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_num_nodes(mut self, num_nodes: usize) -> Self {
        self.num_nodes = Some(num_nodes);
        self
    }

    pub fn with_padding_idx(mut self, padding_idx: i64) -> Self {
        self.padding_idx = padding_idx;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_layout(mut self, layout: ContextLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Context slots per record, `2 * window_size`.
    pub fn context_len(&self) -> usize {
        2 * self.window_size
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidConfig("window_size must be positive".into()));
        }
        if self.num_nodes == Some(0) {
            return Err(Error::InvalidConfig("num_nodes must be positive".into()));
        }
        Ok(())
    }
}

/// Skip-gram records: one target, a positive window and a negative window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipGramWindows {
    /// `(P, 3)`
    pub targets: Array2<i64>,
    /// `(P, 2w, 3)`
    pub pos_windows: Array3<i64>,
    /// `(P, 2w, 3)`
    pub neg_windows: Array3<i64>,
}

impl SkipGramWindows {
    /// Number of records `P`.
    pub fn len(&self) -> usize {
        self.targets.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.nrows() == 0
    }
}

/// CBOW records: a context window predicting one positive and one negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbowWindows {
    /// `(P, 3)`
    pub pos_triples: Array2<i64>,
    /// `(P, 3)`
    pub neg_triples: Array2<i64>,
    /// `(P, 2w, 3)`
    pub windows: Array3<i64>,
}

impl CbowWindows {
    pub fn len(&self) -> usize {
        self.pos_triples.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.pos_triples.nrows() == 0
    }
}

/// Skip-gram windows with the reference layout.
///
/// # Returns
/// `(target[P,3], pos[P,2w,3], neg[P,2w,3])` as a [`SkipGramWindows`].
pub fn to_windows_triples(
    walks: ArrayView2<'_, i64>,
    window_size: usize,
    num_nodes: usize,
    padding_idx: i64,
    triples: ArrayView2<'_, i64>,
    seed: u64,
) -> Result<SkipGramWindows> {
    let config = WindowConfig::default()
        .with_window_size(window_size)
        .with_num_nodes(num_nodes)
        .with_padding_idx(padding_idx)
        .with_seed(seed);
    WindowExtractor::new(triples, config)?.skip_gram(walks)
}

/// CBOW windows with the reference layout.
///
/// # Returns
/// `(pos[P,3], neg[P,3], windows[P,2w,3])` as a [`CbowWindows`].
pub fn to_windows_triples_cbow(
    walks: ArrayView2<'_, i64>,
    window_size: usize,
    num_nodes: usize,
    padding_idx: i64,
    triples: ArrayView2<'_, i64>,
    seed: u64,
) -> Result<CbowWindows> {
    let config = WindowConfig::default()
        .with_window_size(window_size)
        .with_num_nodes(num_nodes)
        .with_padding_idx(padding_idx)
        .with_seed(seed);
    WindowExtractor::new(triples, config)?.cbow(walks)
}

/// One emitted record before assembly.
struct Record {
    target: [i64; 3],
    context: Vec<[i64; 3]>,
    negatives: Vec<[i64; 3]>,
}

/// Window extractor over an immutable triple array used for negatives.
pub struct WindowExtractor<'a> {
    triples: ArrayView2<'a, i64>,
    config: WindowConfig,
}

impl<'a> WindowExtractor<'a> {
    /// Validate the configuration and the negative pool.
    pub fn new(triples: ArrayView2<'a, i64>, config: WindowConfig) -> Result<Self> {
        config.validate()?;
        if triples.ncols() != 3 {
            return Err(Error::InvalidConfig(format!(
                "triple array must have 3 columns, got {}",
                triples.ncols()
            )));
        }
        if triples.nrows() == 0 {
            return Err(Error::EmptyTriples);
        }
        Ok(Self { triples, config })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Skip-gram orientation: `2 * window_size` negatives per record.
    pub fn skip_gram(&self, walks: ArrayView2<'_, i64>) -> Result<SkipGramWindows> {
        let records = self.extract(walks, self.config.context_len())?;
        let (p, c) = (records.len(), self.config.context_len());

        let mut targets = Vec::with_capacity(p * 3);
        let mut pos = Vec::with_capacity(p * c * 3);
        let mut neg = Vec::with_capacity(p * c * 3);
        for record in records {
            targets.extend_from_slice(&record.target);
            pos.extend(record.context.into_iter().flatten());
            neg.extend(record.negatives.into_iter().flatten());
        }

        Ok(SkipGramWindows {
            targets: Array2::from_shape_vec((p, 3), targets)?,
            pos_windows: Array3::from_shape_vec((p, c, 3), pos)?,
            neg_windows: Array3::from_shape_vec((p, c, 3), neg)?,
        })
    }

    /// CBOW orientation: one negative per record.
    pub fn cbow(&self, walks: ArrayView2<'_, i64>) -> Result<CbowWindows> {
        let records = self.extract(walks, 1)?;
        let (p, c) = (records.len(), self.config.context_len());

        let mut pos = Vec::with_capacity(p * 3);
        let mut neg = Vec::with_capacity(p * 3);
        let mut windows = Vec::with_capacity(p * c * 3);
        for record in records {
            pos.extend_from_slice(&record.target);
            neg.extend(record.negatives.into_iter().flatten());
            windows.extend(record.context.into_iter().flatten());
        }

        Ok(CbowWindows {
            pos_triples: Array2::from_shape_vec((p, 3), pos)?,
            neg_triples: Array2::from_shape_vec((p, 3), neg)?,
            windows: Array3::from_shape_vec((p, c, 3), windows)?,
        })
    }

    fn check_walks(&self, walks: ArrayView2<'_, i64>) -> Result<()> {
        if walks.ncols() % 2 == 0 {
            return Err(Error::InvalidConfig(format!(
                "walk rows must have odd width, got {}",
                walks.ncols()
            )));
        }
        if let Some(num_nodes) = self.config.num_nodes {
            let pad = self.config.padding_idx;
            if let Some(&bad) = walks
                .iter()
                .find(|&&v| v != pad && (v < 0 || v as u64 >= num_nodes as u64))
            {
                return Err(Error::InvalidConfig(format!(
                    "walk id {bad} outside [0, {num_nodes})"
                )));
            }
        }
        Ok(())
    }

    fn extract(&self, walks: ArrayView2<'_, i64>, negatives: usize) -> Result<Vec<Record>> {
        self.check_walks(walks)?;
        let hops = walks.ncols() / 2;

        let records: Vec<Record> = (0..walks.nrows())
            .into_par_iter()
            .flat_map_iter(|row| {
                let walk = walks.row(row);
                (1..=hops).filter_map(move |i| {
                    let key = (row * hops + i - 1) as u64;
                    self.record(walk, i, key, negatives)
                })
            })
            .collect();

        debug!(
            walks = walks.nrows(),
            records = records.len(),
            window_size = self.config.window_size,
            layout = ?self.config.layout,
            "extracted walk windows"
        );
        Ok(records)
    }

    /// Record for the hop ending at entity `i` (1-based), or `None` when the
    /// target is padding only.
    fn record(
        &self,
        walk: ArrayView1<'_, i64>,
        i: usize,
        key: u64,
        negatives: usize,
    ) -> Option<Record> {
        let pad = self.config.padding_idx;
        let c = 2 * i;
        let target = [walk[c - 2], walk[c - 1], walk[c]];
        if target.iter().all(|&v| v == pad) {
            return None;
        }

        let context = match self.config.layout {
            ContextLayout::Reference => self.reference_context(walk, c as isize),
            ContextLayout::Positional => self.positional_context(walk, i - 1),
        };

        let mut rng = stream(self.config.seed, key);
        let negatives = (0..negatives)
            .map(|_| {
                let row = rng.random_range(0..self.triples.nrows());
                [
                    self.triples[[row, 0]],
                    self.triples[[row, 1]],
                    self.triples[[row, 2]],
                ]
            })
            .collect();

        Some(Record {
            target,
            context,
            negatives,
        })
    }

    fn reference_context(&self, walk: ArrayView1<'_, i64>, c: isize) -> Vec<[i64; 3]> {
        let pad = self.config.padding_idx;
        let at = |idx: isize| -> i64 {
            usize::try_from(idx)
                .ok()
                .and_then(|i| walk.get(i).copied())
                .unwrap_or(pad)
        };

        let w = self.config.window_size as isize;
        let before = (0..w).map(|j| {
            let o = c - 3 - 2 * j;
            [at(o), at(o), at(o + 1)]
        });
        let after = (0..w).map(|j| {
            let o = c + 2 * j;
            [at(o), at(o + 1), at(o + 2)]
        });
        before.chain(after).collect()
    }

    fn positional_context(&self, walk: ArrayView1<'_, i64>, position: usize) -> Vec<[i64; 3]> {
        let sentinel = [self.config.padding_idx; 3];
        let hops = walk.len() / 2;
        let hop = |q: isize| -> [i64; 3] {
            match usize::try_from(q) {
                Ok(q) if q < hops => [walk[2 * q], walk[2 * q + 1], walk[2 * q + 2]],
                _ => sentinel,
            }
        };

        let (p, w) = (position as isize, self.config.window_size as isize);
        (p - w..p).chain(p + 1..=p + w).map(hop).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, s};

    #[test]
    fn test_reference_layout_by_hand() {
        let walks = array![[0i64, 5, 1, 6, 2, 7, 3]];
        let triples = array![[0i64, 5, 1], [1, 6, 2], [2, 7, 3]];
        let out = to_windows_triples(walks.view(), 2, 8, 9, triples.view(), 1).unwrap();

        assert_eq!(out.targets, array![[0i64, 5, 1], [1, 6, 2], [2, 7, 3]]);
        assert_eq!(
            out.pos_windows,
            array![
                [[9i64, 9, 0], [9, 9, 9], [1, 6, 2], [2, 7, 3]],
                [[5, 5, 1], [9, 9, 0], [2, 7, 3], [3, 9, 9]],
                [[6, 6, 2], [5, 5, 1], [3, 9, 9], [9, 9, 9]]
            ]
        );
        assert_eq!(out.neg_windows.dim(), (3, 4, 3));
    }

    #[test]
    fn test_positional_layout_by_hand() {
        let walks = array![[0i64, 5, 1, 6, 2, 7, 3]];
        let triples = array![[0i64, 5, 1]];
        let config = WindowConfig::default()
            .with_window_size(2)
            .with_padding_idx(9)
            .with_layout(ContextLayout::Positional);
        let out = WindowExtractor::new(triples.view(), config)
            .unwrap()
            .skip_gram(walks.view())
            .unwrap();

        assert_eq!(
            out.pos_windows,
            array![
                [[9i64, 9, 9], [9, 9, 9], [1, 6, 2], [2, 7, 3]],
                [[9, 9, 9], [0, 5, 1], [2, 7, 3], [9, 9, 9]],
                [[0, 5, 1], [1, 6, 2], [9, 9, 9], [9, 9, 9]]
            ]
        );
        // a single-row pool makes every negative that row
        assert!(out.neg_windows.iter().zip([0i64, 5, 1].iter().cycle()).all(|(a, b)| a == b));
    }

    #[test]
    fn test_padded_targets_skipped() {
        let walks = array![[4i64, 9, 9, 9, 9], [0, 5, 1, 6, 2]];
        let triples = array![[0i64, 5, 1]];
        let out = to_windows_triples(walks.view(), 1, 8, 9, triples.view(), 3).unwrap();
        // row 0 keeps (4, 9, 9) only, row 1 keeps both hops
        assert_eq!(out.targets, array![[4i64, 9, 9], [0, 5, 1], [1, 6, 2]]);
    }

    #[test]
    fn test_cbow_matches_skip_gram() {
        let walks = array![[0i64, 5, 1, 6, 2, 7, 3], [3, 7, 0, 5, 2, 6, 1]];
        let triples = array![[0i64, 5, 1], [1, 6, 2], [2, 7, 3], [3, 7, 0], [0, 5, 2]];
        let sg = to_windows_triples(walks.view(), 2, 8, 9, triples.view(), 11).unwrap();
        let cbow = to_windows_triples_cbow(walks.view(), 2, 8, 9, triples.view(), 11).unwrap();

        assert_eq!(cbow.windows, sg.pos_windows);
        assert_eq!(cbow.pos_triples, sg.targets);
        assert_eq!(cbow.neg_triples, sg.neg_windows.slice(s![.., 0, ..]));
    }

    #[test]
    fn test_invalid_inputs() {
        let walks = array![[0i64, 5, 1]];
        let triples = array![[0i64, 5, 1]];
        let empty = Array2::<i64>::zeros((0, 3));

        assert!(matches!(
            to_windows_triples(walks.view(), 0, 8, 9, triples.view(), 1),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            to_windows_triples(walks.view(), 1, 8, 9, empty.view(), 1),
            Err(Error::EmptyTriples)
        ));
        assert!(to_windows_triples(walks.view(), 1, 0, 9, triples.view(), 1).is_err());
        // id 5 is outside a 4-node space
        assert!(to_windows_triples(walks.view(), 1, 4, 9, triples.view(), 1).is_err());
        // even width is not a walk
        let even = array![[0i64, 5, 1, 6]];
        assert!(to_windows_triples(even.view(), 1, 8, 9, triples.view(), 1).is_err());
    }

    #[test]
    fn test_single_entity_walks_yield_no_records() {
        let walks = array![[0i64], [1]];
        let triples = array![[0i64, 2, 1]];
        let out = to_windows_triples(walks.view(), 2, 3, 9, triples.view(), 1).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.pos_windows.dim(), (0, 4, 3));
    }
}
