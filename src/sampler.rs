//! Epoch-level sampling pipeline.
//!
//! [`TripleWalkSampler`] indexes a labeled table once and then produces fresh
//! training windows per epoch: new walks from every entity, then skip-gram or
//! CBOW windows over them. Walks are not kept between epochs.
//!
//! # Example
//!
//! ```rust
//! use triple_walk::{SamplerConfig, Triple, TripleWalkSampler};
//!
//! let table: Vec<Triple> = vec![
//!     Triple::new("A", "r1", "B"),
//!     Triple::new("B", "r2", "C"),
//!     Triple::new("C", "r1", "A"),
//! ];
//! let config = SamplerConfig::default().with_walk_length(4).with_window_size(2);
//! let sampler = TripleWalkSampler::from_labeled(&table, config).unwrap();
//!
//! let batch = sampler.epoch(0).unwrap();
//! assert_eq!(batch.pos_windows.dim().1, 4);
//! assert_eq!(sampler.padding_idx(), 5);
//! ```

use crate::algo::walk::{repeat_start_entities, TripleWalker, WalkConfig};
use crate::algo::window::{CbowWindows, SkipGramWindows, WindowConfig, WindowExtractor};
use crate::{
    build_head_range_index, index_triples, Error, HeadRangeIndex, Result, SamplerConfig, Triple,
    Vocabulary,
};
use ndarray::Array2;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// Offset between the walk seed and the negative-sampling seed of an epoch.
const NEGATIVE_SEED_OFFSET: u64 = 0x5851_F42D_4C95_7F2D;

/// Indexed graph plus the configuration to sample it.
#[derive(Debug, Clone)]
pub struct TripleWalkSampler<L = String> {
    vocab: Vocabulary<L>,
    sorted_triples: Array2<i64>,
    index: HeadRangeIndex,
    config: SamplerConfig,
}

impl<L> TripleWalkSampler<L>
where
    L: Eq + Hash + Clone + Debug,
{
    /// Index `table` and build the head range index.
    pub fn from_labeled(table: &[Triple<L>], config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        if table.is_empty() {
            return Err(Error::EmptyTriples);
        }

        let (triples, vocab) = index_triples(table)?;
        if let Some(pad) = config.padding_idx {
            if (0..vocab.len() as i64).contains(&pad) {
                return Err(Error::InvalidConfig(format!(
                    "padding_idx {pad} collides with a vocabulary id"
                )));
            }
        }
        let (index, sorted_triples) = build_head_range_index(triples.view(), &vocab.entity_ids())?;

        Ok(Self {
            vocab,
            sorted_triples,
            index,
            config,
        })
    }
}

impl<L> TripleWalkSampler<L> {
    pub fn vocab(&self) -> &Vocabulary<L> {
        &self.vocab
    }

    /// Head-sorted `(T, 3)` triple array.
    pub fn sorted_triples(&self) -> &Array2<i64> {
        &self.sorted_triples
    }

    pub fn range_index(&self) -> &HeadRangeIndex {
        &self.index
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Configured padding id, or one past the largest vocabulary id.
    pub fn padding_idx(&self) -> i64 {
        self.config
            .padding_idx
            .unwrap_or_else(|| self.vocab.padding_idx())
    }

    /// Rows of the embedding table a trainer needs: every id plus padding.
    pub fn num_nodes(&self) -> usize {
        self.vocab.len() + 1
    }

    /// Every entity, repeated `walks_per_node` times.
    pub fn start_entities(&self) -> Vec<i64> {
        repeat_start_entities(&self.vocab.entity_ids(), self.config.walks_per_node)
    }

    pub fn walk_config(&self, epoch: u64) -> WalkConfig {
        WalkConfig {
            walk_length: self.config.walk_length,
            padding_idx: self.padding_idx(),
            restart: self.config.restart,
            restart_probability: self.config.restart_probability,
            seed: self.config.seed.wrapping_add(epoch),
        }
    }

    pub fn window_config(&self, epoch: u64) -> WindowConfig {
        WindowConfig {
            window_size: self.config.window_size,
            num_nodes: Some(self.num_nodes()),
            padding_idx: self.padding_idx(),
            seed: self
                .config
                .seed
                .wrapping_add(epoch)
                .wrapping_add(NEGATIVE_SEED_OFFSET),
            layout: self.config.layout,
        }
    }

    /// Fresh walks for `epoch`.
    pub fn walks(&self, epoch: u64) -> Result<Array2<i64>> {
        TripleWalker::new(self.sorted_triples.view(), &self.index, self.walk_config(epoch))?
            .walk(&self.start_entities())
    }

    /// Skip-gram windows over fresh walks for `epoch`.
    pub fn epoch(&self, epoch: u64) -> Result<SkipGramWindows> {
        let walks = self.walks(epoch)?;
        let windows = WindowExtractor::new(self.sorted_triples.view(), self.window_config(epoch))?
            .skip_gram(walks.view())?;
        debug!(epoch, records = windows.len(), "sampled skip-gram epoch");
        Ok(windows)
    }

    /// CBOW windows over fresh walks for `epoch`.
    pub fn epoch_cbow(&self, epoch: u64) -> Result<CbowWindows> {
        let walks = self.walks(epoch)?;
        let windows = WindowExtractor::new(self.sorted_triples.view(), self.window_config(epoch))?
            .cbow(walks.view())?;
        debug!(epoch, records = windows.len(), "sampled CBOW epoch");
        Ok(windows)
    }
}
