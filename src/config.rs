//! Sampler configuration.
//!
//! All fields have defaults, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "walk_length": 8, "walks_per_node": 10, "restart": true }
//! ```

use crate::algo::window::ContextLayout;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// End-to-end sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Entity positions per walk (default: 6).
    pub walk_length: usize,
    /// Walks started from every entity per epoch (default: 1).
    pub walks_per_node: usize,
    /// Context triples on each side of a target (default: 4).
    pub window_size: usize,
    /// Allow hops from the start entity (default: false).
    pub restart: bool,
    /// Per-hop restart probability when `restart` is set (default: 0.5).
    pub restart_probability: f64,
    /// Padding id; `None` uses one past the largest vocabulary id.
    pub padding_idx: Option<i64>,
    /// Base seed; epoch `n` uses `seed + n` (default: 42).
    pub seed: u64,
    /// Context slot layout (default: reference).
    pub layout: ContextLayout,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            walk_length: 6,
            walks_per_node: 1,
            window_size: 4,
            restart: false,
            restart_probability: 0.5,
            padding_idx: None,
            seed: 42,
            layout: ContextLayout::Reference,
        }
    }
}

impl SamplerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_walk_length(mut self, walk_length: usize) -> Self {
        self.walk_length = walk_length;
        self
    }

    pub fn with_walks_per_node(mut self, walks_per_node: usize) -> Self {
        self.walks_per_node = walks_per_node;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_restart(mut self, restart_probability: f64) -> Self {
        self.restart = true;
        self.restart_probability = restart_probability;
        self
    }

    pub fn with_padding_idx(mut self, padding_idx: i64) -> Self {
        self.padding_idx = Some(padding_idx);
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

    /// Check parameters before any sampling.
    pub fn validate(&self) -> Result<()> {
        if self.walk_length == 0 {
            return Err(Error::InvalidConfig("walk_length must be positive".into()));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidConfig("window_size must be positive".into()));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            SamplerConfig::from_json_str(r#"{"walk_length": 8, "layout": "positional"}"#).unwrap();
        assert_eq!(config.walk_length, 8);
        assert_eq!(config.window_size, 4);
        assert_eq!(config.layout, ContextLayout::Positional);
        assert_eq!(config.padding_idx, None);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SamplerConfig::default().with_restart(0.25).with_padding_idx(-1);
        let back = SamplerConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_invalid_json_config() {
        assert!(matches!(
            SamplerConfig::from_json_str(r#"{"window_size": 0}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            SamplerConfig::from_json_str(r#"{"walk_length": "long"}"#),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            SamplerConfig::from_json_file("/nonexistent/sampler.json"),
            Err(Error::Io(_))
        ));
    }
}
