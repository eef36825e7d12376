use serde::{Deserialize, Serialize};

use crate::core::HostConfig;

/// Number of trailing generated tokens the repeat penalty looks at.
pub const DEFAULT_REPEAT_LAST_N: usize = 64;

/// Generation parameters for language models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_k: usize, // 0 means disabled
    pub top_p: f64,   // 0.0..=1.0 ; 0 or 1 means disabled
    pub repeat_penalty: f32,
    pub seed: i64, // negative means a fresh random seed per call
    pub n_threads: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 50,
            top_p: 0.96,
            repeat_penalty: 1.3,
            seed: -1,
            n_threads: 8,
        }
    }
}

impl GenerationParams {
    /// Defaults with the host's seed and thread count applied.
    pub fn from_host(config: &HostConfig) -> Self {
        Self {
            seed: config.seed,
            n_threads: config.n_threads,
            ..Self::default()
        }
    }

    /// Apply `overrides` key by key; every field the caller set wins.
    pub fn merge(&self, overrides: &GenerationOverrides) -> Self {
        Self {
            temperature: overrides.temperature.unwrap_or(self.temperature),
            top_k: overrides.top_k.unwrap_or(self.top_k),
            top_p: overrides.top_p.unwrap_or(self.top_p),
            repeat_penalty: overrides.repeat_penalty.unwrap_or(self.repeat_penalty),
            seed: overrides.seed.unwrap_or(self.seed),
            n_threads: overrides.n_threads.unwrap_or(self.n_threads),
        }
    }

    /// The token generator configuration for a single `generate` call.
    pub fn sampling_config(&self) -> SamplingConfig {
        SamplingConfig {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            repeat_penalty: self.repeat_penalty,
            repeat_last_n: DEFAULT_REPEAT_LAST_N,
            seed: self.seed,
            threads: self.n_threads,
            batch_size: 1,
            reset: true,
        }
    }
}

/// Caller-supplied partial parameters.
///
/// Deserializes from a JSON or YAML map so hosts can forward their keyword
/// arguments as-is; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOverrides {
    pub temperature: Option<f64>,
    pub top_k: Option<usize>,
    pub top_p: Option<f64>,
    pub repeat_penalty: Option<f32>,
    pub seed: Option<i64>,
    pub n_threads: Option<usize>,
}

impl GenerationOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build overrides from a JSON object such as `{"temperature": 0.2}`.
    pub fn from_json(value: serde_json::Value) -> anyhow::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn repeat_penalty(mut self, repeat_penalty: f32) -> Self {
        self.repeat_penalty = Some(repeat_penalty);
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = Some(n_threads);
        self
    }
}

/// Everything the token generator is configured with.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub top_k: usize,
    pub top_p: f64,
    pub repeat_penalty: f32,
    pub repeat_last_n: usize,
    pub seed: i64,
    pub threads: usize,
    /// Prompt tokens fed to the model per evaluation step.
    pub batch_size: usize,
    /// Clear the model state before the first evaluation.
    pub reset: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_only_overrides_given_keys() {
        let overrides = GenerationOverrides::from_json(json!({"temperature": 0.2})).unwrap();
        let merged = GenerationParams::default().merge(&overrides);

        assert_eq!(merged.temperature, 0.2);
        assert_eq!(merged.top_k, 50);
        assert_eq!(merged.top_p, 0.96);
        assert_eq!(merged.repeat_penalty, 1.3);
        assert_eq!(merged.seed, -1);
        assert_eq!(merged.n_threads, 8);
    }

    #[test]
    fn test_unknown_override_keys_are_ignored() {
        let overrides =
            GenerationOverrides::from_json(json!({"top_k": 10, "stop": ["###"]})).unwrap();
        assert_eq!(overrides, GenerationOverrides::new().top_k(10));
    }

    #[test]
    fn test_empty_overrides_keep_base() {
        let base = GenerationParams {
            seed: 7,
            ..GenerationParams::default()
        };
        assert_eq!(base.merge(&GenerationOverrides::new()), base);
    }

    #[test]
    fn test_sampling_config_uses_single_token_batches() {
        let config = GenerationParams::default().sampling_config();
        assert_eq!(config.batch_size, 1);
        assert!(config.reset);
        assert_eq!(config.repeat_last_n, DEFAULT_REPEAT_LAST_N);
    }
}
