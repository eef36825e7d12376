use candle_core::Tensor;
use candle_transformers::generation::{LogitsProcessor, Sampling};

use super::params::SamplingConfig;

/// Pick the sampling strategy matching the configured knobs.
pub fn sampling_strategy(config: &SamplingConfig) -> Sampling {
    let temperature = config.temperature;
    let top_p_enabled = config.top_p > 0.0 && config.top_p < 1.0;

    if temperature <= 0. {
        Sampling::ArgMax
    } else if config.top_k == 0 && !top_p_enabled {
        Sampling::All { temperature }
    } else if config.top_k == 0 {
        Sampling::TopP {
            p: config.top_p,
            temperature,
        }
    } else if !top_p_enabled {
        Sampling::TopK {
            k: config.top_k,
            temperature,
        }
    } else {
        Sampling::TopKThenTopP {
            k: config.top_k,
            p: config.top_p,
            temperature,
        }
    }
}

/// Negative seeds draw a fresh random seed.
pub fn resolve_seed(seed: i64) -> u64 {
    if seed < 0 {
        rand::random::<u64>()
    } else {
        seed as u64
    }
}

pub fn initialize_logits_processor(config: &SamplingConfig) -> LogitsProcessor {
    LogitsProcessor::from_sampling(resolve_seed(config.seed), sampling_strategy(config))
}

/// Penalise tokens that appear in `penalty_context`.
pub fn apply_repeat_penalty(
    logits: Tensor,
    repeat_penalty: f32,
    penalty_context: &[u32],
) -> candle_core::Result<Tensor> {
    if repeat_penalty <= 1. || penalty_context.is_empty() {
        Ok(logits)
    } else {
        candle_transformers::utils::apply_repeat_penalty(&logits, repeat_penalty, penalty_context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::generation::GenerationParams;

    fn config(temperature: f64, top_k: usize, top_p: f64) -> SamplingConfig {
        GenerationParams {
            temperature,
            top_k,
            top_p,
            ..GenerationParams::default()
        }
        .sampling_config()
    }

    #[test]
    fn test_defaults_use_top_k_then_top_p() {
        let sampling = sampling_strategy(&GenerationParams::default().sampling_config());
        assert!(matches!(
            sampling,
            Sampling::TopKThenTopP { k: 50, p, temperature } if p == 0.96 && temperature == 0.7
        ));
    }

    #[test]
    fn test_zero_temperature_is_greedy() {
        assert!(matches!(sampling_strategy(&config(0.0, 50, 0.9)), Sampling::ArgMax));
    }

    #[test]
    fn test_disabled_filters() {
        assert!(matches!(sampling_strategy(&config(0.8, 0, 1.0)), Sampling::All { .. }));
        assert!(matches!(sampling_strategy(&config(0.8, 0, 0.5)), Sampling::TopP { .. }));
        assert!(matches!(
            sampling_strategy(&config(0.8, 40, 0.0)),
            Sampling::TopK { k: 40, .. }
        ));
    }

    #[test]
    fn test_non_negative_seed_is_kept() {
        assert_eq!(resolve_seed(42), 42);
        assert_eq!(resolve_seed(0), 0);
    }
}
