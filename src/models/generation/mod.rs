pub mod decoder;
pub mod params;
pub mod sampling;
pub mod stream;

pub use decoder::IncrementalDecoder;
pub use params::{GenerationOverrides, GenerationParams, SamplingConfig, DEFAULT_REPEAT_LAST_N};
pub use sampling::{apply_repeat_penalty, initialize_logits_processor, sampling_strategy};
pub use stream::TokenGenerator;
