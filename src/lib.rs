pub mod binding;
pub mod core;
pub mod loaders;
pub mod models;
mod utils;

// Re-export the types a host needs to drive the binding.
pub use binding::{
    CTransformers, Completion, GenerationAdapter, GenerationRequest, LlmBinding, StopReason,
};
pub use crate::core::{
    BindingError, HostConfig, LocalConfig, LollmsPaths, MessageKind, PartialGeneration,
    StreamControl,
};
pub use models::generation::{GenerationOverrides, GenerationParams};
pub use models::{CausalLanguageModel, ModelFamily, Token};
