// Host-facing binding layer
pub mod adapter;
pub mod c_transformers;
pub mod chunk_stream;
pub mod registry;

pub use adapter::{Completion, GenerationAdapter, GenerationRequest, StopReason};
pub use c_transformers::{
    load_backend, BackendRequest, CTransformers, DynModel, BINDING_FOLDER_NAME, BINDING_NAME,
};
pub use chunk_stream::ChunkStream;
pub use registry::{ModelRegistry, MODELS_FILE, MODEL_FILE_PATTERNS};

use crate::core::{ChunkCallback, PartialGeneration};
use crate::models::Token;

/// Interface a host application drives a language-model binding through.
pub trait LlmBinding {
    /// Name the host lists the binding under.
    fn name(&self) -> &str {
        BINDING_NAME
    }

    /// Tokenizes the prompt with the model's tokenizer.
    fn tokenize(&self, prompt: &str) -> anyhow::Result<Vec<Token>>;

    /// Turns tokens back into text.
    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String>;

    /// Generates text for `request`, streaming each chunk to `callback`.
    fn generate(
        &mut self,
        request: GenerationRequest<'_>,
        callback: Option<&mut ChunkCallback<'_>>,
    ) -> Result<Completion, PartialGeneration>;
}
