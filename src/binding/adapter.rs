use std::time::Instant;

use crate::core::{BindingError, ChunkCallback, MessageKind, PartialGeneration};
use crate::models::generation::{GenerationOverrides, GenerationParams, TokenGenerator};
use crate::models::{CausalLanguageModel, Token};

use super::chunk_stream::ChunkStream;
use super::registry::ModelRegistry;
use super::LlmBinding;

/// Input for a text-generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub max_tokens: usize,
    /// Log every chunk and a summary of the run.
    pub verbose: bool,
    pub params: GenerationOverrides,
}

impl<'a> GenerationRequest<'a> {
    pub const DEFAULT_MAX_TOKENS: usize = 128;

    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            verbose: false,
            params: GenerationOverrides::default(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn params(mut self, params: GenerationOverrides) -> Self {
        self.params = params;
        self
    }
}

impl<'a> From<&'a str> for GenerationRequest<'a> {
    fn from(prompt: &'a str) -> Self {
        Self::new(prompt)
    }
}

/// Why a generation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_tokens` chunks were emitted.
    MaxTokens,
    /// The model produced its end-of-sequence token.
    EndOfSequence,
    /// The callback asked to stop.
    Cancelled,
    /// The model stopped producing tokens, e.g. its context window is full.
    StreamExhausted,
}

/// Result of a generation that ran to a regular stop.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    /// Number of tokens whose text is part of `text`.
    pub tokens: usize,
    pub stop_reason: StopReason,
}

/// Exposes a loaded [`CausalLanguageModel`] as an [`LlmBinding`].
///
/// The adapter owns the model exclusively. `generate` takes `&mut self`, so a
/// single adapter serves one generation at a time; serve concurrent requests
/// with one adapter each or behind a lock.
pub struct GenerationAdapter<M: CausalLanguageModel> {
    model: M,
    base_params: GenerationParams,
}

impl<M: CausalLanguageModel> GenerationAdapter<M> {
    pub fn new(model: M) -> Self {
        Self::with_params(model, GenerationParams::default())
    }

    /// Use `base_params` instead of the defaults as the layer that request
    /// overrides are merged over.
    pub fn with_params(model: M, base_params: GenerationParams) -> Self {
        Self { model, base_params }
    }

    pub fn base_params(&self) -> &GenerationParams {
        &self.base_params
    }

    pub fn set_base_params(&mut self, params: GenerationParams) {
        self.base_params = params;
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    /// The model catalogue shipped with the binding, parsed as-is.
    pub fn get_available_models() -> Result<serde_yaml::Value, BindingError> {
        ModelRegistry::load(ModelRegistry::default_path())
    }

    pub fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>> {
        self.model.tokenize(text)
    }

    pub fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String> {
        self.model.detokenize(tokens)
    }

    /// Start a generation and return its chunks as an iterator.
    ///
    /// The model is reset before the prompt is tokenized, so no state from a
    /// previous generation is visible.
    pub fn stream(&mut self, request: &GenerationRequest<'_>) -> anyhow::Result<ChunkStream<'_, M>> {
        let params = self.base_params.merge(&request.params);
        self.model.reset();
        let prompt_tokens = self.model.tokenize(request.prompt)?;
        if request.verbose {
            tracing::info!(prompt_tokens = prompt_tokens.len(), ?params, "starting generation");
        }
        let tokens = TokenGenerator::new(&mut self.model, &prompt_tokens, &params.sampling_config());
        Ok(ChunkStream::new(tokens, request.max_tokens))
    }

    /// Generate text for `request`, handing each chunk to `callback`.
    ///
    /// When the callback returns [`StreamControl::Stop`](crate::core::StreamControl::Stop)
    /// the chunk it was just given is dropped and generation ends. Failures of
    /// the tokenizer, the model or the callback are logged and returned as a
    /// [`PartialGeneration`] holding the text produced up to that point.
    pub fn generate(
        &mut self,
        request: GenerationRequest<'_>,
        mut callback: Option<&mut ChunkCallback<'_>>,
    ) -> Result<Completion, PartialGeneration> {
        let started = Instant::now();
        let mut text = String::new();
        let mut tokens = 0;

        let outcome = self.stream(&request).and_then(|mut stream| {
            while let Some(chunk) = stream.next() {
                let chunk = chunk?;
                if request.verbose {
                    tracing::debug!(%chunk, "generated chunk");
                }
                if let Some(callback) = callback.as_deref_mut() {
                    if callback(&chunk, MessageKind::Chunk)?.is_stop() {
                        return Ok(StopReason::Cancelled);
                    }
                }
                text.push_str(&chunk);
                tokens += stream.last_chunk_tokens();
            }
            Ok(stream.stop_reason().unwrap_or(StopReason::StreamExhausted))
        });

        match outcome {
            Ok(stop_reason) => {
                if request.verbose {
                    let elapsed = started.elapsed();
                    tracing::info!(
                        tokens,
                        ?stop_reason,
                        elapsed_ms = elapsed.as_millis() as u64,
                        tokens_per_second = tokens as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
                        "generation finished"
                    );
                }
                Ok(Completion {
                    text,
                    tokens,
                    stop_reason,
                })
            }
            Err(source) => {
                tracing::warn!(error = %source, tokens, "generation failed, keeping partial output");
                Err(PartialGeneration {
                    text,
                    tokens,
                    source,
                })
            }
        }
    }
}

impl<M: CausalLanguageModel> LlmBinding for GenerationAdapter<M> {
    fn tokenize(&self, prompt: &str) -> anyhow::Result<Vec<Token>> {
        GenerationAdapter::tokenize(self, prompt)
    }

    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String> {
        GenerationAdapter::detokenize(self, tokens)
    }

    fn generate(
        &mut self,
        request: GenerationRequest<'_>,
        callback: Option<&mut ChunkCallback<'_>>,
    ) -> Result<Completion, PartialGeneration> {
        GenerationAdapter::generate(self, request, callback)
    }
}
