//! Llama-family models running on candle's quantized llama implementation.
//!
//! Both GGUF files and legacy GGML (`.bin`) files are accepted; the format is
//! detected from the file magic.

use std::path::Path;

use candle_core::quantized::{ggml_file, gguf_file};
use candle_core::{DType, Device, Tensor};
use candle_transformers::models::quantized_llama::ModelWeights;
use tokenizers::Tokenizer;

use super::{CausalLanguageModel, Token};
use crate::loaders::ModelFileFormat;

/// Used when the file does not record its context window.
const DEFAULT_CONTEXT_LENGTH: usize = 4096;
/// Grouped-query attention factor for GGML files, which do not store it.
const GGML_GQA: usize = 1;
const DEFAULT_EOS_TOKEN: &str = "</s>";

pub struct QuantizedLlama {
    weights: ModelWeights,
    tokenizer: Tokenizer,
    device: Device,
    eos_token: Token,
    context_length: usize,
    position: usize,
    span: tracing::Span,
}

impl QuantizedLlama {
    pub fn load(model_path: &Path, tokenizer: Tokenizer, device: &Device) -> anyhow::Result<Self> {
        let mut file = std::fs::File::open(model_path)?;

        let (weights, eos_token, context_length) = match ModelFileFormat::detect(model_path)? {
            ModelFileFormat::Gguf => {
                let content = gguf_file::Content::read(&mut file)
                    .map_err(|e| e.with_path(model_path))?;
                let eos_token = content
                    .metadata
                    .get("tokenizer.ggml.eos_token_id")
                    .and_then(|v| v.to_u32().ok());
                let context_length = content
                    .metadata
                    .get("llama.context_length")
                    .and_then(|v| v.to_u32().ok())
                    .map(|v| v as usize);
                let weights = ModelWeights::from_gguf(content, &mut file, device)?;
                (weights, eos_token, context_length)
            }
            ModelFileFormat::Ggml => {
                let content = ggml_file::Content::read(&mut file, device)
                    .map_err(|e| e.with_path(model_path))?;
                (ModelWeights::from_ggml(content, GGML_GQA)?, None, None)
            }
        };

        let eos_token = eos_token
            .or_else(|| tokenizer.token_to_id(DEFAULT_EOS_TOKEN))
            .ok_or_else(|| anyhow::anyhow!("EOS token '{DEFAULT_EOS_TOKEN}' not found in vocabulary"))?;

        Ok(Self {
            weights,
            tokenizer,
            device: device.clone(),
            eos_token,
            context_length: context_length.unwrap_or(DEFAULT_CONTEXT_LENGTH),
            position: 0,
            span: tracing::span!(tracing::Level::TRACE, "quantized-llama"),
        })
    }
}

impl CausalLanguageModel for QuantizedLlama {
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>> {
        Ok(self
            .tokenizer
            .encode(text, true)
            .map_err(anyhow::Error::msg)?
            .get_ids()
            .to_vec())
    }

    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String> {
        self.tokenizer
            .decode(tokens, true)
            .map_err(anyhow::Error::msg)
    }

    fn is_eos_token(&self, token: Token) -> bool {
        token == self.eos_token
    }

    fn context_length(&self) -> usize {
        self.context_length
    }

    fn position(&self) -> usize {
        self.position
    }

    fn reset(&mut self) {
        // Evaluating at position 0 discards the kv-cache.
        self.position = 0;
    }

    fn eval(&mut self, tokens: &[Token]) -> candle_core::Result<Tensor> {
        let _enter = self.span.enter();
        let input = Tensor::new(tokens, &self.device)?.unsqueeze(0)?;
        let logits = self.weights.forward(&input, self.position)?;
        self.position += tokens.len();
        logits.squeeze(0)?.to_dtype(DType::F32)
    }
}
