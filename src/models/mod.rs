pub mod family;
pub mod generation;
pub mod quantized_llama;

pub use family::ModelFamily;
pub use quantized_llama::QuantizedLlama;

use candle_core::Tensor;

use generation::{SamplingConfig, TokenGenerator};

/// Identifier of a sub-word unit in a model's vocabulary.
pub type Token = u32;

/// Interface the binding requires from a loaded causal language model.
///
/// Tokenization, the forward pass and the model state live behind this
/// trait; sampling is layered on top by [`TokenGenerator`].
pub trait CausalLanguageModel {
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>>;

    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String>;

    fn is_eos_token(&self, token: Token) -> bool;

    /// Maximum number of tokens the model can attend to.
    fn context_length(&self) -> usize;

    /// Number of tokens evaluated since the last reset.
    fn position(&self) -> usize;

    /// Clear the internal state (kv-cache, position, etc.).
    fn reset(&mut self);

    /// Evaluate `tokens` after the current position and return the logits
    /// for the next token as a 1-D `f32` tensor of vocabulary size.
    fn eval(&mut self, tokens: &[Token]) -> candle_core::Result<Tensor>;

    /// Lazily sample tokens following `prompt`.
    fn generate(&mut self, prompt: &[Token], config: &SamplingConfig) -> TokenGenerator<'_, Self>
    where
        Self: Sized,
    {
        TokenGenerator::new(self, prompt, config)
    }
}

impl<M: CausalLanguageModel + ?Sized> CausalLanguageModel for Box<M> {
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>> {
        (**self).tokenize(text)
    }

    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String> {
        (**self).detokenize(tokens)
    }

    fn is_eos_token(&self, token: Token) -> bool {
        (**self).is_eos_token(token)
    }

    fn context_length(&self) -> usize {
        (**self).context_length()
    }

    fn position(&self) -> usize {
        (**self).position()
    }

    fn reset(&mut self) {
        (**self).reset()
    }

    fn eval(&mut self, tokens: &[Token]) -> candle_core::Result<Tensor> {
        (**self).eval(tokens)
    }
}
