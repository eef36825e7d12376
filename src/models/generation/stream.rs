use candle_transformers::generation::LogitsProcessor;

use super::params::SamplingConfig;
use super::sampling::{apply_repeat_penalty, initialize_logits_processor};
use crate::models::{CausalLanguageModel, Token};

/// Lazy token stream produced by a [`CausalLanguageModel`].
///
/// The prompt is evaluated on the first pull, `batch_size` tokens per step;
/// every later pull evaluates the previously sampled token and samples the
/// next one. The stream ends after yielding an end-of-sequence token, when
/// the model's context window is full, or after the first error.
pub struct TokenGenerator<'m, M: CausalLanguageModel + ?Sized> {
    model: &'m mut M,
    logits_processor: LogitsProcessor,
    config: SamplingConfig,
    prompt: Vec<Token>,
    last_token: Option<Token>,
    generated: Vec<Token>,
    finished: bool,
}

impl<'m, M: CausalLanguageModel + ?Sized> TokenGenerator<'m, M> {
    pub fn new(model: &'m mut M, prompt: &[Token], config: &SamplingConfig) -> Self {
        if config.reset {
            model.reset();
        }

        let candle_threads = candle_core::utils::get_num_threads();
        if config.threads != candle_threads {
            tracing::debug!(
                requested = config.threads,
                available = candle_threads,
                "thread count is governed by candle's worker pool"
            );
        }

        Self {
            model,
            logits_processor: initialize_logits_processor(config),
            config: config.clone(),
            prompt: prompt.to_vec(),
            last_token: None,
            generated: Vec::new(),
            finished: false,
        }
    }

    /// The model being sampled from.
    pub fn model(&self) -> &M {
        &*self.model
    }

    /// Tokens sampled so far, including a trailing end-of-sequence token.
    pub fn generated(&self) -> &[Token] {
        &self.generated
    }

    fn prefill(&mut self) -> anyhow::Result<Option<candle_core::Tensor>> {
        let prompt = std::mem::take(&mut self.prompt);
        if prompt.is_empty() {
            anyhow::bail!("cannot generate from an empty prompt");
        }
        if self.model.position() + prompt.len() > self.model.context_length() {
            anyhow::bail!(
                "prompt of {} tokens does not fit a context of {} tokens",
                prompt.len(),
                self.model.context_length()
            );
        }

        let mut logits = None;
        for chunk in prompt.chunks(self.config.batch_size.max(1)) {
            logits = Some(self.model.eval(chunk)?);
        }
        Ok(logits)
    }

    fn step(&mut self) -> anyhow::Result<Option<Token>> {
        let logits = match self.last_token {
            None => self.prefill()?,
            Some(token) => {
                if self.model.position() >= self.model.context_length() {
                    tracing::debug!("context window exhausted");
                    return Ok(None);
                }
                Some(self.model.eval(&[token])?)
            }
        };
        let Some(logits) = logits else {
            return Ok(None);
        };

        let start_at = self
            .generated
            .len()
            .saturating_sub(self.config.repeat_last_n);
        let logits = apply_repeat_penalty(
            logits,
            self.config.repeat_penalty,
            &self.generated[start_at..],
        )?;

        let token = self.logits_processor.sample(&logits)?;
        self.generated.push(token);
        self.last_token = Some(token);
        if self.model.is_eos_token(token) {
            self.finished = true;
        }
        Ok(Some(token))
    }
}

impl<M: CausalLanguageModel + ?Sized> Iterator for TokenGenerator<'_, M> {
    type Item = anyhow::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.step() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
