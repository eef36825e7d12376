use crate::models::generation::{IncrementalDecoder, TokenGenerator};
use crate::models::CausalLanguageModel;

use super::adapter::StopReason;

/// Text chunks of a single generation, pulled one at a time.
///
/// Stops without emitting when `max_tokens` tokens have been emitted or the
/// model produces its end-of-sequence token. Dropping the stream, or simply
/// no longer pulling from it, cancels the generation.
pub struct ChunkStream<'m, M: CausalLanguageModel> {
    tokens: TokenGenerator<'m, M>,
    decoder: IncrementalDecoder,
    max_tokens: usize,
    emitted: usize,
    pending: usize,
    last_chunk_tokens: usize,
    stop_reason: Option<StopReason>,
    finished: bool,
}

impl<'m, M: CausalLanguageModel> ChunkStream<'m, M> {
    pub(crate) fn new(tokens: TokenGenerator<'m, M>, max_tokens: usize) -> Self {
        Self {
            tokens,
            decoder: IncrementalDecoder::new(),
            max_tokens,
            emitted: 0,
            pending: 0,
            last_chunk_tokens: 0,
            stop_reason: None,
            finished: false,
        }
    }

    /// Tokens emitted so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Number of tokens that make up the chunk returned last.
    pub fn last_chunk_tokens(&self) -> usize {
        self.last_chunk_tokens
    }

    /// Why the stream ended; `None` while it is still running or after an error.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Collect the remaining chunks into a single `String`.
    pub fn collect_text(self) -> anyhow::Result<String> {
        self.collect()
    }

    fn chunk(&mut self, text: String) -> Option<anyhow::Result<String>> {
        self.last_chunk_tokens = std::mem::take(&mut self.pending);
        Some(Ok(text))
    }

    fn fail(&mut self, e: anyhow::Error) -> Option<anyhow::Result<String>> {
        self.finished = true;
        Some(Err(e))
    }

    fn finish(&mut self, reason: StopReason) -> Option<anyhow::Result<String>> {
        self.finished = true;
        self.stop_reason = Some(reason);
        match self.decoder.flush(self.tokens.model()) {
            Ok(Some(rest)) => self.chunk(rest),
            Ok(None) => None,
            Err(e) => self.fail(e),
        }
    }
}

impl<M: CausalLanguageModel> Iterator for ChunkStream<'_, M> {
    type Item = anyhow::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let token = match self.tokens.next() {
                Some(Ok(token)) => token,
                Some(Err(e)) => return self.fail(e),
                None => return self.finish(StopReason::StreamExhausted),
            };

            if self.emitted >= self.max_tokens {
                return self.finish(StopReason::MaxTokens);
            }
            if self.tokens.model().is_eos_token(token) {
                return self.finish(StopReason::EndOfSequence);
            }

            let decoded = match self.decoder.push(self.tokens.model(), token) {
                Ok(decoded) => decoded,
                Err(e) => return self.fail(e),
            };
            self.emitted += 1;
            self.pending += 1;
            if let Some(text) = decoded {
                return self.chunk(text);
            }
        }
        None
    }
}
