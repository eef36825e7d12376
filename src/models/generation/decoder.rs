use crate::models::{CausalLanguageModel, Token};

/// Turns a token stream into text chunks one token at a time.
///
/// Each chunk is the growth of the decoded text over a small window that
/// keeps the previously emitted tokens as left context, so tokenizers that
/// encode word boundaries inside the token (SentencePiece `▁word`) keep their
/// spaces. Text that ends inside a multi-byte character is held back until
/// the character is complete.
#[derive(Debug, Default)]
pub struct IncrementalDecoder {
    tokens: Vec<Token>,
    prev_index: usize,
    current_index: usize,
}

impl IncrementalDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `token` and return the text it completes, if any.
    pub fn push<M: CausalLanguageModel + ?Sized>(
        &mut self,
        model: &M,
        token: Token,
    ) -> anyhow::Result<Option<String>> {
        self.tokens.push(token);
        self.next_chunk(model)
    }

    /// Return whatever text is still held back. A character left incomplete
    /// at the end of the stream is dropped.
    pub fn flush<M: CausalLanguageModel + ?Sized>(
        &mut self,
        model: &M,
    ) -> anyhow::Result<Option<String>> {
        if self.current_index == self.tokens.len() {
            return Ok(None);
        }
        let prev_text = self.window_text(model)?;
        let text = model.detokenize(&self.tokens[self.prev_index..])?;
        let text = text.trim_end_matches(char::REPLACEMENT_CHARACTER);
        self.prev_index = self.current_index;
        self.current_index = self.tokens.len();
        Ok(growth(&prev_text, text).map(str::to_string))
    }

    fn next_chunk<M: CausalLanguageModel + ?Sized>(
        &mut self,
        model: &M,
    ) -> anyhow::Result<Option<String>> {
        let prev_text = self.window_text(model)?;
        let text = model.detokenize(&self.tokens[self.prev_index..])?;

        if text.ends_with(char::REPLACEMENT_CHARACTER) {
            return Ok(None);
        }
        match growth(&prev_text, &text) {
            Some(chunk) => {
                let chunk = chunk.to_string();
                self.prev_index = self.current_index;
                self.current_index = self.tokens.len();
                Ok(Some(chunk))
            }
            None => Ok(None),
        }
    }

    fn window_text<M: CausalLanguageModel + ?Sized>(&self, model: &M) -> anyhow::Result<String> {
        if self.prev_index == self.current_index {
            Ok(String::new())
        } else {
            model.detokenize(&self.tokens[self.prev_index..self.current_index])
        }
    }
}

fn growth<'t>(prev_text: &str, text: &'t str) -> Option<&'t str> {
    if text.len() > prev_text.len() {
        text.get(prev_text.len()..)
    } else {
        None
    }
}
