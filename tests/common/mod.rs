// Scripted in-memory model shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;

use candle_core::{Device, Tensor};
use ctransformers_binding::{CausalLanguageModel, Token};

pub const EOS: Token = 0;
const WORDS: [&str; 10] = ["</s>", "Hello", "the", "cat", "sat", "on", "a", "mat", ".", "dog"];

/// A model whose next token is a fixed function of the last token fed to it.
///
/// Words are separated by single spaces, so `detokenize` of a sequence joins
/// its words with spaces. After the prompt `Hello` the model says
/// `the cat sat on a mat .` and then emits `</s>`.
pub struct ScriptedModel {
    transitions: HashMap<Token, Token>,
    position: usize,
    context_length: usize,
    resets: usize,
    evals: usize,
    fail_at_eval: Option<usize>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        let chain = ["Hello", "the", "cat", "sat", "on", "a", "mat", ".", "</s>"];
        let transitions = chain
            .windows(2)
            .map(|pair| (id(pair[0]), id(pair[1])))
            .collect();
        Self {
            transitions,
            position: 0,
            context_length: 512,
            resets: 0,
            evals: 0,
            fail_at_eval: None,
        }
    }

    /// Make the `n`-th call to `eval` (1-based, prompt included) fail.
    pub fn failing_at_eval(mut self, n: usize) -> Self {
        self.fail_at_eval = Some(n);
        self
    }

    pub fn with_context_length(mut self, context_length: usize) -> Self {
        self.context_length = context_length;
        self
    }

    pub fn resets(&self) -> usize {
        self.resets
    }

    pub fn evals(&self) -> usize {
        self.evals
    }
}

fn id(word: &str) -> Token {
    WORDS.iter().position(|w| *w == word).expect("word in vocabulary") as Token
}

impl CausalLanguageModel for ScriptedModel {
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>> {
        text.split_whitespace()
            .map(|word| {
                WORDS
                    .iter()
                    .position(|w| *w == word)
                    .map(|i| i as Token)
                    .ok_or_else(|| anyhow::anyhow!("unknown word `{word}`"))
            })
            .collect()
    }

    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String> {
        let words = tokens
            .iter()
            .map(|&t| {
                WORDS
                    .get(t as usize)
                    .copied()
                    .ok_or_else(|| anyhow::anyhow!("unknown token {t}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(words.join(" "))
    }

    fn is_eos_token(&self, token: Token) -> bool {
        token == EOS
    }

    fn context_length(&self) -> usize {
        self.context_length
    }

    fn position(&self) -> usize {
        self.position
    }

    fn reset(&mut self) {
        self.position = 0;
        self.resets += 1;
    }

    fn eval(&mut self, tokens: &[Token]) -> candle_core::Result<Tensor> {
        self.evals += 1;
        if self.fail_at_eval == Some(self.evals) {
            candle_core::bail!("scripted failure at eval {}", self.evals);
        }
        self.position += tokens.len();

        let last = *tokens.last().expect("eval called with tokens");
        let next = self.transitions.get(&last).copied().unwrap_or(EOS);
        let mut logits = vec![0f32; WORDS.len()];
        logits[next as usize] = 100.0;
        Tensor::from_vec(logits, WORDS.len(), &Device::Cpu)
    }
}

const BYTE_EOS: Token = 256;

/// A byte-level model: every byte is a token and `256` ends the sequence.
///
/// With a script it emits the scripted bytes one per step, then EOS. Without
/// one every lowercase letter is equally likely, so the output depends only
/// on the sampling seed.
pub struct ByteModel {
    script: Option<Vec<u8>>,
    steps: usize,
    position: usize,
}

impl ByteModel {
    pub fn scripted(text: &str) -> Self {
        Self {
            script: Some(text.as_bytes().to_vec()),
            steps: 0,
            position: 0,
        }
    }

    pub fn uniform_letters() -> Self {
        Self {
            script: None,
            steps: 0,
            position: 0,
        }
    }
}

impl CausalLanguageModel for ByteModel {
    fn tokenize(&self, text: &str) -> anyhow::Result<Vec<Token>> {
        Ok(text.bytes().map(Token::from).collect())
    }

    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String> {
        let bytes: Vec<u8> = tokens
            .iter()
            .filter_map(|&t| u8::try_from(t).ok())
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn is_eos_token(&self, token: Token) -> bool {
        token == BYTE_EOS
    }

    fn context_length(&self) -> usize {
        4096
    }

    fn position(&self) -> usize {
        self.position
    }

    fn reset(&mut self) {
        self.position = 0;
        self.steps = 0;
    }

    fn eval(&mut self, tokens: &[Token]) -> candle_core::Result<Tensor> {
        self.position += tokens.len();
        let step = self.steps;
        self.steps += 1;

        let vocab = BYTE_EOS as usize + 1;
        let logits = match &self.script {
            Some(script) => {
                let next = script.get(step).map_or(BYTE_EOS, |&b| Token::from(b));
                let mut logits = vec![0f32; vocab];
                logits[next as usize] = 100.0;
                logits
            }
            None => (0..vocab)
                .map(|t| match u8::try_from(t) {
                    Ok(b) if b.is_ascii_lowercase() => 0.0,
                    _ => f32::NEG_INFINITY,
                })
                .collect(),
        };
        Tensor::from_vec(logits, vocab, &Device::Cpu)
    }
}
