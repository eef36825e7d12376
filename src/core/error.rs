use std::path::PathBuf;

use thiserror::Error;

use crate::models::ModelFamily;

/// Errors raised while building or configuring a binding.
#[derive(Debug, Error)]
pub enum BindingError {
    /// The model name matches none of the known model families.
    #[error("the model `{model_name}` is not supported by this binding")]
    UnsupportedModelFamily { model_name: String },

    /// The family is recognised but no backend in this build can load it.
    #[error("no backend is available for {family} models")]
    UnsupportedBackend { family: ModelFamily },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Neither the local config nor the model folder provide a tokenizer.
    #[error("no tokenizer found for {}", model_path.display())]
    TokenizerNotFound { model_path: PathBuf },

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error(transparent)]
    Model(#[from] candle_core::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BindingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}

/// A generation that failed part-way.
///
/// Carries everything appended before the failure so callers can decide
/// whether a truncated answer is still worth showing.
#[derive(Debug, Error)]
#[error("generation stopped after {tokens} tokens: {source}")]
pub struct PartialGeneration {
    /// Text accumulated before the failure, possibly empty.
    pub text: String,
    /// Number of tokens whose text made it into `text`.
    pub tokens: usize,
    #[source]
    pub source: anyhow::Error,
}

impl PartialGeneration {
    /// Discard the cause and keep whatever was generated.
    pub fn into_text(self) -> String {
        self.text
    }
}
