//! Model file and tokenizer resolution.
//!
//! - [`resolve_model_path`] turns a host model name into a file path,
//!   following `.reference` indirections.
//! - [`ModelFileFormat`] tells GGUF files from legacy GGML files.
//! - [`TokenizerSource`] finds the tokenizer for a model, either next to the
//!   model file or on the Hugging Face Hub through [`HfLoader`].

use std::io::Read;
use std::path::{Path, PathBuf};

use hf_hub::api::sync::Api as HfApi;
use tokenizers::Tokenizer;

use crate::core::BindingError;

/// Suffix of model names that point at a file holding the real model path.
pub const REFERENCE_SUFFIX: &str = ".reference";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Resolve the file to load for `model_name` inside `models_folder`.
///
/// A name ending in `.reference` designates a file whose content (one line)
/// is the path of the actual model file.
pub fn resolve_model_path(models_folder: &Path, model_name: &str) -> Result<PathBuf, BindingError> {
    let candidate = models_folder.join(model_name);
    if !model_name.ends_with(REFERENCE_SUFFIX) {
        return Ok(candidate);
    }

    let target = std::fs::read_to_string(&candidate).map_err(|e| BindingError::io(&candidate, e))?;
    let target = target.trim();
    if target.is_empty() {
        return Err(anyhow::anyhow!("reference file {} is empty", candidate.display()).into());
    }
    Ok(PathBuf::from(target))
}

/// On-disk layout of a quantized model file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFileFormat {
    Gguf,
    /// Legacy `ggml`/`ggmf`/`ggjt` containers.
    Ggml,
}

impl ModelFileFormat {
    pub fn from_magic(magic: &[u8; 4]) -> Self {
        if magic == b"GGUF" {
            Self::Gguf
        } else {
            Self::Ggml
        }
    }

    pub fn detect(path: &Path) -> Result<Self, BindingError> {
        let mut magic = [0u8; 4];
        std::fs::File::open(path)
            .and_then(|mut file| file.read_exact(&mut magic))
            .map_err(|e| BindingError::io(path, e))?;
        Ok(Self::from_magic(&magic))
    }
}

#[derive(Debug, Clone)]
pub struct HfLoader {
    pub repo: String,
    pub filename: String,
}

impl HfLoader {
    pub fn new(repo: &str, filename: &str) -> Self {
        Self {
            repo: repo.into(),
            filename: filename.into(),
        }
    }

    pub fn load(&self) -> anyhow::Result<PathBuf> {
        let hf_api = HfApi::new()?.model(self.repo.clone());
        Ok(hf_api.get(self.filename.as_str())?)
    }
}

/// Where the tokenizer of a model comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenizerSource {
    File(PathBuf),
    Hub { repo: String },
}

impl TokenizerSource {
    /// Pick the tokenizer for `model_path`.
    ///
    /// A configured value wins: an existing path is used as-is, anything else
    /// is taken as a Hugging Face repo id. Without configuration the model's
    /// folder is searched for `<model stem>.tokenizer.json`, then
    /// `tokenizer.json`.
    pub fn resolve(configured: Option<&str>, model_path: &Path) -> Result<Self, BindingError> {
        if let Some(configured) = configured {
            let path = PathBuf::from(configured);
            return Ok(if path.is_file() {
                Self::File(path)
            } else {
                Self::Hub {
                    repo: configured.to_string(),
                }
            });
        }

        let folder = model_path.parent().unwrap_or_else(|| Path::new("."));
        let mut candidates = Vec::with_capacity(2);
        if let Some(stem) = model_path.file_stem().and_then(|s| s.to_str()) {
            candidates.push(folder.join(format!("{stem}.{TOKENIZER_FILE}")));
        }
        candidates.push(folder.join(TOKENIZER_FILE));

        candidates
            .into_iter()
            .find(|candidate| candidate.is_file())
            .map(Self::File)
            .ok_or_else(|| BindingError::TokenizerNotFound {
                model_path: model_path.to_path_buf(),
            })
    }

    pub fn load(&self) -> Result<Tokenizer, BindingError> {
        let path = match self {
            Self::File(path) => path.clone(),
            Self::Hub { repo } => HfLoader::new(repo, TOKENIZER_FILE).load()?,
        };
        tracing::debug!(path = %path.display(), "loading tokenizer");
        Tokenizer::from_file(&path).map_err(|e| BindingError::Tokenizer(e.to_string()))
    }
}
