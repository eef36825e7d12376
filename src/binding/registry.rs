use std::path::{Path, PathBuf};

use crate::core::BindingError;

/// Name of the model registry shipped with the binding.
pub const MODELS_FILE: &str = "models.yaml";

/// File patterns the binding can load from its models folder.
pub const MODEL_FILE_PATTERNS: [&str; 3] = ["*.bin", "*.gguf", "*.reference"];

/// Access to the model catalogue and to the models installed locally.
pub struct ModelRegistry;

impl ModelRegistry {
    /// Location of the registry shipped next to the binding sources.
    pub fn default_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(MODELS_FILE)
    }

    /// Parse a registry file and return its content as-is.
    pub fn load(path: impl AsRef<Path>) -> Result<serde_yaml::Value, BindingError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| BindingError::io(path, e))?;
        serde_yaml::from_str(&raw).map_err(|e| BindingError::yaml(path, e))
    }

    /// File names of the loadable models in `models_folder`, sorted.
    pub fn installed_models(models_folder: &Path) -> Result<Vec<String>, BindingError> {
        let folder = glob::Pattern::escape(&models_folder.to_string_lossy());
        let mut names = Vec::new();

        for pattern in MODEL_FILE_PATTERNS {
            let paths = glob::glob(&format!("{folder}/{pattern}")).map_err(anyhow::Error::from)?;
            for entry in paths {
                let path = entry.map_err(anyhow::Error::from)?;
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }
}
