use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::BindingError;

/// Name of the binding's own configuration file inside the host's
/// personal configuration folder.
pub const LOCAL_CONFIG_FILE: &str = "c_transformers_config.yaml";

/// Folders the host application hands to every binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LollmsPaths {
    pub personal_models_path: PathBuf,
    pub personal_configuration_path: PathBuf,
}

/// The subset of the host configuration this binding reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// File name of the selected model; also drives model family detection.
    pub model_name: String,
    /// Sampling seed; negative values request a fresh random seed per call.
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_threads")]
    pub n_threads: usize,
    pub lollms_paths: LollmsPaths,
}

fn default_seed() -> i64 {
    -1
}

fn default_threads() -> usize {
    8
}

impl HostConfig {
    pub fn new(model_name: impl Into<String>, lollms_paths: LollmsPaths) -> Self {
        Self {
            model_name: model_name.into(),
            seed: default_seed(),
            n_threads: default_threads(),
            lollms_paths,
        }
    }

    /// Read a host configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| BindingError::io(path, e))?;
        serde_yaml::from_str(&raw).map_err(|e| BindingError::yaml(path, e))
    }

    /// Path of the binding-local configuration file.
    pub fn local_config_path(&self) -> PathBuf {
        self.lollms_paths
            .personal_configuration_path
            .join(LOCAL_CONFIG_FILE)
    }
}

/// Binding-local settings stored in `c_transformers_config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Whether the AVX2 build of the kernels is expected.
    pub use_avx2: bool,
    /// Number of layers to offload; any positive value requests a GPU device.
    pub gpu_layers: usize,
    /// Tokenizer to use: a `tokenizer.json` path or a Hugging Face repo id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokenizer: Option<String>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            use_avx2: true,
            gpu_layers: 0,
            tokenizer: None,
        }
    }
}

impl LocalConfig {
    /// Load the config at `path`, writing the defaults there first when the
    /// file does not exist yet.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, BindingError> {
        let path = path.as_ref();
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "created default binding configuration");
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path).map_err(|e| BindingError::io(path, e))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|e| BindingError::yaml(path, e))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), BindingError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BindingError::io(parent, e))?;
        }
        let raw = serde_yaml::to_string(self).map_err(|e| BindingError::yaml(path, e))?;
        std::fs::write(path, raw).map_err(|e| BindingError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_config_partial_yaml_keeps_defaults() {
        let config: LocalConfig = serde_yaml::from_str("gpu_layers: 20\n").unwrap();
        assert_eq!(config.gpu_layers, 20);
        assert!(config.use_avx2);
        assert_eq!(config.tokenizer, None);
    }

    #[test]
    fn test_host_config_defaults() {
        let yaml = "
model_name: llama-2-7b.ggmlv3.q4_0.bin
lollms_paths:
  personal_models_path: /data/models
  personal_configuration_path: /data/configs
";
        let config: HostConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.seed, -1);
        assert_eq!(config.n_threads, 8);
        assert_eq!(
            config.local_config_path(),
            PathBuf::from("/data/configs/c_transformers_config.yaml")
        );
    }
}
