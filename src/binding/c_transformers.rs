use std::path::{Path, PathBuf};

use crate::core::{BindingError, ChunkCallback, HostConfig, LocalConfig, PartialGeneration};
use crate::loaders::{resolve_model_path, TokenizerSource};
use crate::models::generation::GenerationParams;
use crate::models::{CausalLanguageModel, ModelFamily, QuantizedLlama, Token};
use crate::utils::load_device;

use super::adapter::{Completion, GenerationAdapter, GenerationRequest};
use super::registry::ModelRegistry;
use super::LlmBinding;

pub const BINDING_NAME: &str = "CTRansformers";
/// Sub-folder of the personal models path holding this binding's models.
pub const BINDING_FOLDER_NAME: &str = "c_transformers";

/// A type-erased model backend.
pub type DynModel = Box<dyn CausalLanguageModel + Send>;

/// Everything a backend loader needs to know about the model to load.
#[derive(Debug, Clone)]
pub struct BackendRequest<'a> {
    pub family: ModelFamily,
    pub model_path: &'a Path,
    pub local_config: &'a LocalConfig,
}

/// The host-facing binding: resolves, loads and serves one model.
pub struct CTransformers {
    adapter: GenerationAdapter<DynModel>,
    family: ModelFamily,
    model_path: PathBuf,
    models_folder: PathBuf,
    local_config: LocalConfig,
}

impl CTransformers {
    /// Build the binding for the model selected in the host configuration.
    pub fn new(config: &HostConfig) -> Result<Self, BindingError> {
        Self::with_loader(config, load_backend)
    }

    /// Like [`CTransformers::new`], loading the model through `loader`.
    pub fn with_loader<F>(config: &HostConfig, loader: F) -> Result<Self, BindingError>
    where
        F: FnOnce(BackendRequest<'_>) -> Result<DynModel, BindingError>,
    {
        let models_folder = config
            .lollms_paths
            .personal_models_path
            .join(BINDING_FOLDER_NAME);
        std::fs::create_dir_all(&models_folder).map_err(|e| BindingError::io(&models_folder, e))?;

        let Some(family) = ModelFamily::classify(&config.model_name) else {
            tracing::error!(
                model_name = %config.model_name,
                "the model you are using is not supported by this binding"
            );
            return Err(BindingError::UnsupportedModelFamily {
                model_name: config.model_name.clone(),
            });
        };

        let local_config = LocalConfig::load_or_create(config.local_config_path())?;
        let model_path = resolve_model_path(&models_folder, &config.model_name)?;

        tracing::info!(
            %family,
            model_path = %model_path.display(),
            gpu_layers = local_config.gpu_layers,
            "loading model"
        );
        let model = loader(BackendRequest {
            family,
            model_path: &model_path,
            local_config: &local_config,
        })?;
        tracing::info!(%family, "model loaded");

        Ok(Self {
            adapter: GenerationAdapter::with_params(model, GenerationParams::from_host(config)),
            family,
            model_path,
            models_folder,
            local_config,
        })
    }

    /// The model catalogue shipped with the binding.
    pub fn available_models() -> Result<serde_yaml::Value, BindingError> {
        GenerationAdapter::<DynModel>::get_available_models()
    }

    /// Model files present in this binding's models folder.
    pub fn installed_models(&self) -> Result<Vec<String>, BindingError> {
        ModelRegistry::installed_models(&self.models_folder)
    }

    pub fn family(&self) -> ModelFamily {
        self.family
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn models_folder(&self) -> &Path {
        &self.models_folder
    }

    pub fn local_config(&self) -> &LocalConfig {
        &self.local_config
    }

    pub fn adapter(&self) -> &GenerationAdapter<DynModel> {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut GenerationAdapter<DynModel> {
        &mut self.adapter
    }
}

impl LlmBinding for CTransformers {
    fn tokenize(&self, prompt: &str) -> anyhow::Result<Vec<Token>> {
        self.adapter.tokenize(prompt)
    }

    fn detokenize(&self, tokens: &[Token]) -> anyhow::Result<String> {
        self.adapter.detokenize(tokens)
    }

    fn generate(
        &mut self,
        request: GenerationRequest<'_>,
        callback: Option<&mut ChunkCallback<'_>>,
    ) -> Result<Completion, PartialGeneration> {
        self.adapter.generate(request, callback)
    }
}

/// Load the model with the candle backend matching its family.
pub fn load_backend(request: BackendRequest<'_>) -> Result<DynModel, BindingError> {
    match request.family {
        ModelFamily::Llama => {
            let device = load_device(request.local_config)?;
            let tokenizer = TokenizerSource::resolve(
                request.local_config.tokenizer.as_deref(),
                request.model_path,
            )?
            .load()?;
            let model = QuantizedLlama::load(request.model_path, tokenizer, &device)?;
            Ok(Box::new(model))
        }
        family => Err(BindingError::UnsupportedBackend { family }),
    }
}
