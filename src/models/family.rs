/// Model architectures the binding can recognise from a model file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Gpt2,
    GptJ,
    GptNeoX,
    DollyV2,
    StarCoder,
    Mpt,
    Llama,
}

impl ModelFamily {
    /// Classify a model by the substrings of its file name.
    ///
    /// Rules are checked in order and the first match wins. All of them are
    /// case-sensitive except the llama group. Returns `None` when the model is
    /// not supported.
    pub fn classify(model_name: &str) -> Option<Self> {
        const STARCODER_MARKERS: [&str; 3] = ["starcoder", "starchat-beta", "WizardCoder"];
        const LLAMA_MARKERS: [&str; 4] = ["llama", "wizardlm", "vigogne", "ggml"];

        if model_name.contains("gpt2") {
            Some(Self::Gpt2)
        } else if model_name.contains("gptj") {
            Some(Self::GptJ)
        } else if model_name.contains("gpt_neox") {
            Some(Self::GptNeoX)
        } else if model_name.contains("dolly-v2") {
            Some(Self::DollyV2)
        } else if STARCODER_MARKERS.iter().any(|m| model_name.contains(m)) {
            Some(Self::StarCoder)
        } else if model_name.contains("mpt") {
            Some(Self::Mpt)
        } else {
            let lowered = model_name.to_lowercase();
            LLAMA_MARKERS
                .iter()
                .any(|m| lowered.contains(m))
                .then_some(Self::Llama)
        }
    }

    /// The model type string understood by ggml-style loaders.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Gpt2 => "gpt2",
            ModelFamily::GptJ => "gptj",
            ModelFamily::GptNeoX => "gpt_neox",
            ModelFamily::DollyV2 => "dolly-v2",
            ModelFamily::StarCoder => "starcoder",
            ModelFamily::Mpt => "mpt",
            ModelFamily::Llama => "llama",
        }
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
