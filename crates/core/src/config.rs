//! Configuration management for Veriqa.
//!
//! This module loads and merges configuration from multiple sources, lowest
//! precedence first:
//! - Built-in defaults
//! - Config file (`.veriqa/config.yaml` or `VERIQA_CONFIG`)
//! - Environment variables
//! - Command-line flags (`with_overrides`)
//!
//! Provider secrets are never stored in the config file. The file names the
//! environment variable that holds each key, and `resolve_api_key` reads it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Providers the answer pipeline knows about.
pub const KNOWN_PROVIDERS: [&str; 2] = ["openai", "together"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .veriqa/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Log line format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Answer provider backends
    pub providers: ProvidersConfig,

    /// Context retrieval endpoints
    pub retrieval: RetrievalConfig,

    /// Hallucination detection backends
    pub detection: DetectionConfig,

    /// Orchestration settings
    pub pipeline: PipelineConfig,
}

/// The two answer provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub together: ProviderConfig,
}

/// Settings for one chat-completion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Base URL override (e.g. a proxy)
    pub endpoint: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Completion length cap
    pub max_tokens: Option<u32>,

    /// Environment variable holding an organization id (OpenAI only)
    pub organization_env: Option<String>,
}

/// Knowledge source used for context retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Full-text search endpoint (MediaWiki action API)
    pub search_url: String,

    /// Page summary endpoint; the canonical title is appended as a path segment
    pub summary_url: String,

    /// User-Agent header sent to the knowledge source
    pub user_agent: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

/// Hallucination detection backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub classifier: ClassifierConfig,
    pub spans: SpanDetectorConfig,
}

/// Whole-answer hallucination classifier (text-classification inference).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Inference API base URL
    pub endpoint: String,

    /// Model repository id
    pub model: String,

    /// Environment variable holding the inference token
    pub api_key_env: String,

    /// Answers longer than this many words are truncated before scoring
    pub max_input_words: usize,

    /// Backend label -> verdict name ("supported", "hallucinated")
    pub labels: HashMap<String, String>,

    /// Per-request timeout
    pub timeout_secs: u64,
}

/// Span-level hallucination detector (LettuceDetect-compatible server).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanDetectorConfig {
    /// Base URL of the detector service
    pub endpoint: String,

    /// Model the service should use
    pub model: String,

    /// Optional environment variable holding a bearer token
    pub api_key_env: Option<String>,

    /// Per-request timeout
    pub timeout_secs: u64,
}

/// Orchestrator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Deadline for one query; 0 disables the deadline
    pub request_timeout_secs: u64,

    /// Provider used by the query refiner
    pub refiner_provider: String,
}

/// Full configuration file structure. Every field is optional so a file
/// only has to mention what it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
    providers: Option<ProvidersSection>,
    retrieval: Option<RetrievalSection>,
    detection: Option<DetectionSection>,
    pipeline: Option<PipelineSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProvidersSection {
    openai: Option<ProviderSection>,
    together: Option<ProviderSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderSection {
    api_key_env: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    organization_env: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalSection {
    search_url: Option<String>,
    summary_url: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DetectionSection {
    classifier: Option<ClassifierSection>,
    spans: Option<SpanSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifierSection {
    endpoint: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    max_input_words: Option<usize>,
    labels: Option<HashMap<String, String>>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpanSection {
    endpoint: Option<String>,
    model: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineSection {
    request_timeout_secs: Option<u64>,
    refiner_provider: Option<String>,
}

impl ProviderConfig {
    /// Defaults for the OpenAI chat backend.
    pub fn openai_defaults() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            endpoint: None,
            temperature: None,
            max_tokens: None,
            organization_env: None,
        }
    }

    /// Defaults for the Together.ai chat backend.
    pub fn together_defaults() -> Self {
        Self {
            api_key_env: "TOGETHER_AI_KEY".to_string(),
            model: "meta-llama/Llama-Vision-Free".to_string(),
            endpoint: None,
            temperature: Some(0.7),
            max_tokens: Some(512),
            organization_env: None,
        }
    }

    fn merge(&mut self, section: ProviderSection) {
        if let Some(v) = section.api_key_env {
            self.api_key_env = v;
        }
        if let Some(v) = section.model {
            self.model = v;
        }
        if section.endpoint.is_some() {
            self.endpoint = section.endpoint;
        }
        if section.temperature.is_some() {
            self.temperature = section.temperature;
        }
        if section.max_tokens.is_some() {
            self.max_tokens = section.max_tokens;
        }
        if section.organization_env.is_some() {
            self.organization_env = section.organization_env;
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::openai_defaults(),
            together: ProviderConfig::together_defaults(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            search_url: "https://en.wikipedia.org/w/api.php".to_string(),
            summary_url: "https://en.wikipedia.org/api/rest_v1/page/summary".to_string(),
            user_agent: format!("veriqa/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 10,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let labels = [("LABEL_0", "supported"), ("LABEL_1", "hallucinated")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            endpoint: "https://api-inference.huggingface.co".to_string(),
            model: "Varun-Chowdary/hallucination_detect".to_string(),
            api_key_env: "HF_API_TOKEN".to_string(),
            max_input_words: 400,
            labels,
            timeout_secs: 30,
        }
    }
}

impl Default for SpanDetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            model: "KRLabsOrg/lettucedect-base-modernbert-en-v1".to_string(),
            api_key_env: None,
            timeout_secs: 30,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            spans: SpanDetectorConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 120,
            refiner_provider: "openai".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            log_format: LogFormat::Text,
            verbose: false,
            no_color: false,
            providers: ProvidersConfig::default(),
            retrieval: RetrievalConfig::default(),
            detection: DetectionConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, config file and defaults.
    ///
    /// Environment variables:
    /// - `VERIQA_WORKSPACE`: Override workspace path
    /// - `VERIQA_CONFIG`: Path to config file
    /// - `VERIQA_REQUEST_TIMEOUT`: Per-query deadline in seconds
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use veriqa_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration with an explicit workspace and/or config file.
    ///
    /// Explicit arguments win over `VERIQA_WORKSPACE` / `VERIQA_CONFIG`.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) =
            workspace.or_else(|| std::env::var("VERIQA_WORKSPACE").ok().map(PathBuf::from))
        {
            config.workspace = workspace;
        }

        config.config_file =
            config_file.or_else(|| std::env::var("VERIQA_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.veriqa_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(timeout) = std::env::var("VERIQA_REQUEST_TIMEOUT") {
            config.pipeline.request_timeout_secs = timeout.parse().map_err(|_| {
                AppError::Config(format!(
                    "VERIQA_REQUEST_TIMEOUT must be a number of seconds, got '{}'",
                    timeout
                ))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        tracing::debug!("Merging config file {:?}", path);
        self.merged(file)
    }

    fn merged(&self, file: ConfigFile) -> AppResult<Self> {
        let mut result = self.clone();

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(format) = logging.format {
                result.log_format = LogFormat::parse(&format).ok_or_else(|| {
                    AppError::Config(format!("Unknown log format: {}", format))
                })?;
            }
        }

        if let Some(providers) = file.providers {
            if let Some(openai) = providers.openai {
                result.providers.openai.merge(openai);
            }
            if let Some(together) = providers.together {
                result.providers.together.merge(together);
            }
        }

        if let Some(retrieval) = file.retrieval {
            let target = &mut result.retrieval;
            if let Some(v) = retrieval.search_url {
                target.search_url = v;
            }
            if let Some(v) = retrieval.summary_url {
                target.summary_url = v;
            }
            if let Some(v) = retrieval.user_agent {
                target.user_agent = v;
            }
            if let Some(v) = retrieval.timeout_secs {
                target.timeout_secs = v;
            }
        }

        if let Some(detection) = file.detection {
            if let Some(classifier) = detection.classifier {
                let target = &mut result.detection.classifier;
                if let Some(v) = classifier.endpoint {
                    target.endpoint = v;
                }
                if let Some(v) = classifier.model {
                    target.model = v;
                }
                if let Some(v) = classifier.api_key_env {
                    target.api_key_env = v;
                }
                if let Some(v) = classifier.max_input_words {
                    target.max_input_words = v;
                }
                if let Some(v) = classifier.labels {
                    target.labels = v;
                }
                if let Some(v) = classifier.timeout_secs {
                    target.timeout_secs = v;
                }
            }
            if let Some(spans) = detection.spans {
                let target = &mut result.detection.spans;
                if let Some(v) = spans.endpoint {
                    target.endpoint = v;
                }
                if let Some(v) = spans.model {
                    target.model = v;
                }
                if spans.api_key_env.is_some() {
                    target.api_key_env = spans.api_key_env;
                }
                if let Some(v) = spans.timeout_secs {
                    target.timeout_secs = v;
                }
            }
        }

        if let Some(pipeline) = file.pipeline {
            if let Some(v) = pipeline.request_timeout_secs {
                result.pipeline.request_timeout_secs = v;
            }
            if let Some(v) = pipeline.refiner_provider {
                result.pipeline.refiner_provider = v;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        request_timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if let Some(timeout) = request_timeout_secs {
            self.pipeline.request_timeout_secs = timeout;
        }

        self
    }

    /// Get the path to the .veriqa directory.
    pub fn veriqa_dir(&self) -> PathBuf {
        self.workspace.join(".veriqa")
    }

    /// Look up a provider configuration by name.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        match name.to_lowercase().as_str() {
            "openai" => Some(&self.providers.openai),
            "together" | "together.ai" | "togetherai" => Some(&self.providers.together),
            _ => None,
        }
    }

    /// Resolve a provider's API key from the environment variable its config names.
    ///
    /// Returns `None` when the provider is unknown or the variable is unset or blank.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        self.provider(provider)
            .and_then(|pc| read_secret(&pc.api_key_env))
    }

    /// Resolve the OpenAI organization id, if configured.
    pub fn resolve_organization(&self) -> Option<String> {
        self.providers
            .openai
            .organization_env
            .as_deref()
            .and_then(read_secret)
    }

    /// Resolve the classifier inference token.
    pub fn resolve_classifier_token(&self) -> Option<String> {
        read_secret(&self.detection.classifier.api_key_env)
    }

    /// Resolve the span detector bearer token, if one is configured.
    pub fn resolve_span_token(&self) -> Option<String> {
        self.detection
            .spans
            .api_key_env
            .as_deref()
            .and_then(read_secret)
    }

    /// Validate the configuration.
    ///
    /// Missing provider keys are not an error here: a provider without a key
    /// fails inside its own answer slot at query time.
    pub fn validate(&self) -> AppResult<()> {
        let refiner = self.pipeline.refiner_provider.to_lowercase();
        if self.provider(&refiner).is_none() {
            return Err(AppError::Config(format!(
                "Unknown refiner provider: {}. Supported: {}",
                self.pipeline.refiner_provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        for (name, pc) in [
            ("openai", &self.providers.openai),
            ("together", &self.providers.together),
        ] {
            if pc.model.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "Provider '{}' has an empty model",
                    name
                )));
            }
            if let Some(t) = pc.temperature {
                if !(0.0..=2.0).contains(&t) {
                    return Err(AppError::Config(format!(
                        "Provider '{}' temperature must be within 0.0-2.0, got {}",
                        name, t
                    )));
                }
            }
        }

        let urls = [
            ("retrieval.searchUrl", &self.retrieval.search_url),
            ("retrieval.summaryUrl", &self.retrieval.summary_url),
            ("detection.classifier.endpoint", &self.detection.classifier.endpoint),
            ("detection.spans.endpoint", &self.detection.spans.endpoint),
        ];
        for (key, url) in urls {
            if url.trim().is_empty() {
                return Err(AppError::Config(format!("{} cannot be empty", key)));
            }
        }

        if self.detection.classifier.max_input_words == 0 {
            return Err(AppError::Config(
                "detection.classifier.maxInputWords must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn read_secret(env_var: &str) -> Option<String> {
    std::env::var(env_var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
