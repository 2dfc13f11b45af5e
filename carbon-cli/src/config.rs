//! Layered application configuration.
//!
//! Values are resolved in this order, later layers winning:
//!
//! 1. built-in defaults
//! 2. the TOML file given with `--config`
//! 3. environment variables ([`CREDENTIAL_ENV`], [`BACKEND_ENV`])
//! 4. command-line flags
//!
//! The estimator credential has no flag; it comes from the file or the
//! environment only.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use carbon_core::{EstimatorConfig, QuestionSet, StepSchema};
use carbon_data::{SchemaFile, SchemaLoadError};
use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

pub const CREDENTIAL_ENV: &str = "CARBON_ESTIMATOR_API_KEY";
pub const BACKEND_ENV: &str = "CARBON_ESTIMATOR_BACKEND";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown question set '{0}' (expected footprint or quick)")]
    UnknownQuestionSet(String),

    #[error(transparent)]
    Schema(#[from] SchemaLoadError),
}

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Step-by-step carbon footprint questionnaire.
///
/// Asks a few questions about travel, diet, shopping and home energy, then
/// asks the configured estimator for daily, weekly and monthly emissions.
/// Type `:back` to return to the previous step, `:reset` to start over and
/// `:quit` to leave.
#[derive(Debug, Default, Parser)]
#[command(name = "carbon", version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Estimator backend (mock, gemini).
    #[arg(long)]
    pub backend: Option<String>,

    /// Model name passed to the estimator backend.
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the estimator API.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Upper bound on one estimator call, in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Built-in questionnaire (footprint, quick).
    #[arg(short, long)]
    pub question_set: Option<String>,

    /// Questionnaire TOML file; takes precedence over --question-set.
    #[arg(long)]
    pub questions_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `carbon_core=trace`.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Append log records to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ─── file model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub estimator: EstimatorConfig,
    pub questions: QuestionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuestionsConfig {
    pub set: String,
    pub file: Option<PathBuf>,
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            set: QuestionSet::default().as_str().to_string(),
            file: None,
        }
    }
}

impl QuestionsConfig {
    /// The questionnaire to run: the file if one is configured, otherwise
    /// the named built-in set.
    pub fn schema(&self) -> Result<StepSchema, ConfigError> {
        if let Some(path) = &self.file {
            return Ok(SchemaFile::load(path)?);
        }
        QuestionSet::parse(&self.set)
            .map(|set| set.schema())
            .ok_or_else(|| ConfigError::UnknownQuestionSet(self.set.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Resolves every layer. `env` looks up an environment variable; pass
    /// `|key| std::env::var(key).ok()` outside of tests.
    pub fn load(
        cli: &Cli,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env);
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_env(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) {
        if let Some(key) = env(CREDENTIAL_ENV).filter(|k| !k.trim().is_empty()) {
            self.estimator.credential = Some(key);
        }
        if let Some(backend) = env(BACKEND_ENV).filter(|b| !b.trim().is_empty()) {
            self.estimator.backend = backend.trim().to_ascii_lowercase();
        }
    }

    pub fn apply_cli(
        &mut self,
        cli: &Cli,
    ) {
        if let Some(backend) = &cli.backend {
            self.estimator.backend = backend.trim().to_ascii_lowercase();
        }
        if let Some(model) = &cli.model {
            self.estimator.model = Some(model.clone());
        }
        if let Some(endpoint) = &cli.endpoint {
            self.estimator.endpoint = Some(endpoint.clone());
        }
        if let Some(secs) = cli.timeout_secs {
            self.estimator.timeout_secs = secs;
        }
        if let Some(set) = &cli.question_set {
            self.questions.set = set.clone();
        }
        if let Some(file) = &cli.questions_file {
            self.questions.file = Some(file.clone());
        }
        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
        if let Some(file) = &cli.log_file {
            self.logging.file = Some(file.clone());
        }
    }
}
