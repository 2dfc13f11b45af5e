use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use carbon_core::{SchemaError, StepDefinition, StepSchema};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a questionnaire file.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid questionnaire: {0}")]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    steps: Vec<StepDefinition>,
}

/// Loader for questionnaires written as TOML.
///
/// ```toml
/// [[steps]]
/// title = "Transportation"
///
/// [[steps.fields]]
/// name = "transportType"
/// label = "Transport Type"
/// kind = "single-choice"       # text | number | date | email | single-choice
/// placeholder = "Select transport type"
/// choices = [{ value = "car", label = "Car" }]
/// ```
///
/// The parsed steps go through [`StepSchema::new`], so a file is rejected
/// with the same rules as a schema built in code.
pub struct SchemaFile;

impl SchemaFile {
    pub fn parse(text: &str) -> Result<StepSchema, SchemaLoadError> {
        let document: SchemaDocument = toml::from_str(text)?;
        Ok(StepSchema::new(document.steps)?)
    }

    pub fn load(path: &Path) -> Result<StepSchema, SchemaLoadError> {
        let text = fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}
