//! File-based inputs for the carbon wizard and a non-interactive batch
//! pipeline.
//!
//! * [`schema_file`] reads a questionnaire from TOML.
//! * [`answers_csv`] reads pre-filled answer rows from CSV.
//! * [`batch`] pushes each row through a fresh wizard controller and the
//!   configured estimator.

pub mod answers_csv;
pub mod batch;
pub mod schema_file;

pub use answers_csv::{AnswerLoadError, AnswerRow, AnswersCsv};
pub use batch::{BatchRunner, RowOutcome, RowReport};
pub use schema_file::{SchemaFile, SchemaLoadError};
