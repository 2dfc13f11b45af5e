//! The static questionnaire: ordered steps and the fields on each.
//!
//! A [`StepSchema`] is validated once when it is built and never mutated
//! afterwards, so the wizard can rely on `step_count()` and on field names
//! being unique without re-checking on every access.

mod builtin;

use std::collections::HashSet;

use thiserror::Error;

use crate::models::{FieldDefinition, FieldKind, StepDefinition};

pub use builtin::QuestionSet;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("a step schema needs at least one step")]
    Empty,

    #[error("step index {index} is out of range (schema has {count} steps)")]
    OutOfRange { index: usize, count: usize },

    #[error("field '{name}' is defined more than once")]
    DuplicateField { name: String },

    #[error("step '{step}' has a field with a blank name")]
    BlankFieldName { step: String },

    #[error("single-choice field '{name}' has no choices")]
    MissingChoices { name: String },

    #[error("field '{name}' is not single-choice but lists choices")]
    UnexpectedChoices { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSchema {
    steps: Vec<StepDefinition>,
}

impl StepSchema {
    /// Builds a schema, checking every structural invariant up front.
    ///
    /// # Errors
    /// * [`SchemaError::Empty`] when `steps` is empty.
    /// * [`SchemaError::BlankFieldName`] / [`SchemaError::DuplicateField`]
    ///   when field names are blank or repeated anywhere in the schema.
    /// * [`SchemaError::MissingChoices`] / [`SchemaError::UnexpectedChoices`]
    ///   when choices don't agree with the field kind.
    pub fn new(steps: Vec<StepDefinition>) -> Result<Self, SchemaError> {
        if steps.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut seen = HashSet::new();
        for step in &steps {
            for field in &step.fields {
                check_field(step, field)?;
                if !seen.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateField {
                        name: field.name.clone(),
                    });
                }
            }
        }

        Ok(Self { steps })
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn step_at(
        &self,
        index: usize,
    ) -> Result<&StepDefinition, SchemaError> {
        self.steps.get(index).ok_or(SchemaError::OutOfRange {
            index,
            count: self.steps.len(),
        })
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    /// Looks a field up by name across all steps.
    pub fn field(
        &self,
        name: &str,
    ) -> Option<&FieldDefinition> {
        self.steps
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.name == name)
    }

    /// Every field name in schema order.
    pub fn field_names(&self) -> Vec<&str> {
        self.steps.iter().flat_map(|s| s.field_names()).collect()
    }
}

fn check_field(
    step: &StepDefinition,
    field: &FieldDefinition,
) -> Result<(), SchemaError> {
    if field.name.trim().is_empty() {
        return Err(SchemaError::BlankFieldName {
            step: step.title.clone(),
        });
    }
    match (field.kind, field.choices.is_empty()) {
        (FieldKind::SingleChoice, true) => Err(SchemaError::MissingChoices {
            name: field.name.clone(),
        }),
        (FieldKind::SingleChoice, false) | (_, true) => Ok(()),
        (_, false) => Err(SchemaError::UnexpectedChoices {
            name: field.name.clone(),
        }),
    }
}
