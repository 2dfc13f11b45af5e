use serde::{Deserialize, Serialize};

use super::FieldDefinition;

/// One screen's worth of questions, shown and validated as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl StepDefinition {
    pub fn new(
        title: impl Into<String>,
        fields: Vec<FieldDefinition>,
    ) -> Self {
        Self {
            title: title.into(),
            fields,
        }
    }

    /// Names of the fields on this step, in display order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
