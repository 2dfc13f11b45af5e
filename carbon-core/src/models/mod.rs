mod answers;
mod emission;
mod field;
mod step;

pub use answers::AnswerMap;
pub use emission::{CategoryContribution, EmissionResult, NegativeFigure};
pub use field::{FieldChoice, FieldDefinition, FieldKind};
pub use step::StepDefinition;
