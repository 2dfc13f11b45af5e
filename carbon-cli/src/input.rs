//! Parsing of what the user types at a prompt.

use carbon_core::{FieldDefinition, FieldKind};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Back,
    Reset,
    Quit,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Command(Command),
    /// Enter on its own: keep the current answer (or confirm a prompt).
    Empty,
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command ':{0}' (try :help)")]
    UnknownCommand(String),

    #[error("'{input}' is not one of the listed options for {label}")]
    InvalidChoice { label: String, input: String },
}

pub const HELP: &str = "\
Commands:
  :back   return to the previous step
  :reset  discard all answers and start over
  :quit   leave the questionnaire
  :help   show this message
Press Enter on a question to keep its current answer.";

/// Splits a line into a command, an empty confirmation, or a value.
///
/// Commands start with `:` and are case-insensitive. A doubled colon
/// (`::text`) enters a literal value starting with `:`.
pub fn parse_line(line: &str) -> Result<Input, InputError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(Input::Empty);
    }
    if let Some(literal) = trimmed.strip_prefix("::") {
        return Ok(Input::Text(format!(":{literal}")));
    }
    let Some(name) = trimmed.strip_prefix(':') else {
        return Ok(Input::Text(trimmed.to_string()));
    };

    match name.trim().to_ascii_lowercase().as_str() {
        "back" | "b" => Ok(Input::Command(Command::Back)),
        "reset" | "r" => Ok(Input::Command(Command::Reset)),
        "quit" | "q" | "exit" => Ok(Input::Command(Command::Quit)),
        "help" | "h" | "?" => Ok(Input::Command(Command::Help)),
        other => Err(InputError::UnknownCommand(other.to_string())),
    }
}

/// Turns typed text into the value stored for `field`.
///
/// Choice fields accept the option number, its value or its label and
/// store the value. Everything else is stored as typed; the wizard does
/// not check formats.
pub fn field_value(
    field: &FieldDefinition,
    text: &str,
) -> Result<String, InputError> {
    if field.kind != FieldKind::SingleChoice {
        return Ok(text.to_string());
    }
    field
        .resolve_choice(text)
        .map(str::to_string)
        .ok_or_else(|| InputError::InvalidChoice {
            label: field.label.clone(),
            input: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn solar() -> FieldDefinition {
        FieldDefinition::single_choice(
            "solarPanels",
            "Solar Panels",
            "",
            &[("yes", "Yes"), ("no", "No")],
        )
    }

    #[test]
    fn commands_are_case_insensitive() {
        assert_eq!(parse_line(":BACK"), Ok(Input::Command(Command::Back)));
        assert_eq!(parse_line("  :reset "), Ok(Input::Command(Command::Reset)));
        assert_eq!(parse_line(":q"), Ok(Input::Command(Command::Quit)));
        assert_eq!(parse_line(":?"), Ok(Input::Command(Command::Help)));
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(parse_line("   "), Ok(Input::Empty));
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(parse_line("  Lisbon \n"), Ok(Input::Text("Lisbon".to_string())));
    }

    #[test]
    fn double_colon_escapes_literal() {
        assert_eq!(parse_line("::back"), Ok(Input::Text(":back".to_string())));
    }

    #[test]
    fn unknown_command_is_rejected() {
        assert_eq!(
            parse_line(":undo"),
            Err(InputError::UnknownCommand("undo".to_string()))
        );
    }

    #[test]
    fn choice_accepts_number_value_or_label() {
        assert_eq!(field_value(&solar(), "1"), Ok("yes".to_string()));
        assert_eq!(field_value(&solar(), "no"), Ok("no".to_string()));
        assert_eq!(field_value(&solar(), "YES"), Ok("yes".to_string()));
    }

    #[test]
    fn choice_rejects_unlisted_input() {
        let err = field_value(&solar(), "maybe").unwrap_err();

        assert_eq!(
            err.to_string(),
            "'maybe' is not one of the listed options for Solar Panels"
        );
    }

    #[test]
    fn free_text_fields_store_input_as_typed() {
        let age = FieldDefinition::new("age", "Age", FieldKind::Number, "");

        assert_eq!(field_value(&age, "about 30"), Ok("about 30".to_string()));
    }
}
