use serde::{Deserialize, Serialize};

/// The kind of value a field collects.
///
/// Values are always stored as raw strings in the answer map; the kind is a
/// hint for renderers and estimators, not something the wizard enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Email,
    #[serde(alias = "select")]
    SingleChoice,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Email => "email",
            Self::SingleChoice => "single-choice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "date" => Some(Self::Date),
            "email" => Some(Self::Email),
            "single-choice" | "select" => Some(Self::SingleChoice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChoice {
    pub value: String,
    pub label: String,
}

impl FieldChoice {
    pub fn new(
        value: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// One named, typed input slot within a step.
///
/// `name` is the key under which the answer is stored and must be unique
/// across the whole schema, not just within its step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub placeholder: String,
    /// Only populated for [`FieldKind::SingleChoice`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<FieldChoice>,
}

impl FieldDefinition {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        kind: FieldKind,
        placeholder: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            placeholder: placeholder.into(),
            choices: Vec::new(),
        }
    }

    /// Builds a single-choice field from `(value, label)` pairs.
    pub fn single_choice(
        name: impl Into<String>,
        label: impl Into<String>,
        placeholder: impl Into<String>,
        choices: &[(&str, &str)],
    ) -> Self {
        Self {
            choices: choices
                .iter()
                .map(|(value, label)| FieldChoice::new(*value, *label))
                .collect(),
            ..Self::new(name, label, FieldKind::SingleChoice, placeholder)
        }
    }

    /// Maps free-form renderer input onto one of this field's choice values.
    ///
    /// Accepts a 1-based position, an exact choice value, or a label
    /// (case-insensitive). Returns `None` for non-choice fields or when
    /// nothing matches.
    pub fn resolve_choice(
        &self,
        input: &str,
    ) -> Option<&str> {
        let input = input.trim();
        if self.kind != FieldKind::SingleChoice || input.is_empty() {
            return None;
        }

        if let Ok(position) = input.parse::<usize>() {
            if let Some(choice) = position.checked_sub(1).and_then(|i| self.choices.get(i)) {
                return Some(choice.value.as_str());
            }
        }

        self.choices
            .iter()
            .find(|c| c.value == input || c.label.eq_ignore_ascii_case(input))
            .map(|c| c.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn diet_field() -> FieldDefinition {
        FieldDefinition::single_choice(
            "dietType",
            "Food Consumption",
            "Select diet type",
            &[
                ("vegan", "Vegan"),
                ("vegetarian", "Vegetarian"),
                ("omnivore", "Omnivore"),
            ],
        )
    }

    #[test]
    fn kind_parse_accepts_select_alias() {
        assert_eq!(FieldKind::parse("select"), Some(FieldKind::SingleChoice));
        assert_eq!(FieldKind::parse("single-choice"), Some(FieldKind::SingleChoice));
        assert_eq!(FieldKind::parse("slider"), None);
    }

    #[test]
    fn kind_as_str_round_trips_through_parse() {
        for kind in [
            FieldKind::Text,
            FieldKind::Number,
            FieldKind::Date,
            FieldKind::Email,
            FieldKind::SingleChoice,
        ] {
            assert_eq!(FieldKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn single_choice_keeps_choice_order() {
        let field = diet_field();

        let values: Vec<_> = field.choices.iter().map(|c| c.value.as_str()).collect();

        assert_eq!(values, vec!["vegan", "vegetarian", "omnivore"]);
        assert_eq!(field.kind, FieldKind::SingleChoice);
    }

    #[test]
    fn resolve_choice_by_position() {
        assert_eq!(diet_field().resolve_choice("2"), Some("vegetarian"));
    }

    #[test]
    fn resolve_choice_by_value_or_label() {
        let field = diet_field();

        assert_eq!(field.resolve_choice("omnivore"), Some("omnivore"));
        assert_eq!(field.resolve_choice("  VEGAN "), Some("vegan"));
    }

    #[test]
    fn resolve_choice_rejects_unknown_and_out_of_range() {
        let field = diet_field();

        assert_eq!(field.resolve_choice("0"), None);
        assert_eq!(field.resolve_choice("4"), None);
        assert_eq!(field.resolve_choice("pescatarian"), None);
        assert_eq!(field.resolve_choice(""), None);
    }

    #[test]
    fn resolve_choice_is_none_for_free_text_fields() {
        let field = FieldDefinition::new("location", "Location", FieldKind::Text, "City");

        assert_eq!(field.resolve_choice("1"), None);
    }
}
