//! Built-in questionnaires.
//!
//! Both sets share field names so answer files and estimators work with
//! either; they differ only in which steps are asked.

use super::StepSchema;
use crate::models::{FieldDefinition, FieldKind, StepDefinition};

/// Selects one of the built-in questionnaires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionSet {
    /// Personal information, transportation, lifestyle and home energy.
    #[default]
    Footprint,
    /// Transportation and home energy only.
    Quick,
}

impl QuestionSet {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Footprint => "footprint",
            Self::Quick => "quick",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "footprint" | "full" => Some(Self::Footprint),
            "quick" => Some(Self::Quick),
            _ => None,
        }
    }

    pub fn schema(&self) -> StepSchema {
        let steps = match self {
            Self::Footprint => vec![
                personal_information(),
                transportation(),
                lifestyle(),
                home_energy(),
            ],
            Self::Quick => vec![transportation(), home_energy()],
        };
        StepSchema { steps }
    }
}

fn personal_information() -> StepDefinition {
    StepDefinition::new(
        "Personal Information",
        vec![
            FieldDefinition::new("date", "Date", FieldKind::Date, "Select date"),
            FieldDefinition::new("age", "Age", FieldKind::Number, "Enter your age"),
            FieldDefinition::new("location", "Location", FieldKind::Text, "Enter your city"),
            FieldDefinition::new("country", "Country", FieldKind::Text, "Enter your country"),
        ],
    )
}

fn transportation() -> StepDefinition {
    StepDefinition::new(
        "Transportation",
        vec![
            FieldDefinition::single_choice(
                "transportType",
                "Transport Type",
                "Select transport type",
                &[
                    ("car", "Car"),
                    ("public", "Public Transport"),
                    ("bicycle", "Bicycle"),
                    ("walking", "Walking"),
                ],
            ),
            FieldDefinition::new("mileage", "Daily Mileage", FieldKind::Number, "Miles per day"),
        ],
    )
}

fn lifestyle() -> StepDefinition {
    StepDefinition::new(
        "Lifestyle",
        vec![
            FieldDefinition::single_choice(
                "dietType",
                "Food Consumption",
                "Select diet type",
                &[
                    ("vegan", "Vegan"),
                    ("vegetarian", "Vegetarian"),
                    ("omnivore", "Omnivore"),
                ],
            ),
            FieldDefinition::single_choice(
                "shoppingHabits",
                "Shopping Habits",
                "Select shopping frequency",
                &[
                    ("minimal", "Eco-friendly"),
                    ("moderate", "Moderate"),
                    ("frequent", "Frequent"),
                ],
            ),
        ],
    )
}

fn home_energy() -> StepDefinition {
    StepDefinition::new(
        "Home Energy",
        vec![
            FieldDefinition::new(
                "electricityUsage",
                "Monthly Electricity Usage (kWh)",
                FieldKind::Number,
                "Enter kWh per month",
            ),
            FieldDefinition::single_choice(
                "solarPanels",
                "Solar Panels",
                "Do you use solar panels?",
                &[("yes", "Yes"), ("no", "No")],
            ),
        ],
    )
}
