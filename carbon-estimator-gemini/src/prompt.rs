//! Prompt sent to the model.

use carbon_core::AnswerMap;

const INSTRUCTIONS: &str = "\
You estimate personal carbon emissions. Using the questionnaire answers \
below, estimate the person's emissions in kilograms of CO2.

Answers:
";

const RESPONSE_FORMAT: &str = "
Respond with a single JSON object and nothing else, in exactly this shape:
{\"daily\": <number>, \"weekly\": <number>, \"monthly\": <number>, \
\"breakdown\": [{\"name\": <category>, \"value\": <number>}]}
All numbers are kilograms of CO2 and must not be negative. Use the \
categories Transport, Electricity, Diet and Shopping where the answers \
allow it.
";

/// Builds the prompt for `answers`. Answers are listed one per line in
/// field-name order so the same answers always give the same prompt.
pub fn build_prompt(answers: &AnswerMap) -> String {
    let lines: String = answers
        .iter()
        .map(|(name, value)| format!("- {name}: {}\n", value.trim()))
        .collect();
    format!("{INSTRUCTIONS}{lines}{RESPONSE_FORMAT}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_answer_in_name_order() {
        let answers: AnswerMap = [("mileage", " 10 "), ("dietType", "vegan")]
            .into_iter()
            .collect();

        let prompt = build_prompt(&answers);

        let diet = prompt.find("- dietType: vegan\n").unwrap();
        let mileage = prompt.find("- mileage: 10\n").unwrap();
        assert!(diet < mileage);
    }

    #[test]
    fn prompt_describes_expected_json_shape() {
        let prompt = build_prompt(&AnswerMap::new());

        for key in ["\"daily\"", "\"weekly\"", "\"monthly\"", "\"breakdown\""] {
            assert!(prompt.contains(key), "prompt should mention {key}");
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let answers: AnswerMap = [("age", "30"), ("country", "PT")].into_iter().collect();

        assert_eq!(build_prompt(&answers), build_prompt(&answers.clone()));
    }
}
