use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FieldDefinition;

/// Accumulated answers across every step, keyed by field name.
///
/// A field is present only once a value has been supplied. Blank values can
/// still be stored (the wizard upserts whatever the renderer sends), but
/// [`AnswerMap::is_answered`] treats them as unanswered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<String, String>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the answer for `name`.
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn remove(
        &mut self,
        name: &str,
    ) -> Option<String> {
        self.0.remove(name)
    }

    /// `true` when `name` has a non-empty value. Whitespace counts as an
    /// answer.
    pub fn is_answered(
        &self,
        name: &str,
    ) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// The answers belonging to `fields`, in field order. Unanswered fields
    /// are reported as `None` so a renderer can show an empty input.
    pub fn subset<'a>(
        &'a self,
        fields: &'a [FieldDefinition],
    ) -> Vec<(&'a str, Option<&'a str>)> {
        fields
            .iter()
            .map(|f| (f.name.as_str(), self.get(&f.name)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AnswerMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::FieldKind;

    #[test]
    fn set_upserts_existing_value() {
        let mut answers = AnswerMap::new();

        answers.set("mileage", "10");
        answers.set("mileage", "12");

        assert_eq!(answers.get("mileage"), Some("12"));
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn absent_field_is_unanswered() {
        let answers = AnswerMap::new();

        assert!(!answers.is_answered("name"));
    }

    #[test]
    fn empty_value_is_stored_but_unanswered() {
        let mut answers = AnswerMap::new();

        answers.set("name", "");

        assert_eq!(answers.get("name"), Some(""));
        assert!(!answers.is_answered("name"));
    }

    #[test]
    fn whitespace_value_is_answered() {
        let mut answers = AnswerMap::new();

        answers.set("location", "   ");

        assert!(answers.is_answered("location"));
    }

    #[test]
    fn subset_follows_field_order() {
        let fields = vec![
            FieldDefinition::new("b", "B", FieldKind::Text, ""),
            FieldDefinition::new("a", "A", FieldKind::Text, ""),
        ];
        let answers: AnswerMap = [("a", "1"), ("other", "x")].into_iter().collect();

        assert_eq!(answers.subset(&fields), vec![("b", None), ("a", Some("1"))]);
    }

    #[test]
    fn iter_is_sorted_by_name() {
        let answers: AnswerMap = [("mileage", "10"), ("age", "30")].into_iter().collect();

        let names: Vec<_> = answers.iter().map(|(k, _)| k).collect();

        assert_eq!(names, vec!["age", "mileage"]);
    }
}
