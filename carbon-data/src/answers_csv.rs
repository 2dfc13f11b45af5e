use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use carbon_core::{AnswerMap, StepSchema};
use thiserror::Error;

/// Errors that can occur when loading answer rows.
#[derive(Debug, Error)]
pub enum AnswerLoadError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Column '{column}' is not a field of the questionnaire")]
    UnknownField { column: String },

    #[error("Column '{column}' appears more than once")]
    DuplicateColumn { column: String },
}

impl From<csv::Error> for AnswerLoadError {
    fn from(err: csv::Error) -> Self {
        AnswerLoadError::CsvParse(err.to_string())
    }
}

/// One respondent's answers, with the CSV line they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRow {
    pub line: u64,
    pub answers: AnswerMap,
}

/// Loader for pre-filled answers from CSV files.
///
/// The header row names schema fields; each following row is one
/// respondent. Columns may appear in any order and may be a subset of the
/// schema. Cells are trimmed and an empty cell leaves that field
/// unanswered, so the row fails validation at the step that asks for it.
pub struct AnswersCsv;

impl AnswersCsv {
    pub fn parse<R: Read>(
        reader: R,
        schema: &StepSchema,
    ) -> Result<Vec<AnswerRow>, AnswerLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut seen = HashSet::new();
        for column in &headers {
            if schema.field(column).is_none() {
                return Err(AnswerLoadError::UnknownField {
                    column: column.to_string(),
                });
            }
            if !seen.insert(column) {
                return Err(AnswerLoadError::DuplicateColumn {
                    column: column.to_string(),
                });
            }
        }

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(0, csv::Position::line);
            let answers = headers
                .iter()
                .zip(record.iter())
                .filter(|(_, cell)| !cell.is_empty())
                .collect();
            rows.push(AnswerRow { line, answers });
        }

        Ok(rows)
    }

    pub fn load(
        path: &Path,
        schema: &StepSchema,
    ) -> Result<Vec<AnswerRow>, AnswerLoadError> {
        let file = File::open(path).map_err(|source| AnswerLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(file, schema)
    }
}

#[cfg(test)]
mod tests {
    use carbon_core::QuestionSet;
    use pretty_assertions::assert_eq;

    use super::*;

    fn quick() -> StepSchema {
        QuestionSet::Quick.schema()
    }

    #[test]
    fn test_parse_single_row() {
        let csv = "transportType,mileage,electricityUsage,solarPanels\ncar,25,300,no";

        let rows = AnswersCsv::parse(csv.as_bytes(), &quick()).expect("Failed to parse CSV");

        assert_eq!(
            rows,
            vec![AnswerRow {
                line: 2,
                answers: [
                    ("transportType", "car"),
                    ("mileage", "25"),
                    ("electricityUsage", "300"),
                    ("solarPanels", "no"),
                ]
                .into_iter()
                .collect(),
            }]
        );
    }

    #[test]
    fn test_parse_trims_cells_and_skips_empty_ones() {
        let csv = "mileage , transportType\n  12  ,\n";

        let rows = AnswersCsv::parse(csv.as_bytes(), &quick()).expect("Failed to parse CSV");

        assert_eq!(rows[0].answers.get("mileage"), Some("12"));
        assert_eq!(rows[0].answers.get("transportType"), None);
    }

    #[test]
    fn test_parse_column_order_is_free() {
        let csv = "solarPanels,mileage\nyes,3\n";

        let rows = AnswersCsv::parse(csv.as_bytes(), &quick()).expect("Failed to parse CSV");

        assert_eq!(rows[0].answers.get("solarPanels"), Some("yes"));
        assert_eq!(rows[0].answers.len(), 2);
    }

    #[test]
    fn test_parse_unknown_column() {
        let csv = "mileage,dietType\n3,vegan\n";

        let err = AnswersCsv::parse(csv.as_bytes(), &quick()).expect_err("Should reject column");

        let AnswerLoadError::UnknownField { column } = err else {
            panic!("Expected UnknownField, got: {:?}", err);
        };
        assert_eq!(column, "dietType");
    }

    #[test]
    fn test_parse_duplicate_column() {
        let csv = "mileage,mileage\n3,4\n";

        let err = AnswersCsv::parse(csv.as_bytes(), &quick()).expect_err("Should reject column");

        assert!(matches!(err, AnswerLoadError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_parse_ragged_row_is_csv_error() {
        let csv = "mileage,solarPanels\n3\n";

        let err = AnswersCsv::parse(csv.as_bytes(), &quick()).expect_err("Should reject row");

        assert!(matches!(err, AnswerLoadError::CsvParse(_)));
    }

    #[test]
    fn test_parse_header_only() {
        let csv = "mileage,solarPanels\n";

        let rows = AnswersCsv::parse(csv.as_bytes(), &quick()).expect("Failed to parse CSV");

        assert!(rows.is_empty());
    }
}
