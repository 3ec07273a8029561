use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::model::question::QuestionRecord;

/// Sanitized, ordered set of questions an exam can draw from.
///
/// A `Bank` only ever holds records that passed [`QuestionRecord::check`] and
/// whose stem keys are unique, first occurrence kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bank {
    questions: Vec<QuestionRecord>,
}

impl Bank {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Drop malformed records and collapse duplicate stems.
    ///
    /// Relative order of the surviving records is preserved.
    #[must_use]
    pub fn sanitize(records: impl IntoIterator<Item = QuestionRecord>) -> Self {
        let mut seen = HashSet::new();
        let questions = records
            .into_iter()
            .filter(|record| record.check().is_ok())
            .filter(|record| seen.insert(record.stem_key()))
            .collect();
        Self { questions }
    }

    /// Decode raw persisted values, skipping any element that is not a
    /// question record, then sanitize.
    #[must_use]
    pub fn from_raw(values: &[Value]) -> Self {
        Self::sanitize(
            values
                .iter()
                .filter_map(|value| QuestionRecord::deserialize(value).ok()),
        )
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn into_questions(self) -> Vec<QuestionRecord> {
        self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Serialize the bank into its persisted JSON shape.
    #[must_use]
    pub fn to_raw(&self) -> Vec<Value> {
        self.questions
            .iter()
            .filter_map(|record| serde_json::to_value(record).ok())
            .collect()
    }
}
