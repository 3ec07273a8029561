use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question stem cannot be empty")]
    EmptyStem,

    #[error("a question needs at least 2 options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

//
// ─── QUESTION RECORD ───────────────────────────────────────────────────────────
//

/// Minimum number of options a usable question carries.
pub const MIN_OPTIONS: usize = 2;

/// Number of leading stem characters compared when deduplicating.
pub const STEM_KEY_LEN: usize = 80;

/// A single multiple-choice question as persisted in the bank.
///
/// Field names follow the persisted JSON layout (`stem`, `options`,
/// `correctIndex`, `explanation`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub stem: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuestionRecord {
    /// Build a record, rejecting shapes a bank would drop on load.
    ///
    /// Empty explanations are normalized to `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the stem is blank, fewer than two options are
    /// given, or `correct_index` does not point at an option.
    pub fn new(
        stem: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let stem = stem.into();
        if stem.trim().is_empty() {
            return Err(QuestionError::EmptyStem);
        }
        let record = Self {
            stem,
            options,
            correct_index,
            explanation: explanation.filter(|text| !text.trim().is_empty()),
        };
        record.check()?;
        Ok(record)
    }

    /// Structural check applied by bank sanitize.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::TooFewOptions` or
    /// `QuestionError::CorrectIndexOutOfRange`.
    pub fn check(&self) -> Result<(), QuestionError> {
        let len = self.options.len();
        if len < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions { len });
        }
        if self.correct_index >= len {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: self.correct_index,
                len,
            });
        }
        Ok(())
    }

    /// Dedup key: trimmed, lowercased stem cut to `STEM_KEY_LEN` characters.
    #[must_use]
    pub fn stem_key(&self) -> String {
        self.stem
            .trim()
            .chars()
            .flat_map(char::to_lowercase)
            .take(STEM_KEY_LEN)
            .collect()
    }

    #[must_use]
    pub fn is_correct(&self, chosen: Option<usize>) -> bool {
        chosen == Some(self.correct_index)
    }

    #[must_use]
    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_index).map(String::as_str)
    }
}
