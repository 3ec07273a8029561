//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::ExamStatus;
use exam_core::parser::FormatError;
use storage::repository::StorageError;

/// Errors emitted by `BankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("could not serialize question bank: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors emitted by exam sessions and the controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error("the question bank is empty; import questions first")]
    EmptyBank,
    #[error("no exam has been started")]
    NoSession,
    #[error("exam is already {}", .status.label())]
    NotInProgress { status: ExamStatus },
    #[error("position {position} is outside the exam ({len} questions)")]
    PositionOutOfRange { position: usize, len: usize },
    #[error("option {option} does not exist for question {position}")]
    OptionOutOfRange { position: usize, option: usize },
    #[error(transparent)]
    Bank(#[from] BankError),
}
