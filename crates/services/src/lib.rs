#![forbid(unsafe_code)]

pub mod bank_service;
pub mod error;
pub mod exams;

pub use exam_core::Clock;

pub use bank_service::{BankService, ImportFormat, ImportOutcome};
pub use error::{BankError, ExamError};
pub use exams::{ExamController, ExamProgress, ExamSession};
