mod bank;
mod exam;
mod question;
mod results;

pub use bank::Bank;
pub use exam::{
    DEFAULT_MINUTES, DEFAULT_QUESTIONS, ExamSettings, ExamStatus, MAX_MINUTES, MAX_QUESTIONS,
    MIN_MINUTES, MIN_QUESTIONS,
};
pub use question::{MIN_OPTIONS, QuestionError, QuestionRecord, STEM_KEY_LEN};
pub use results::{ExamResults, ReviewItem, ScoreSummary};
