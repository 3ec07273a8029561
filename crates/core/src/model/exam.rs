use chrono::Duration;

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

pub const MIN_QUESTIONS: u32 = 5;
pub const MAX_QUESTIONS: u32 = 200;
pub const MIN_MINUTES: u32 = 5;
pub const MAX_MINUTES: u32 = 240;

pub const DEFAULT_QUESTIONS: u32 = 20;
pub const DEFAULT_MINUTES: u32 = 30;

/// Requested shape of an exam attempt, already clamped to supported bounds.
///
/// The question floor is advisory: a bank smaller than `MIN_QUESTIONS`
/// still yields an exam with every available question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamSettings {
    question_count: u32,
    duration_minutes: u32,
}

impl ExamSettings {
    /// Clamp a request to `[MIN_QUESTIONS, MAX_QUESTIONS]` questions and
    /// `[MIN_MINUTES, MAX_MINUTES]` minutes.
    #[must_use]
    pub fn clamped(question_count: u32, duration_minutes: u32) -> Self {
        Self {
            question_count: question_count.clamp(MIN_QUESTIONS, MAX_QUESTIONS),
            duration_minutes: duration_minutes.clamp(MIN_MINUTES, MAX_MINUTES),
        }
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }

    /// Number of questions to draw from a bank of `bank_size`.
    #[must_use]
    pub fn sample_size(&self, bank_size: usize) -> usize {
        usize::try_from(self.question_count)
            .unwrap_or(usize::MAX)
            .min(bank_size)
    }
}

impl Default for ExamSettings {
    fn default() -> Self {
        Self::clamped(DEFAULT_QUESTIONS, DEFAULT_MINUTES)
    }
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle state of a single exam attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamStatus {
    InProgress,
    Submitted,
    TimedOut,
}

impl ExamStatus {
    #[must_use]
    pub fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InProgress => "in progress",
            Self::Submitted => "submitted",
            Self::TimedOut => "timed out",
        }
    }
}
