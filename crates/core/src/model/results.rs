use crate::model::exam::ExamStatus;

/// Aggregate score for a finished attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreSummary {
    pub correct_count: usize,
    pub total_count: usize,
    pub percentage: u32,
}

/// A question the learner missed or skipped, with what they chose and why the
/// right answer is right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub position: usize,
    pub stem: String,
    pub options: Vec<String>,
    pub chosen: Option<usize>,
    pub correct_index: usize,
    pub explanation: Option<String>,
}

impl ReviewItem {
    #[must_use]
    pub fn was_skipped(&self) -> bool {
        self.chosen.is_none()
    }
}

/// Score plus review, produced once when an attempt ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamResults {
    pub status: ExamStatus,
    pub score: ScoreSummary,
    pub review: Vec<ReviewItem>,
}

impl ExamResults {
    /// True when every question was answered correctly.
    ///
    /// An empty `review` on a scored attempt means no mistakes.
    #[must_use]
    pub fn is_flawless(&self) -> bool {
        self.review.is_empty()
    }

    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.status == ExamStatus::TimedOut
    }
}
