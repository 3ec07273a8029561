use exam_core::model::ExamStatus;

/// Snapshot of how far along an exam attempt is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    pub position: usize,
    pub status: ExamStatus,
}
