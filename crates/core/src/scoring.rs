//! Scoring and review for a finished exam attempt.
//!
//! Both functions take the attempt's questions and its answers slot-by-slot;
//! `answers[i]` is the option chosen for `questions[i]`, `None` if skipped.
//! Missing trailing answers count as skipped.

use crate::model::{ExamResults, ExamStatus, QuestionRecord, ReviewItem, ScoreSummary};

fn chosen_at(answers: &[Option<usize>], position: usize) -> Option<usize> {
    answers.get(position).copied().flatten()
}

/// Count correct answers; unanswered questions are incorrect.
///
/// `percentage` is `100 * correct / total` rounded half up, and 0 for an
/// empty attempt.
#[must_use]
pub fn score(questions: &[QuestionRecord], answers: &[Option<usize>]) -> ScoreSummary {
    let total_count = questions.len();
    let correct_count = questions
        .iter()
        .enumerate()
        .filter(|(position, question)| question.is_correct(chosen_at(answers, *position)))
        .count();

    ScoreSummary {
        correct_count,
        total_count,
        percentage: percentage(correct_count, total_count),
    }
}

fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * correct + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(100)
}

/// Review items for every missed or skipped question, in question order.
///
/// An empty result means the attempt had no mistakes.
#[must_use]
pub fn build_review(questions: &[QuestionRecord], answers: &[Option<usize>]) -> Vec<ReviewItem> {
    questions
        .iter()
        .enumerate()
        .filter_map(|(position, question)| {
            let chosen = chosen_at(answers, position);
            if question.is_correct(chosen) {
                return None;
            }
            Some(ReviewItem {
                position,
                stem: question.stem.clone(),
                options: question.options.clone(),
                chosen,
                correct_index: question.correct_index,
                explanation: question.explanation.clone(),
            })
        })
        .collect()
}

/// Score and review together, stamped with how the attempt ended.
#[must_use]
pub fn evaluate(
    questions: &[QuestionRecord],
    answers: &[Option<usize>],
    status: ExamStatus,
) -> ExamResults {
    ExamResults {
        status,
        score: score(questions, answers),
        review: build_review(questions, answers),
    }
}
