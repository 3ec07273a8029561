//! Plain-text views of the exam for the terminal.

use std::fmt::Write as _;

use chrono::Duration;
use exam_core::model::{ExamResults, ReviewItem};
use exam_core::time::format_countdown;
use services::ExamSession;

/// `A`, `B`, ... for option indices; falls back to the 1-based number past `Z`.
#[must_use]
pub fn option_label(index: usize) -> String {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or_else(|| (index + 1).to_string(), |i| char::from(b'A' + i).to_string())
}

/// The current question with its options, the recorded answer marked.
#[must_use]
pub fn question_view(session: &ExamSession, remaining: Duration) -> String {
    let mut out = String::new();
    let progress = session.progress();
    let Some(question) = session.current_question() else {
        return out;
    };

    let _ = writeln!(
        out,
        "\nQuestion {} of {}   answered {}/{}   time left {}",
        progress.position + 1,
        progress.total,
        progress.answered,
        progress.total,
        format_countdown(remaining)
    );
    let _ = writeln!(out, "{}", question.stem);
    let chosen = session.answer(progress.position);
    for (i, option) in question.options.iter().enumerate() {
        let marker = if chosen == Some(i) { '*' } else { ' ' };
        let _ = writeln!(out, " {marker} {}) {option}", option_label(i));
    }
    out
}

fn review_item_view(out: &mut String, item: &ReviewItem) {
    let _ = writeln!(out, "\n#{} {}", item.position + 1, item.stem);
    let answer_text = |index: usize| {
        item.options
            .get(index)
            .map_or_else(String::new, |text| format!("{}) {text}", option_label(index)))
    };
    match item.chosen {
        Some(chosen) => {
            let _ = writeln!(out, "   your answer:    {}", answer_text(chosen));
        }
        None => {
            let _ = writeln!(out, "   your answer:    (none)");
        }
    }
    let _ = writeln!(out, "   correct answer: {}", answer_text(item.correct_index));
    if let Some(explanation) = &item.explanation {
        let _ = writeln!(out, "   {explanation}");
    }
}

/// Score line followed by the review, or a no-mistakes line.
#[must_use]
pub fn results_view(results: &ExamResults) -> String {
    let mut out = String::new();
    let score = results.score;
    let heading = if results.timed_out() {
        "Time is up."
    } else {
        "Exam submitted."
    };
    let _ = writeln!(
        out,
        "\n{heading} Score: {}/{} ({}%)",
        score.correct_count, score.total_count, score.percentage
    );

    if results.is_flawless() {
        let _ = writeln!(out, "No mistakes. Every question was answered correctly.");
        return out;
    }

    let _ = writeln!(out, "Review ({} to revisit):", results.review.len());
    for item in &results.review {
        review_item_view(&mut out, item);
    }
    out
}

pub const EXAM_HELP: &str = "\
Commands:
  a, b, c ... or 1, 2, 3 ...   choose an option
  next | n | ]                 next question
  prev | p | [                 previous question
  go <number>                  jump to a question
  clear                        remove your answer here
  show                         show the question again
  submit                       finish and score the exam
  quit                         leave without scoring
  help                         this list";

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ExamStatus, ScoreSummary};

    #[test]
    fn labels_letters_then_numbers() {
        assert_eq!(option_label(0), "A");
        assert_eq!(option_label(3), "D");
        assert_eq!(option_label(25), "Z");
        assert_eq!(option_label(26), "27");
    }

    #[test]
    fn flawless_results_say_so() {
        let results = ExamResults {
            status: ExamStatus::Submitted,
            score: ScoreSummary {
                correct_count: 5,
                total_count: 5,
                percentage: 100,
            },
            review: Vec::new(),
        };
        let view = results_view(&results);
        assert!(view.contains("Score: 5/5 (100%)"));
        assert!(view.contains("No mistakes"));
    }

    #[test]
    fn review_shows_choice_answer_and_explanation() {
        let results = ExamResults {
            status: ExamStatus::TimedOut,
            score: ScoreSummary {
                correct_count: 0,
                total_count: 2,
                percentage: 0,
            },
            review: vec![
                ReviewItem {
                    position: 0,
                    stem: "2+2?".into(),
                    options: vec!["3".into(), "4".into()],
                    chosen: Some(0),
                    correct_index: 1,
                    explanation: Some("basic math".into()),
                },
                ReviewItem {
                    position: 1,
                    stem: "skipped".into(),
                    options: vec!["x".into(), "y".into()],
                    chosen: None,
                    correct_index: 0,
                    explanation: None,
                },
            ],
        };
        let view = results_view(&results);
        assert!(view.starts_with("\nTime is up."));
        assert!(view.contains("your answer:    A) 3"));
        assert!(view.contains("correct answer: B) 4"));
        assert!(view.contains("basic math"));
        assert!(view.contains("your answer:    (none)"));
    }
}
