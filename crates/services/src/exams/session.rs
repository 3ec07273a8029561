use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use std::fmt;

use exam_core::model::{Bank, ExamResults, ExamSettings, ExamStatus, QuestionRecord};
use exam_core::scoring;
use exam_core::time::remaining_until;

use super::progress::ExamProgress;
use crate::error::ExamError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One timed attempt at a random sample of the bank.
///
/// The question list is fixed at start. Answers and position change while the
/// attempt is in progress; the attempt ends exactly once, by `submit` or by a
/// `tick` at or past the deadline, and is scored at that moment.
pub struct ExamSession {
    questions: Vec<QuestionRecord>,
    answers: Vec<Option<usize>>,
    position: usize,
    settings: ExamSettings,
    started_at: DateTime<Utc>,
    deadline: DateTime<Utc>,
    status: ExamStatus,
    finished_at: Option<DateTime<Utc>>,
    results: Option<ExamResults>,
}

impl ExamSession {
    /// Draw `min(requested, bank size)` distinct questions and start the clock.
    ///
    /// The bank is copied, shuffled (Fisher-Yates) and truncated, so no
    /// question repeats within a session.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyBank` if the bank holds no questions.
    pub fn start<R: Rng + ?Sized>(
        bank: &Bank,
        settings: ExamSettings,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, ExamError> {
        if bank.is_empty() {
            return Err(ExamError::EmptyBank);
        }

        let mut questions = bank.questions().to_vec();
        questions.shuffle(rng);
        questions.truncate(settings.sample_size(bank.len()));

        let answers = vec![None; questions.len()];
        Ok(Self {
            questions,
            answers,
            position: 0,
            settings,
            started_at: now,
            deadline: now + settings.duration(),
            status: ExamStatus::InProgress,
            finished_at: None,
            results: None,
        })
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn settings(&self) -> ExamSettings {
        self.settings
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.position)
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    /// The option recorded for `position`, if any.
    #[must_use]
    pub fn answer(&self, position: usize) -> Option<usize> {
        self.answers.get(position).copied().flatten()
    }

    #[must_use]
    pub fn status(&self) -> ExamStatus {
        self.status
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Score and review, present once the attempt has ended.
    #[must_use]
    pub fn results(&self) -> Option<&ExamResults> {
        self.results.as_ref()
    }

    /// Time left at `now`; zero once the attempt has ended.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.is_finished() {
            return Duration::zero();
        }
        remaining_until(self.deadline, now)
    }

    #[must_use]
    pub fn progress(&self) -> ExamProgress {
        let answered = self.answers.iter().filter(|a| a.is_some()).count();
        ExamProgress {
            total: self.questions.len(),
            answered,
            unanswered: self.questions.len() - answered,
            position: self.position,
            status: self.status,
        }
    }

    /// Record `option` as the answer at `position`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` after the attempt ended,
    /// `ExamError::PositionOutOfRange` or `ExamError::OptionOutOfRange` for
    /// indices that do not exist.
    pub fn select_answer(&mut self, position: usize, option: usize) -> Result<(), ExamError> {
        self.ensure_in_progress()?;
        let question = self.question_at(position)?;
        if option >= question.options.len() {
            return Err(ExamError::OptionOutOfRange { position, option });
        }
        self.answers[position] = Some(option);
        Ok(())
    }

    /// Forget the answer at `position`.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` or `ExamError::PositionOutOfRange`.
    pub fn clear_answer(&mut self, position: usize) -> Result<(), ExamError> {
        self.ensure_in_progress()?;
        self.question_at(position)?;
        self.answers[position] = None;
        Ok(())
    }

    /// Move to `position`, clamped to the question range. Returns the new position.
    pub fn go_to(&mut self, position: usize) -> usize {
        self.position = position.min(self.questions.len().saturating_sub(1));
        self.position
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.position.saturating_add(1))
    }

    pub fn previous(&mut self) -> usize {
        self.go_to(self.position.saturating_sub(1))
    }

    /// Advance the countdown to `now` and return the time left.
    ///
    /// Reaching the deadline ends the attempt as timed out and scores it.
    /// Once the attempt has ended, further ticks change nothing and return zero.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Duration {
        if self.is_finished() {
            return Duration::zero();
        }
        let remaining = remaining_until(self.deadline, now);
        if remaining <= Duration::zero() {
            self.finish(ExamStatus::TimedOut, now);
        }
        remaining
    }

    /// End the attempt now and score it. Unanswered questions count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NotInProgress` if the attempt already ended.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<&ExamResults, ExamError> {
        self.ensure_in_progress()?;
        Ok(self.finish(ExamStatus::Submitted, now))
    }

    fn finish(&mut self, status: ExamStatus, now: DateTime<Utc>) -> &ExamResults {
        self.status = status;
        self.finished_at = Some(now);
        let results = scoring::evaluate(&self.questions, &self.answers, status);
        tracing::info!(
            status = status.label(),
            correct = results.score.correct_count,
            total = results.score.total_count,
            percentage = results.score.percentage,
            "exam finished"
        );
        self.results.insert(results)
    }

    fn ensure_in_progress(&self) -> Result<(), ExamError> {
        if self.is_finished() {
            return Err(ExamError::NotInProgress {
                status: self.status,
            });
        }
        Ok(())
    }

    fn question_at(&self, position: usize) -> Result<&QuestionRecord, ExamError> {
        self.questions
            .get(position)
            .ok_or(ExamError::PositionOutOfRange {
                position,
                len: self.questions.len(),
            })
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("questions_len", &self.questions.len())
            .field("position", &self.position)
            .field("status", &self.status)
            .field("started_at", &self.started_at)
            .field("deadline", &self.deadline)
            .field("finished_at", &self.finished_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn build_bank(size: usize) -> Bank {
        Bank::sanitize((0..size).map(|i| {
            QuestionRecord::new(
                format!("Question {i}"),
                vec!["a".into(), "b".into(), "c".into(), "d".into()],
                i % 4,
                None,
            )
            .unwrap()
        }))
    }

    fn start(bank: &Bank, count: u32, minutes: u32) -> ExamSession {
        let mut rng = StdRng::seed_from_u64(7);
        ExamSession::start(bank, ExamSettings::clamped(count, minutes), fixed_now(), &mut rng)
            .unwrap()
    }

    #[test]
    fn empty_bank_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = ExamSession::start(&Bank::empty(), ExamSettings::default(), fixed_now(), &mut rng)
            .unwrap_err();
        assert!(matches!(err, ExamError::EmptyBank));
    }

    #[test]
    fn samples_without_replacement() {
        for bank_size in [1_usize, 4, 5, 12, 60] {
            for requested in [5_u32, 10, 50] {
                let bank = build_bank(bank_size);
                let session = start(&bank, requested, 30);
                let expected = (requested as usize).min(bank_size);
                assert_eq!(session.len(), expected);

                let stems: HashSet<_> = session.questions().iter().map(|q| &q.stem).collect();
                assert_eq!(stems.len(), expected, "repeat in sample of {bank_size}");
            }
        }
    }

    #[test]
    fn small_bank_still_starts_below_floor() {
        let session = start(&build_bank(2), 5, 30);
        assert_eq!(session.len(), 2);
        assert_eq!(session.status(), ExamStatus::InProgress);
        assert_eq!(session.progress().unanswered, 2);
    }

    #[test]
    fn starts_fresh() {
        let session = start(&build_bank(10), 5, 1);
        assert_eq!(session.position(), 0);
        assert!(session.answers().iter().all(Option::is_none));
        assert_eq!(session.deadline(), fixed_now() + Duration::minutes(5));
        assert!(session.results().is_none());
    }

    #[test]
    fn reselecting_overwrites() {
        let mut session = start(&build_bank(6), 5, 30);
        session.select_answer(1, 0).unwrap();
        session.select_answer(1, 3).unwrap();
        assert_eq!(session.answer(1), Some(3));
        assert_eq!(session.progress().answered, 1);

        session.clear_answer(1).unwrap();
        assert_eq!(session.answer(1), None);
    }

    #[test]
    fn rejects_unknown_positions_and_options() {
        let mut session = start(&build_bank(5), 5, 30);
        assert!(matches!(
            session.select_answer(5, 0).unwrap_err(),
            ExamError::PositionOutOfRange { position: 5, len: 5 }
        ));
        assert!(matches!(
            session.select_answer(0, 4).unwrap_err(),
            ExamError::OptionOutOfRange { position: 0, option: 4 }
        ));
    }

    #[test]
    fn navigation_preserves_answers() {
        let mut session = start(&build_bank(8), 5, 30);
        session.select_answer(0, 2).unwrap();
        assert_eq!(session.go_to(1), 1);
        assert_eq!(session.go_to(0), 0);
        assert_eq!(session.answer(0), Some(2));
    }

    #[test]
    fn go_to_clamps() {
        let mut session = start(&build_bank(8), 5, 30);
        assert_eq!(session.go_to(99), 4);
        assert_eq!(session.next(), 4);
        assert_eq!(session.go_to(0), 0);
        assert_eq!(session.previous(), 0);
        assert_eq!(session.next(), 1);
    }

    #[test]
    fn scores_answered_and_skipped() {
        let bank = Bank::sanitize(vec![
            QuestionRecord::new("first", vec!["a".into(), "b".into()], 0, None).unwrap(),
            QuestionRecord::new("second", vec!["a".into(), "b".into()], 1, None).unwrap(),
        ]);
        let mut session = start(&bank, 5, 30);
        let first = session
            .questions()
            .iter()
            .position(|q| q.stem == "first")
            .unwrap();
        session.select_answer(first, 0).unwrap();

        let results = session.submit(fixed_now()).unwrap();
        assert_eq!(results.score.correct_count, 1);
        assert_eq!(results.score.total_count, 2);
        assert_eq!(results.score.percentage, 50);
        assert_eq!(results.review.len(), 1);
        assert_eq!(results.review[0].stem, "second");
    }

    #[test]
    fn tick_counts_down_then_times_out_once() {
        let mut session = start(&build_bank(5), 5, 5);
        let now = fixed_now();

        assert_eq!(session.tick(now + Duration::minutes(1)), Duration::minutes(4));
        assert_eq!(session.status(), ExamStatus::InProgress);

        session.select_answer(0, 0).unwrap();
        assert_eq!(session.tick(now + Duration::minutes(5)), Duration::zero());
        assert_eq!(session.status(), ExamStatus::TimedOut);
        let first = session.results().cloned().unwrap();
        let finished_at = session.finished_at();

        assert_eq!(session.tick(now + Duration::minutes(9)), Duration::zero());
        assert_eq!(session.status(), ExamStatus::TimedOut);
        assert_eq!(session.results(), Some(&first));
        assert_eq!(session.finished_at(), finished_at);
        assert!(first.timed_out());
    }

    #[test]
    fn stale_tick_after_submit_is_a_no_op() {
        let mut session = start(&build_bank(5), 5, 5);
        session.submit(fixed_now()).unwrap();

        assert_eq!(session.tick(fixed_now() + Duration::hours(1)), Duration::zero());
        assert_eq!(session.status(), ExamStatus::Submitted);
        assert_eq!(session.remaining(fixed_now()), Duration::zero());
    }

    #[test]
    fn finished_session_rejects_changes() {
        let mut session = start(&build_bank(5), 5, 5);
        session.submit(fixed_now()).unwrap();

        assert!(matches!(
            session.submit(fixed_now()).unwrap_err(),
            ExamError::NotInProgress { status: ExamStatus::Submitted }
        ));
        assert!(matches!(
            session.select_answer(0, 0).unwrap_err(),
            ExamError::NotInProgress { .. }
        ));
        assert!(session.clear_answer(0).is_err());

        // Reviewing a finished attempt can still move around.
        assert_eq!(session.go_to(3), 3);
    }
}
