use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;

use exam_core::model::{Bank, ExamResults, ExamSettings};

use super::session::ExamSession;
use crate::bank_service::{BankService, ImportOutcome};
use crate::error::{BankError, ExamError};
use crate::Clock;

/// Entry point for a presentation layer: bank import/export plus a single
/// active exam attempt.
///
/// Starting a new attempt or calling [`ExamController::reset`] discards the
/// previous one. Actions that touch an attempt first run a tick, so anything
/// arriving after the deadline sees the attempt already timed out.
pub struct ExamController {
    bank: BankService,
    clock: Clock,
    rng: StdRng,
    session: Option<ExamSession>,
}

impl ExamController {
    #[must_use]
    pub fn new(bank: BankService) -> Self {
        Self {
            bank,
            clock: Clock::default(),
            rng: StdRng::from_rng(&mut rand::rng()),
            session: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Make question sampling reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn bank(&self) -> &BankService {
        &self.bank
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Move a fixed clock forward; see [`Clock::advance`].
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }

    //
    // ─── BANK ──────────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `BankError` if the store cannot be read.
    pub async fn load_bank(&self) -> Result<Bank, BankError> {
        self.bank.load().await
    }

    /// # Errors
    ///
    /// Returns `BankError::Format` if `text` is not a JSON array.
    pub async fn import_json(&self, text: &str) -> Result<usize, BankError> {
        self.bank.import_json(text).await
    }

    /// # Errors
    ///
    /// Returns `BankError` if the bank cannot be persisted.
    pub async fn import_text(&self, text: &str) -> Result<ImportOutcome, BankError> {
        self.bank.import_text(text).await
    }

    /// # Errors
    ///
    /// Returns `BankError` if the bank cannot be persisted.
    pub async fn import(&self, text: &str) -> Result<ImportOutcome, BankError> {
        self.bank.import(text).await
    }

    /// # Errors
    ///
    /// Returns `BankError` if the store cannot be read.
    pub async fn export_json(&self) -> Result<String, BankError> {
        self.bank.export_json().await
    }

    //
    // ─── SESSION ───────────────────────────────────────────────────────────────
    //

    /// Start a new attempt with `question_count` questions over
    /// `duration_minutes`, both clamped to the supported bounds.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::EmptyBank` if there is nothing to ask; any
    /// previous attempt is left untouched in that case.
    pub async fn start_session(
        &mut self,
        question_count: u32,
        duration_minutes: u32,
    ) -> Result<&ExamSession, ExamError> {
        let bank = self.bank.load().await?;
        let settings = ExamSettings::clamped(question_count, duration_minutes);
        let session = ExamSession::start(&bank, settings, self.clock.now(), &mut self.rng)?;

        tracing::info!(
            questions = session.len(),
            bank_size = bank.len(),
            minutes = settings.duration_minutes(),
            "exam started"
        );
        Ok(self.session.insert(session))
    }

    #[must_use]
    pub fn session(&self) -> Option<&ExamSession> {
        self.session.as_ref()
    }

    /// Results of the current attempt, once it has ended.
    #[must_use]
    pub fn results(&self) -> Option<&ExamResults> {
        self.session.as_ref().and_then(ExamSession::results)
    }

    /// # Errors
    ///
    /// Returns `ExamError::NoSession`, or the session's own errors.
    pub fn select_answer(&mut self, position: usize, option: usize) -> Result<(), ExamError> {
        let now = self.clock.now();
        let session = self.session_mut()?;
        session.tick(now);
        session.select_answer(position, option)
    }

    /// # Errors
    ///
    /// Returns `ExamError::NoSession`, or the session's own errors.
    pub fn clear_answer(&mut self, position: usize) -> Result<(), ExamError> {
        let now = self.clock.now();
        let session = self.session_mut()?;
        session.tick(now);
        session.clear_answer(position)
    }

    /// Move to `position`, clamped. Returns the new position.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoSession` if no attempt exists.
    pub fn go_to(&mut self, position: usize) -> Result<usize, ExamError> {
        Ok(self.session_mut()?.go_to(position))
    }

    /// Advance the countdown using the controller's clock.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoSession` if no attempt exists.
    pub fn tick(&mut self) -> Result<Duration, ExamError> {
        let now = self.clock.now();
        Ok(self.session_mut()?.tick(now))
    }

    /// Submit the current attempt.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::NoSession`, or `ExamError::NotInProgress` if the
    /// attempt already ended (including by timing out just now).
    pub fn submit(&mut self) -> Result<&ExamResults, ExamError> {
        let now = self.clock.now();
        let session = self.session_mut()?;
        session.tick(now);
        session.submit(now)
    }

    /// Discard the current attempt, if any.
    pub fn reset(&mut self) {
        if self.session.take().is_some() {
            tracing::debug!("exam session discarded");
        }
    }

    fn session_mut(&mut self) -> Result<&mut ExamSession, ExamError> {
        self.session.as_mut().ok_or(ExamError::NoSession)
    }
}
