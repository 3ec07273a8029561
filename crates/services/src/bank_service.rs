use std::sync::Arc;

use serde_json::Value;

use exam_core::model::Bank;
use exam_core::parser::{parse_json_array, parse_transcript};
use storage::repository::{BANK_KEY, KeyValueStore};

use crate::error::BankError;

/// Which import format ended up being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Json,
    Text,
}

/// Result of an import call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOutcome {
    pub format: ImportFormat,
    pub added: usize,
    /// Text blocks that did not match the transcript grammar. Always 0 for JSON.
    pub skipped: usize,
}

/// Owns the persisted question bank.
///
/// The bank is stored as one JSON array under a single key and is rewritten
/// in full on every mutation, before the mutating call returns.
#[derive(Clone)]
pub struct BankService {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl BankService {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            key: BANK_KEY.to_owned(),
        }
    }

    /// Use a different storage key, e.g. to keep several banks side by side.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load and sanitize the persisted bank.
    ///
    /// Missing or unparseable data yields an empty bank. When sanitize drops
    /// records, the filtered bank is written back.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Storage` if the store cannot be read or written.
    pub async fn load(&self) -> Result<Bank, BankError> {
        let raw = self.read_raw().await?;
        let bank = Bank::from_raw(&raw);
        if bank.len() != raw.len() {
            tracing::info!(
                kept = bank.len(),
                dropped = raw.len() - bank.len(),
                "sanitized question bank"
            );
            self.write_raw(&bank.to_raw()).await?;
        }
        Ok(bank)
    }

    /// Append every element of a JSON array to the bank, unvalidated.
    ///
    /// Returns the number of elements appended.
    ///
    /// # Errors
    ///
    /// Returns `BankError::Format` if `text` is not a JSON array; callers fall
    /// back to [`BankService::import_text`]. Storage failures surface as
    /// `BankError::Storage`.
    pub async fn import_json(&self, text: &str) -> Result<usize, BankError> {
        let items = parse_json_array(text)?;
        let added = items.len();

        let mut raw = self.read_raw().await?;
        raw.extend(items);
        self.write_raw(&raw).await?;

        tracing::info!(added, total = raw.len(), "imported JSON questions");
        Ok(added)
    }

    /// Append every well-formed block of a plain-text transcript.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the bank cannot be persisted.
    pub async fn import_text(&self, text: &str) -> Result<ImportOutcome, BankError> {
        let parsed = parse_transcript(text);
        let outcome = ImportOutcome {
            format: ImportFormat::Text,
            added: parsed.added(),
            skipped: parsed.skipped,
        };

        if outcome.added > 0 {
            let mut raw = self.read_raw().await?;
            for record in &parsed.records {
                raw.push(serde_json::to_value(record)?);
            }
            self.write_raw(&raw).await?;
        }

        tracing::info!(
            added = outcome.added,
            skipped = outcome.skipped,
            "imported text questions"
        );
        Ok(outcome)
    }

    /// Import `text` as JSON, falling back to the transcript format when it is
    /// not a JSON array.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the bank cannot be persisted.
    pub async fn import(&self, text: &str) -> Result<ImportOutcome, BankError> {
        match self.import_json(text).await {
            Ok(added) => Ok(ImportOutcome {
                format: ImportFormat::Json,
                added,
                skipped: 0,
            }),
            Err(BankError::Format(err)) => {
                tracing::debug!(%err, "not a JSON array, trying text format");
                self.import_text(text).await
            }
            Err(err) => Err(err),
        }
    }

    /// Serialize the persisted bank as a JSON array accepted by
    /// [`BankService::import_json`].
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the store cannot be read.
    pub async fn export_json(&self) -> Result<String, BankError> {
        let raw = self.read_raw().await?;
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    /// Number of usable questions after sanitize.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the store cannot be read.
    pub async fn count(&self) -> Result<usize, BankError> {
        Ok(self.load().await?.len())
    }

    /// Whether an exam can be started right now.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the store cannot be read.
    pub async fn has_questions(&self) -> Result<bool, BankError> {
        Ok(!self.load().await?.is_empty())
    }

    /// Drop every question.
    ///
    /// # Errors
    ///
    /// Returns `BankError` if the store cannot be written.
    pub async fn clear(&self) -> Result<(), BankError> {
        self.store.remove(&self.key).await?;
        tracing::info!(key = %self.key, "cleared question bank");
        Ok(())
    }

    async fn read_raw(&self) -> Result<Vec<Value>, BankError> {
        let Some(text) = self.store.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => {
                tracing::warn!(key = %self.key, "persisted bank is not an array; treating as empty");
                Ok(Vec::new())
            }
            Err(err) => {
                tracing::warn!(key = %self.key, %err, "persisted bank is corrupt; treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write_raw(&self, raw: &[Value]) -> Result<(), BankError> {
        let text = serde_json::to_string(raw)?;
        self.store.put(&self.key, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    const TWO_PLUS_TWO: &str =
        "Q: 2+2?\nA: 3\nB: 4\nC: 5\nD: 6\nCorrect: B\nExplanation: basic math\n";

    fn service(repo: &InMemoryRepository) -> BankService {
        BankService::new(Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn missing_bank_loads_empty() {
        let repo = InMemoryRepository::new();
        let bank = service(&repo).load().await.unwrap();
        assert!(bank.is_empty());
    }

    #[tokio::test]
    async fn corrupt_bank_loads_empty() {
        let repo = InMemoryRepository::with_entry(BANK_KEY, "[{\"stem\": \"cut off");
        let svc = service(&repo);
        assert!(svc.load().await.unwrap().is_empty());
        assert!(!svc.has_questions().await.unwrap());

        let repo = InMemoryRepository::with_entry(BANK_KEY, r#"{"stem":"object"}"#);
        assert!(service(&repo).load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn load_writes_back_sanitized_bank() {
        let raw = r#"[
            {"stem":"Keep","options":["a","b"],"correctIndex":0},
            {"stem":"keep","options":["c","d"],"correctIndex":1},
            {"stem":"Short","options":["a"],"correctIndex":0}
        ]"#;
        let repo = InMemoryRepository::with_entry(BANK_KEY, raw);
        let svc = service(&repo);

        let bank = svc.load().await.unwrap();
        assert_eq!(bank.len(), 1);

        let persisted = repo.get(BANK_KEY).await.unwrap().unwrap();
        let items: Vec<Value> = serde_json::from_str(&persisted).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["options"][0], "a");
    }

    #[tokio::test]
    async fn import_json_appends_verbatim_and_persists() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let added = svc
            .import_json(r#"[{"stem":"one","options":["a"],"correctIndex":0}, {"stem":"two","options":["a","b"],"correctIndex":1}]"#)
            .await
            .unwrap();
        assert_eq!(added, 2);

        // Validation waits for the next load.
        let persisted: Vec<Value> =
            serde_json::from_str(&repo.get(BANK_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(persisted.len(), 2);
        assert_eq!(svc.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn import_json_rejects_non_arrays_without_writing() {
        let repo = InMemoryRepository::new();
        let err = service(&repo).import_json(r#"{"a":1}"#).await.unwrap_err();
        assert!(matches!(err, BankError::Format(_)));
        assert_eq!(repo.get(BANK_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn import_text_adds_one_record() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let outcome = svc.import_text(TWO_PLUS_TWO).await.unwrap();
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.skipped, 0);

        let bank = svc.load().await.unwrap();
        assert_eq!(bank.questions()[0].correct_index, 1);
        assert_eq!(bank.questions()[0].options.len(), 4);
    }

    #[tokio::test]
    async fn import_falls_back_to_text() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo);

        let outcome = svc
            .import(&format!("{TWO_PLUS_TWO}---\nnot a question\n"))
            .await
            .unwrap();
        assert_eq!(outcome.format, ImportFormat::Text);
        assert_eq!(outcome.added, 1);
        assert_eq!(outcome.skipped, 1);

        let outcome = svc.import("[]").await.unwrap();
        assert_eq!(outcome.format, ImportFormat::Json);
        assert_eq!(outcome.added, 0);
    }

    #[tokio::test]
    async fn export_round_trips_into_empty_bank() {
        let source = InMemoryRepository::new();
        let svc = service(&source);
        svc.import_text(TWO_PLUS_TWO).await.unwrap();
        svc.import_json(r#"[{"stem":"Other","options":["x","y"],"correctIndex":0,"explanation":"because"}]"#)
            .await
            .unwrap();
        let exported = svc.export_json().await.unwrap();

        let target = InMemoryRepository::new();
        let copy = service(&target);
        assert_eq!(copy.import_json(&exported).await.unwrap(), 2);

        assert_eq!(copy.export_json().await.unwrap(), exported);
        assert_eq!(copy.load().await.unwrap(), svc.load().await.unwrap());
    }

    #[tokio::test]
    async fn clear_and_custom_key() {
        let repo = InMemoryRepository::new();
        let svc = service(&repo).with_key("other.bank");
        svc.import_text(TWO_PLUS_TWO).await.unwrap();

        assert_eq!(repo.get(BANK_KEY).await.unwrap(), None);
        assert_eq!(svc.count().await.unwrap(), 1);

        svc.clear().await.unwrap();
        assert_eq!(svc.count().await.unwrap(), 0);
        assert_eq!(svc.export_json().await.unwrap(), "[]");
    }
}
