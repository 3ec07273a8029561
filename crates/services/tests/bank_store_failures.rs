use std::sync::Arc;

use async_trait::async_trait;
use services::{BankError, BankService};
use storage::repository::{BANK_KEY, InMemoryRepository, KeyValueStore, StorageError};

/// Reads succeed, writes always fail.
struct ReadOnlyStore {
    inner: InMemoryRepository,
}

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Connection("read-only".into()))
    }
}

#[tokio::test]
async fn failed_write_surfaces_storage_error() {
    let store = ReadOnlyStore {
        inner: InMemoryRepository::new(),
    };
    let bank = BankService::new(Arc::new(store));

    let err = bank.import_json("[]").await.unwrap_err();
    assert!(matches!(err, BankError::Storage(_)));
}

#[tokio::test]
async fn clean_bank_loads_without_writing() {
    let raw = r#"[{"stem":"fine","options":["a","b"],"correctIndex":0}]"#;
    let store = ReadOnlyStore {
        inner: InMemoryRepository::with_entry(BANK_KEY, raw),
    };
    let bank = BankService::new(Arc::new(store));

    assert_eq!(bank.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn text_import_with_no_matches_does_not_write() {
    let store = ReadOnlyStore {
        inner: InMemoryRepository::new(),
    };
    let bank = BankService::new(Arc::new(store));

    let outcome = bank.import_text("nothing useful here").await.unwrap();
    assert_eq!(outcome.added, 0);
    assert_eq!(outcome.skipped, 1);
}
