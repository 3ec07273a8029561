#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{BANK_KEY, InMemoryRepository, KeyValueStore, Storage, StorageError};
