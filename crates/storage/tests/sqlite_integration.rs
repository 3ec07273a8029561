use storage::repository::{BANK_KEY, KeyValueStore, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_overwrites_value_under_key() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_overwrite?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    assert_eq!(repo.get(BANK_KEY).await.unwrap(), None);

    repo.put(BANK_KEY, r#"[{"stem":"a"}]"#).await.unwrap();
    repo.put(BANK_KEY, "[]").await.unwrap();

    assert_eq!(repo.get(BANK_KEY).await.unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn sqlite_migrations_are_repeatable() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_kv_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.put("k", "v").await.unwrap();
    repo.migrate().await.expect("second migrate");

    assert_eq!(repo.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn sqlite_remove_clears_key() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_remove?mode=memory&cache=shared")
        .await
        .expect("storage");

    storage.store.put(BANK_KEY, "[]").await.unwrap();
    storage.store.remove(BANK_KEY).await.unwrap();
    storage.store.remove(BANK_KEY).await.unwrap();

    assert_eq!(storage.store.get(BANK_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn sqlite_keys_are_independent() {
    let storage = Storage::sqlite("sqlite:file:memdb_kv_keys?mode=memory&cache=shared")
        .await
        .expect("storage");

    storage.store.put("a", "1").await.unwrap();
    storage.store.put("b", "2").await.unwrap();

    assert_eq!(storage.store.get("a").await.unwrap().as_deref(), Some("1"));
    assert_eq!(storage.store.get("b").await.unwrap().as_deref(), Some("2"));
}

#[tokio::test]
async fn sqlite_creates_missing_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.sqlite3");
    assert!(!path.exists());

    let storage = Storage::sqlite(&format!("sqlite:{}", path.display()))
        .await
        .expect("open fresh database");
    storage.store.put(BANK_KEY, "[]").await.unwrap();

    assert!(path.exists());
    assert_eq!(storage.store.get(BANK_KEY).await.unwrap().as_deref(), Some("[]"));
}
