// SPDX-FileCopyrightText: 2026 sqlsession Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavioural tests for the SQLite session store, driven through the
//! `SessionEngine` trait the host framework uses.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use sqlsession_config::StorageConfig;
use sqlsession_core::{SessionEngine, StoreError};
use sqlsession_sqlite::SqliteSessionStore;
use tempfile::TempDir;

async fn open_store() -> (SqliteSessionStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");
    let store = SqliteSessionStore::open(path.to_str().unwrap())
        .await
        .unwrap();
    (store, dir)
}

fn row_count(path: &std::path::Path) -> i64 {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
        .unwrap()
}

#[tokio::test]
async fn init_on_fresh_file_then_again_keeps_table_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");

    let first = SqliteSessionStore::open(path.to_str().unwrap())
        .await
        .unwrap();
    first.create_session("s").await.unwrap();
    first.write_key("s", "k", json!("v")).await.unwrap();
    first.close().await.unwrap();

    // A second store against the same file only re-checks the table.
    let second = SqliteSessionStore::open(path.to_str().unwrap())
        .await
        .unwrap();
    second.init().await.unwrap();
    assert!(second.session_exists("s").await.unwrap());
    assert_eq!(second.read_key("s", "k").await.unwrap(), Some(json!("v")));
    second.close().await.unwrap();

    assert_eq!(row_count(&path), 1);
}

#[tokio::test]
async fn init_recreates_table_dropped_out_of_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");
    let store = SqliteSessionStore::open(path.to_str().unwrap())
        .await
        .unwrap();
    store.close().await.unwrap();

    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("DROP TABLE sessions;")
        .unwrap();

    store.init().await.unwrap();
    store.create_session("s").await.unwrap();
    assert!(store.session_exists("s").await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_init_on_fresh_file_succeeds_for_both_stores() {
    for round in 0..20 {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("race-{round}.db"));
        let a = SqliteSessionStore::new(StorageConfig::with_path(path.to_str().unwrap()));
        let b = SqliteSessionStore::new(StorageConfig::with_path(path.to_str().unwrap()));

        let (ra, rb) = tokio::join!(a.init(), b.init());
        ra.unwrap_or_else(|e| panic!("round {round}: first init failed: {e:?}"));
        rb.unwrap_or_else(|e| panic!("round {round}: second init failed: {e:?}"));

        a.create_session("s").await.unwrap();
        assert!(b.session_exists("s").await.unwrap());
        a.close().await.unwrap();
        b.close().await.unwrap();
    }
}

#[tokio::test]
async fn init_on_unreachable_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, "x").unwrap();

    let store = SqliteSessionStore::new(StorageConfig::with_path(
        blocker.join("sessions.db").to_str().unwrap(),
    ));
    let err = store.init().await.unwrap_err();
    assert!(matches!(err, StoreError::Initialization { .. }), "got {err:?}");
    assert!(!store.is_initialized());
}

#[tokio::test]
async fn created_session_exists_with_no_keys() {
    let (store, _dir) = open_store().await;
    store.create_session("s").await.unwrap();

    assert!(store.session_exists("s").await.unwrap());
    for key in ["", "k", "user", "nested.path"] {
        assert_eq!(store.read_key("s", key).await.unwrap(), None);
    }
}

#[tokio::test]
async fn written_value_reads_back() {
    let (store, _dir) = open_store().await;
    store.create_session("s").await.unwrap();
    store.write_key("s", "k", json!("v")).await.unwrap();
    assert_eq!(store.read_key("s", "k").await.unwrap(), Some(json!("v")));
}

#[tokio::test]
async fn last_write_wins() {
    let (store, _dir) = open_store().await;
    store.create_session("s").await.unwrap();
    store.write_key("s", "k", json!("v1")).await.unwrap();
    store.write_key("s", "k", json!("v2")).await.unwrap();
    assert_eq!(store.read_key("s", "k").await.unwrap(), Some(json!("v2")));
}

#[tokio::test]
async fn deleted_key_reads_absent_and_repeat_delete_is_noop() {
    let (store, _dir) = open_store().await;
    store.create_session("s").await.unwrap();
    store.write_key("s", "k", json!(1)).await.unwrap();

    store.delete_key("s", "k").await.unwrap();
    assert_eq!(store.read_key("s", "k").await.unwrap(), None);

    store.delete_key("s", "k").await.unwrap();
    store.delete_key("s", "never-set").await.unwrap();
    assert!(store.session_exists("s").await.unwrap());
}

#[tokio::test]
async fn destroyed_session_is_gone_and_key_ops_are_noops() {
    let (store, _dir) = open_store().await;
    store.create_session("s").await.unwrap();
    store.write_key("s", "k", json!("v")).await.unwrap();

    store.destroy_session("s").await.unwrap();
    assert!(!store.session_exists("s").await.unwrap());

    assert_eq!(store.read_key("s", "k").await.unwrap(), None);
    store.write_key("s", "k", json!("again")).await.unwrap();
    store.delete_key("s", "k").await.unwrap();
    assert!(!store.session_exists("s").await.unwrap());
    assert_eq!(store.read_all("s").await.unwrap(), None);
}

#[tokio::test]
async fn destroy_all_removes_every_session() {
    let (store, _dir) = open_store().await;
    let ids: Vec<String> = (0..10).map(|i| format!("sess-{i}")).collect();
    for id in &ids {
        store.create_session(id).await.unwrap();
        store.write_key(id, "i", json!(id)).await.unwrap();
    }

    store.destroy_all_sessions().await.unwrap();

    for id in &ids {
        assert!(!store.session_exists(id).await.unwrap());
    }
    assert!(store.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn key_ops_on_never_created_session_are_safe() {
    let (store, _dir) = open_store().await;
    assert_eq!(store.read_key("never", "k").await.unwrap(), None);
    store.write_key("never", "k", json!("v")).await.unwrap();
    store.delete_key("never", "k").await.unwrap();
    assert!(!store.session_exists("never").await.unwrap());
}

#[tokio::test]
async fn double_create_reports_conflict() {
    let (store, _dir) = open_store().await;
    store.create_session("s").await.unwrap();
    store.write_key("s", "k", json!("kept")).await.unwrap();

    let err = store.create_session("s").await.unwrap_err();
    assert!(matches!(err, StoreError::SessionConflict { .. }), "got {err:?}");
    // The existing state is untouched.
    assert_eq!(store.read_key("s", "k").await.unwrap(), Some(json!("kept")));
}

#[tokio::test]
async fn malformed_blob_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");
    let store = SqliteSessionStore::open(path.to_str().unwrap())
        .await
        .unwrap();
    store.create_session("s").await.unwrap();

    rusqlite::Connection::open(&path)
        .unwrap()
        .execute(
            "UPDATE sessions SET dataSerialized = '[\"not\",\"an\",\"object\"]'",
            [],
        )
        .unwrap();

    let err = store.read_key("s", "k").await.unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }), "got {err:?}");
    assert!(err.is_data_error());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_to_one_session_lose_nothing() {
    let (store, _dir) = open_store().await;
    let store = Arc::new(store);
    store.create_session("shared").await.unwrap();

    let mut handles = Vec::new();
    for worker in 0..4 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..25 {
                store
                    .write_key("shared", &format!("w{worker}-{i}"), json!(i))
                    .await
                    .unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let data = store.read_all("shared").await.unwrap().unwrap();
    assert_eq!(data.len(), 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_writes_from_two_handles_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");
    let a = Arc::new(
        SqliteSessionStore::open(path.to_str().unwrap())
            .await
            .unwrap(),
    );
    let b = Arc::new(
        SqliteSessionStore::open(path.to_str().unwrap())
            .await
            .unwrap(),
    );
    a.create_session("shared").await.unwrap();

    let writer = |store: Arc<SqliteSessionStore>, prefix: &'static str| {
        tokio::spawn(async move {
            for i in 0..20 {
                store
                    .write_key("shared", &format!("{prefix}{i}"), json!(i))
                    .await
                    .unwrap();
            }
        })
    };
    let (ra, rb) = tokio::join!(writer(Arc::clone(&a), "a"), writer(Arc::clone(&b), "b"));
    ra.unwrap();
    rb.unwrap();

    let data = a.read_all("shared").await.unwrap().unwrap();
    assert_eq!(data.len(), 40);
}

#[tokio::test]
async fn operations_after_close_report_not_initialized() {
    let (store, _dir) = open_store().await;
    store.create_session("s").await.unwrap();
    store.close().await.unwrap();

    assert!(matches!(
        store.session_exists("s").await,
        Err(StoreError::NotInitialized)
    ));
    assert!(matches!(
        store.create_session("t").await,
        Err(StoreError::NotInitialized)
    ));
    assert!(matches!(
        store.destroy_all_sessions().await,
        Err(StoreError::NotInitialized)
    ));
}

const KNOWN: &[&str] = &["alpha", "beta", "gamma"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn never_created_ids_do_not_exist(id in "[A-Za-z0-9_-]{1,32}") {
        prop_assume!(!KNOWN.contains(&id.as_str()));

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let (store, _dir) = open_store().await;
            for known in KNOWN {
                store.create_session(known).await.unwrap();
            }
            assert!(!store.session_exists(&id).await.unwrap());
            assert_eq!(store.read_key(&id, "k").await.unwrap(), None);
            store.close().await.unwrap();
        });
    }
}
