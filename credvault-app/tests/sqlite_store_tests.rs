#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `SqliteStore` against a temporary database file.

mod common;

use std::sync::Arc;

use credvault_app::adapters::migration::{Migrator, MigratorTrait};
use credvault_app::adapters::{SqliteStore, LATEST_SCHEMA_VERSION};
use credvault_core::error::CoreError;
use credvault_core::traits::CredentialRepository;
use credvault_core::types::{ListQuery, NewCredential};
use credvault_core::{RetryPolicy, RetryingRepository};

// ===== Helpers =====

async fn create_test_store() -> (SqliteStore, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = tmp.path().join("test.db");
    let store = SqliteStore::open(&db_path)
        .await
        .expect("failed to open SqliteStore");
    (store, tmp)
}

// ===== Contract =====

#[tokio::test]
async fn create_then_get_round_trips() {
    let (store, _tmp) = create_test_store().await;
    common::create_then_get_round_trips(&store).await;
}

#[tokio::test]
async fn duplicate_pair_conflicts() {
    let (store, _tmp) = create_test_store().await;
    common::duplicate_pair_conflicts(&store).await;
}

#[tokio::test]
async fn update_changes_only_patched_fields() {
    let (store, _tmp) = create_test_store().await;
    common::update_changes_only_patched_fields(&store).await;
}

#[tokio::test]
async fn update_onto_existing_pair_conflicts() {
    let (store, _tmp) = create_test_store().await;
    common::update_onto_existing_pair_conflicts(&store).await;
}

#[tokio::test]
async fn missing_ids_are_not_found() {
    let (store, _tmp) = create_test_store().await;
    common::missing_ids_are_not_found(&store).await;
}

#[tokio::test]
async fn second_delete_is_not_found() {
    let (store, _tmp) = create_test_store().await;
    common::second_delete_is_not_found(&store).await;
}

#[tokio::test]
async fn pages_partition_the_result() {
    let (store, _tmp) = create_test_store().await;
    common::pages_partition_the_result(&store).await;
}

#[tokio::test]
async fn list_orders_by_most_recent_update() {
    let (store, _tmp) = create_test_store().await;
    common::list_orders_by_most_recent_update(&store).await;
}

#[tokio::test]
async fn search_is_case_insensitive() {
    let (store, _tmp) = create_test_store().await;
    common::search_is_case_insensitive(&store).await;
}

#[tokio::test]
async fn stats_group_by_service() {
    let (store, _tmp) = create_test_store().await;
    common::stats_group_by_service(&store).await;
}

#[tokio::test]
async fn gmail_scenario() {
    let (store, _tmp) = create_test_store().await;
    common::gmail_scenario(&store).await;
}

// ===== SQLite specifics =====

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_duplicate_creates_yield_one_conflict() {
    let (store, _tmp) = create_test_store().await;
    let repo: Arc<dyn CredentialRepository> = Arc::new(RetryingRepository::new(
        Arc::new(store),
        RetryPolicy::default(),
    ));

    let data = common::gmail();
    let (a, b) = tokio::join!(repo.create(&data), repo.create(&data));

    let results = [a, b];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(CoreError::Conflict(_))))
        .count();
    assert_eq!((ok, conflicts), (1, 1), "{results:?}");
}

#[tokio::test]
async fn schema_version_reports_all_migrations() {
    let (store, _tmp) = create_test_store().await;
    assert_eq!(store.schema_version().await.unwrap(), LATEST_SCHEMA_VERSION);
}

#[tokio::test]
async fn reopening_keeps_data_and_schema() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("nested").join("vault.db");

    let store = SqliteStore::open(&db_path).await.unwrap();
    let created = store.create(&common::gmail()).await.unwrap();
    store.close().await.unwrap();

    let reopened = SqliteStore::open(&db_path).await.unwrap();
    assert_eq!(reopened.get_by_id(&created.id).await.unwrap(), created);
    assert_eq!(reopened.schema_version().await.unwrap(), LATEST_SCHEMA_VERSION);
}

#[tokio::test]
async fn upgrade_fills_search_columns_of_existing_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("vault.db");

    let store = SqliteStore::open(&db_path).await.unwrap();
    store
        .create(&NewCredential::new("École", "Ünïcode", "pw"))
        .await
        .unwrap();
    store.close().await.unwrap();

    // Step back to the schema without search columns, then reopen to upgrade.
    let db = sea_orm::Database::connect(format!("sqlite://{}", db_path.display()))
        .await
        .unwrap();
    Migrator::down(&db, Some(1)).await.unwrap();
    db.close().await.unwrap();

    let reopened = SqliteStore::open(&db_path).await.unwrap();
    assert_eq!(reopened.schema_version().await.unwrap(), LATEST_SCHEMA_VERSION);
    let found = reopened
        .list(&ListQuery::page(1, 50).with_search("ÉCOLE"))
        .await
        .unwrap();
    assert_eq!(found.total, 1);
}

#[tokio::test]
async fn unwritable_location_is_fatal_database_error() {
    let tmp = tempfile::tempdir().unwrap();
    // A regular file where a directory is expected.
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let result = SqliteStore::open(&blocker.join("vault.db")).await;
    let Err(err) = result else {
        panic!("expected open to fail");
    };
    assert!(matches!(err, CoreError::Database { transient: false, .. }), "got {err:?}");
}
