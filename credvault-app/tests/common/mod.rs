//! Repository contract checks shared by the `SQLite` and Postgres suites.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashSet;

use credvault_core::error::CoreError;
use credvault_core::traits::CredentialRepository;
use credvault_core::types::{CredentialPatch, ListQuery, NewCredential};

pub fn gmail() -> NewCredential {
    NewCredential::new("Gmail", "a@x.com", "p1")
}

pub async fn create_then_get_round_trips(repo: &dyn CredentialRepository) {
    let input = gmail()
        .with_url("https://mail.google.com")
        .with_notes("personal");
    let created = repo.create(&input).await.unwrap();

    assert_eq!(created.service, "Gmail");
    assert_eq!(created.secret, "p1");
    assert_eq!(created.created_at, created.updated_at);

    let fetched = repo.get_by_id(&created.id).await.unwrap();
    assert_eq!(fetched, created);
}

pub async fn duplicate_pair_conflicts(repo: &dyn CredentialRepository) {
    repo.create(&gmail()).await.unwrap();
    let err = repo.create(&gmail()).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)), "got {err:?}");

    // Same service, other user is fine.
    repo.create(&NewCredential::new("Gmail", "b@x.com", "p1"))
        .await
        .unwrap();
}

pub async fn update_changes_only_patched_fields(repo: &dyn CredentialRepository) {
    let created = repo.create(&gmail().with_notes("keep me")).await.unwrap();

    let updated = repo
        .update(&created.id, &CredentialPatch::secret("p2"))
        .await
        .unwrap();
    assert_eq!(updated.secret, "p2");
    assert_eq!(updated.service, created.service);
    assert_eq!(updated.username, created.username);
    assert_eq!(updated.notes, created.notes);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    let again = repo
        .update(
            &created.id,
            &CredentialPatch {
                notes: Some(None),
                ..CredentialPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(again.notes.is_none());
    assert!(again.updated_at > updated.updated_at);

    assert_eq!(repo.get_by_id(&created.id).await.unwrap(), again);
}

pub async fn update_onto_existing_pair_conflicts(repo: &dyn CredentialRepository) {
    repo.create(&gmail()).await.unwrap();
    let other = repo
        .create(&NewCredential::new("Gmail", "b@x.com", "p1"))
        .await
        .unwrap();

    let err = repo
        .update(
            &other.id,
            &CredentialPatch {
                username: Some("a@x.com".to_string()),
                ..CredentialPatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)), "got {err:?}");

    // The failed update left the record untouched.
    assert_eq!(repo.get_by_id(&other.id).await.unwrap(), other);
}

pub async fn missing_ids_are_not_found(repo: &dyn CredentialRepository) {
    let id = "00000000-0000-4000-8000-000000000000";
    assert!(matches!(repo.get_by_id(id).await, Err(CoreError::NotFound(_))));
    assert!(matches!(
        repo.update(id, &CredentialPatch::secret("x")).await,
        Err(CoreError::NotFound(_))
    ));
    assert!(matches!(repo.delete(id).await, Err(CoreError::NotFound(_))));
}

pub async fn second_delete_is_not_found(repo: &dyn CredentialRepository) {
    let created = repo.create(&gmail()).await.unwrap();
    repo.delete(&created.id).await.unwrap();
    let err = repo.delete(&created.id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)), "got {err:?}");
}

pub async fn pages_partition_the_result(repo: &dyn CredentialRepository) {
    for i in 0..5 {
        repo.create(&NewCredential::new(format!("service-{i}"), "user", "pw"))
            .await
            .unwrap();
    }

    let mut seen = HashSet::new();
    for (page, expected, has_more) in [(1, 2, true), (2, 2, true), (3, 1, false)] {
        let result = repo.list(&ListQuery::page(page, 2)).await.unwrap();
        assert_eq!(result.total, 5);
        assert_eq!(result.items.len(), expected, "page {page}");
        assert_eq!(result.has_more, has_more, "page {page}");
        for item in result.items {
            assert!(seen.insert(item.id), "record repeated across pages");
        }
    }
    assert_eq!(seen.len(), 5);
}

pub async fn list_orders_by_most_recent_update(repo: &dyn CredentialRepository) {
    let first = repo
        .create(&NewCredential::new("Alpha", "u", "pw"))
        .await
        .unwrap();
    repo.create(&NewCredential::new("Beta", "u", "pw"))
        .await
        .unwrap();
    repo.update(&first.id, &CredentialPatch::secret("pw2"))
        .await
        .unwrap();

    let result = repo.list(&ListQuery::page(1, 10)).await.unwrap();
    assert_eq!(result.items[0].id, first.id);
}

pub async fn search_is_case_insensitive(repo: &dyn CredentialRepository) {
    repo.create(&gmail()).await.unwrap();
    repo.create(&NewCredential::new("Bank", "gmail-fan", "pw"))
        .await
        .unwrap();
    repo.create(&NewCredential::new("Bank", "other", "pw"))
        .await
        .unwrap();

    let result = repo
        .list(&ListQuery::page(1, 50).with_search("GMAIL"))
        .await
        .unwrap();
    assert_eq!(result.total, 2);

    let literal = repo
        .list(&ListQuery::page(1, 50).with_search("%"))
        .await
        .unwrap();
    assert_eq!(literal.total, 0);

    // Folding covers non-ASCII letters on every backend.
    repo.create(&NewCredential::new("École", "Ünïcode", "pw"))
        .await
        .unwrap();
    for term in ["école", "ÜNÏCODE"] {
        let result = repo
            .list(&ListQuery::page(1, 50).with_search(term))
            .await
            .unwrap();
        assert_eq!(result.total, 1, "search {term:?}");
        assert_eq!(result.items[0].service, "École");
    }
}

pub async fn stats_group_by_service(repo: &dyn CredentialRepository) {
    repo.create(&NewCredential::new("Gmail", "a", "pw")).await.unwrap();
    repo.create(&NewCredential::new("Gmail", "b", "pw")).await.unwrap();
    repo.create(&NewCredential::new("Bank", "a", "pw")).await.unwrap();
    repo.create(&NewCredential::new("Azure", "a", "pw")).await.unwrap();

    let stats = repo.stats(7).await.unwrap();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.recent_count, 4);
    assert_eq!(stats.window_days, 7);

    let unbounded = repo.stats(u32::MAX).await.unwrap();
    assert_eq!(unbounded.recent_count, 4);

    let order: Vec<(&str, u64)> = stats
        .per_service
        .iter()
        .map(|s| (s.service.as_str(), s.count))
        .collect();
    assert_eq!(order, [("Gmail", 2), ("Azure", 1), ("Bank", 1)]);
}

/// create → update secret → list → delete → get.
pub async fn gmail_scenario(repo: &dyn CredentialRepository) {
    let created = repo.create(&gmail()).await.unwrap();
    repo.update(&created.id, &CredentialPatch::secret("p2"))
        .await
        .unwrap();

    let listed = repo
        .list(&ListQuery::page(1, 50).with_search("gmail"))
        .await
        .unwrap();
    assert_eq!(listed.items.len(), 1);
    assert_eq!(listed.items[0].secret, "p2");

    repo.delete(&created.id).await.unwrap();
    assert!(matches!(
        repo.get_by_id(&created.id).await,
        Err(CoreError::NotFound(_))
    ));
}
