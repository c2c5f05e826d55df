// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use cardsync_core::{
    CardId, ConflictPolicy, FilenameStrategy, PushOutcome, SyncError, artifact,
};

use crate::common::{Harness, ScriptedRemote, artifact_text, card, card_at, test_config};

#[tokio::test]
async fn push_new_card_writes_artifact() {
    // Arrange
    let h = Harness::new().await;
    let id = h
        .add(&card_at("c1", "What is Rust?", "A language", "2026-01-01T00:00:00Z"))
        .await;

    // Act
    let outcome = h.engine.push(&id).await.unwrap();

    // Assert
    let PushOutcome::Written { path, token } = outcome else {
        panic!("expected a write, got {outcome:?}");
    };
    assert_eq!(path.as_str(), "cards/c1.md");
    assert_eq!(Some(token.clone()), h.remote.token("cards/c1.md"));

    let parsed = artifact::parse(&h.remote.get("cards/c1.md").unwrap()).unwrap();
    assert_eq!(parsed.card_id, Some(id.clone()));
    assert_eq!(parsed.question, "What is Rust?");

    let state = h.engine.state().await;
    let entry = state.identity.get(&id).unwrap();
    assert_eq!(entry.token, token);
    assert!(entry.digest.is_some());
}

#[tokio::test]
async fn push_twice_writes_once() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;

    h.engine.push(&id).await.unwrap();
    let second = h.engine.push(&id).await.unwrap();

    assert!(matches!(second, PushOutcome::Unchanged), "{second:?}");
    assert_eq!(h.remote.writes(), 1);
}

#[tokio::test]
async fn push_after_edit_replaces_artifact() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    let before = h.remote.token("cards/c1.md").unwrap();

    h.edit(&id, "Q2", "2026-02-01T00:00:00Z").await;
    let outcome = h.engine.push(&id).await.unwrap();

    assert!(matches!(outcome, PushOutcome::Written { .. }), "{outcome:?}");
    assert_ne!(h.remote.token("cards/c1.md").unwrap(), before);
    assert!(h.remote.get("cards/c1.md").unwrap().contains("**Q:** Q2"));
}

#[tokio::test]
async fn push_missing_card() {
    let h = Harness::new().await;
    let outcome = h.engine.push(&CardId::new("ghost")).await.unwrap();
    assert!(matches!(outcome, PushOutcome::Missing), "{outcome:?}");
    assert_eq!(h.remote.writes(), 0);
}

#[tokio::test]
async fn push_without_repository_is_configuration_error() {
    let config = cardsync_core::SyncConfig {
        repository: String::new(),
        ..test_config()
    };
    let h = Harness::with_config(config).await;
    let id = h.add(&card("c1", "Q", "A")).await;

    let result = h.engine.push(&id).await;

    assert!(matches!(result, Err(SyncError::ConfigurationMissing(_))));
    assert!(h.engine.state().await.retry.is_empty());
}

#[tokio::test]
async fn remote_newer_wins_without_second_write() {
    // Arrange
    let h = Harness::new().await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    let remote_token = h.remote.put(
        "cards/c1.md",
        &artifact_text("c1", "Remote Q", "Remote A", "2026-06-01T00:00:00Z"),
    );
    h.edit(&id, "Local Q", "2026-02-01T00:00:00Z").await;
    let writes = h.remote.writes();

    // Act
    let outcome = h.engine.push(&id).await.unwrap();

    // Assert
    let PushOutcome::RemoteApplied { token } = outcome else {
        panic!("expected remote to win, got {outcome:?}");
    };
    assert_eq!(token, remote_token);
    assert_eq!(h.remote.writes(), writes);

    let local = h.card(&id).await;
    assert_eq!(local.front, "Remote Q");
    assert_eq!(local.back, "Remote A");

    let again = h.engine.push(&id).await.unwrap();
    assert!(matches!(again, PushOutcome::Unchanged), "{again:?}");
}

#[tokio::test]
async fn local_newer_overwrites_remote() {
    let h = Harness::new().await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    h.remote.put(
        "cards/c1.md",
        &artifact_text("c1", "Remote Q", "Remote A", "2026-02-01T00:00:00Z"),
    );
    h.edit(&id, "Local Q", "2026-03-01T00:00:00Z").await;

    let outcome = h.engine.push(&id).await.unwrap();

    assert!(matches!(outcome, PushOutcome::Written { .. }), "{outcome:?}");
    assert!(h.remote.get("cards/c1.md").unwrap().contains("**Q:** Local Q"));
}

#[tokio::test]
async fn prefer_local_retries_with_fresh_token() {
    let config = cardsync_core::SyncConfig {
        conflict_policy: ConflictPolicy::PreferLocal,
        ..test_config()
    };
    let h = Harness::with_config(config).await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    h.remote.put(
        "cards/c1.md",
        &artifact_text("c1", "Remote Q", "Remote A", "2026-09-01T00:00:00Z"),
    );
    h.edit(&id, "Local Q", "2026-02-01T00:00:00Z").await;

    let outcome = h.engine.push(&id).await.unwrap();

    let PushOutcome::Written { token, .. } = outcome else {
        panic!("expected local to win, got {outcome:?}");
    };
    assert_eq!(Some(token), h.remote.token("cards/c1.md"));
    assert!(h.remote.get("cards/c1.md").unwrap().contains("**Q:** Local Q"));
}

#[tokio::test]
async fn local_win_with_failing_overwrite_is_queued() {
    // Arrange
    let store = Arc::new(ScriptedRemote::new());
    let h = Harness::scripted(test_config(), store.clone()).await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    let remote_text = artifact_text("c1", "Remote Q", "Remote A", "2026-02-01T00:00:00Z");
    h.remote.put("cards/c1.md", &remote_text);
    h.edit(&id, "Local Q", "2026-03-01T00:00:00Z").await;
    // the first write conflicts, the overwrite after reading is refused
    store.fail_writes_after(1);

    // Act
    let outcome = h.engine.push(&id).await.unwrap();

    // Assert
    assert!(
        matches!(outcome, PushOutcome::Queued(SyncError::Transport(_))),
        "{outcome:?}"
    );
    assert!(h.engine.state().await.retry.contains(&id));
    assert_eq!(h.engine.status().await.queued, vec![id.clone()]);
    assert_eq!(h.remote.get("cards/c1.md").unwrap(), remote_text);
}

#[tokio::test]
async fn local_win_with_conflicting_overwrite_is_queued() {
    // Arrange
    let store = Arc::new(ScriptedRemote::new());
    let h = Harness::scripted(test_config(), store.clone()).await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    h.remote.put(
        "cards/c1.md",
        &artifact_text("c1", "Remote Q", "Remote A", "2026-02-01T00:00:00Z"),
    );
    h.edit(&id, "Local Q", "2026-03-01T00:00:00Z").await;
    let third = artifact_text("c1", "Third Q", "Third A", "2026-02-15T00:00:00Z");

    // Act
    store.hold_next_read();
    let peer = async {
        store.reached().await;
        h.remote.put("cards/c1.md", &third);
        store.release();
    };
    let (outcome, ()) = tokio::join!(h.engine.push(&id), peer);

    // Assert
    let outcome = outcome.unwrap();
    assert!(
        matches!(outcome, PushOutcome::Queued(SyncError::VersionConflict(_))),
        "{outcome:?}"
    );
    assert!(h.engine.state().await.retry.contains(&id));
    assert_eq!(h.remote.get("cards/c1.md").unwrap(), third);

    // the next attempt settles against the third version
    let retried = h.engine.retry_failed().await.unwrap();
    assert!(
        matches!(retried.as_slice(), [(rid, PushOutcome::Written { .. })] if *rid == id),
        "{retried:?}"
    );
    assert!(h.engine.state().await.retry.is_empty());
}

#[tokio::test]
async fn tie_writes_one_conflict_record() {
    // Arrange
    let h = Harness::new().await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    let remote_text = artifact_text("c1", "Remote Q", "Remote A", "2026-05-01T00:00:00Z");
    h.remote.put("cards/c1.md", &remote_text);
    h.edit(&id, "Local Q", "2026-05-01T00:00:00Z").await;

    // Act
    let first = h.engine.push(&id).await.unwrap();
    let second = h.engine.push(&id).await.unwrap();

    // Assert
    let PushOutcome::Conflict { record } = first else {
        panic!("expected a conflict, got {first:?}");
    };
    assert!(record.as_str().starts_with("cards/conflicts/c1-"));
    assert!(matches!(second, PushOutcome::Conflict { record: ref r } if *r == record));

    let text = h.remote.get(record.as_str()).unwrap();
    assert!(text.contains("cardId: c1"));
    assert!(text.contains("Local Q"));
    assert!(text.contains("Remote Q"));

    let records: Vec<_> = h
        .remote
        .paths()
        .into_iter()
        .filter(|p| p.starts_with("cards/conflicts/"))
        .collect();
    assert_eq!(records.len(), 1);
    assert_eq!(h.remote.get("cards/c1.md").unwrap(), remote_text);
    assert_eq!(h.card(&id).await.front, "Local Q");
}

#[tokio::test]
async fn transport_failure_queues_and_keeps_map() {
    // Arrange
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    let before = h.engine.state().await.identity;
    h.edit(&id, "Q2", "2026-02-01T00:00:00Z").await;
    h.remote.set_offline(true);

    // Act
    let outcome = h.engine.push(&id).await.unwrap();

    // Assert
    assert!(matches!(outcome, PushOutcome::Queued(SyncError::Transport(_))), "{outcome:?}");
    let state = h.engine.state().await;
    assert!(state.retry.contains(&id));
    assert_eq!(state.identity, before);
}

#[tokio::test]
async fn retry_drains_queue_after_recovery() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.remote.set_offline(true);
    h.engine.push(&id).await.unwrap();
    assert_eq!(h.engine.state().await.retry.len(), 1);

    h.remote.set_offline(false);
    let outcomes = h.engine.retry_failed().await.unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0].1, PushOutcome::Written { .. }));
    assert!(h.engine.state().await.retry.is_empty());
    assert!(h.engine.retry_failed().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_remote_fails_without_queueing() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    h.remote.put("cards/c1.md", "not an artifact");
    h.edit(&id, "Q2", "2026-02-01T00:00:00Z").await;

    let outcome = h.engine.push(&id).await.unwrap();

    assert!(
        matches!(outcome, PushOutcome::Failed(SyncError::MalformedArtifact(_))),
        "{outcome:?}"
    );
    assert!(h.engine.state().await.retry.is_empty());
}

#[tokio::test]
async fn remote_deleted_under_stale_token_is_recreated() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    h.remote.remove("cards/c1.md");
    h.edit(&id, "Q2", "2026-02-01T00:00:00Z").await;

    let outcome = h.engine.push(&id).await.unwrap();

    assert!(matches!(outcome, PushOutcome::Written { .. }), "{outcome:?}");
    assert!(h.remote.get("cards/c1.md").unwrap().contains("**Q:** Q2"));
}

#[tokio::test]
async fn slug_file_names() {
    let config = cardsync_core::SyncConfig {
        filename_strategy: FilenameStrategy::Slug,
        ..test_config()
    };
    let h = Harness::with_config(config).await;
    let id = h.add(&card("c1", "What is Rust?", "A language")).await;

    let outcome = h.engine.push(&id).await.unwrap();

    let PushOutcome::Written { path, .. } = outcome else {
        panic!("expected a write, got {outcome:?}");
    };
    assert_eq!(path.as_str(), "cards/what-is-rust--c1.md");
    let state = h.engine.state().await;
    assert_eq!(state.identity.get(&id).unwrap().slug.as_deref(), Some("what-is-rust"));

    // the path sticks once assigned
    h.edit(&id, "Something else", "2026-02-01T00:00:00Z").await;
    let PushOutcome::Written { path: again, .. } = h.engine.push(&id).await.unwrap() else {
        panic!("expected a write");
    };
    assert_eq!(again, path);
}

#[tokio::test]
async fn push_all_skips_untracked_archived_cards() {
    let h = Harness::new().await;
    let live = h.add(&card("c1", "Q", "A")).await;
    let mut archived = card("c2", "Old", "Gone");
    archived.tags.insert(cardsync_core::ARCHIVED_TAG.to_string());
    let archived = h.add(&archived).await;

    let mut outcomes = h.engine.push_all().await.unwrap();
    outcomes.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].0, live);
    assert!(matches!(outcomes[0].1, PushOutcome::Written { .. }));
    assert_eq!(outcomes[1].0, archived);
    assert!(matches!(outcomes[1].1, PushOutcome::Skipped));
    assert!(h.remote.get("cards/c2.md").is_none());
}

#[tokio::test]
async fn inline_media_is_uploaded() {
    let h = Harness::new().await;
    let id = h
        .add(&card("c1", "Look ![dot](data:image/png;base64,AAEC)", "A"))
        .await;

    h.engine.push(&id).await.unwrap();

    let text = h.remote.get("cards/c1.md").unwrap();
    assert!(text.contains("![dot](media/"), "{text}");
    assert!(!text.contains("data:"));
    let media: Vec<_> = h
        .remote
        .paths()
        .into_iter()
        .filter(|p| p.starts_with("cards/media/") && p.ends_with(".png"))
        .collect();
    assert_eq!(media.len(), 1);
    assert!(h.card(&id).await.front.contains("data:image/png;base64,AAEC"));
}

#[tokio::test]
async fn external_media_is_fetched_and_uploaded() {
    let h = Harness::new().await;
    let id = h
        .add(&card("c1", "Q", "![pic](https://example.org/pic.jpg)"))
        .await;

    h.engine.push(&id).await.unwrap();

    let parsed = artifact::parse(&h.remote.get("cards/c1.md").unwrap()).unwrap();
    assert_eq!(parsed.media_paths.len(), 1);
    assert!(parsed.media_paths[0].ends_with(".jpg"));
}
