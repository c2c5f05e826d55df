// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios across two devices and restarts.

use std::sync::Arc;

use cardsync_core::{
    ConflictPolicy, PushOutcome, SchedulerKind, SchedulerState, SyncConfig, artifact,
};
use pretty_assertions::assert_eq;

use crate::common::{Harness, MemoryRemote, artifact_text, card, card_at, test_config};

#[tokio::test]
async fn fsrs_card_survives_push() {
    // Arrange
    let h = Harness::new().await;
    let mut local = card("c1", "Q?", "A");
    local.tags.insert("x".to_string());
    local.schedule.state = SchedulerState::Fsrs {
        difficulty: Some(5.6),
        stability: Some(15.2),
    };
    let id = h.add(&local).await;

    // Act
    h.engine.push(&id).await.unwrap();

    // Assert
    let text = h.remote.get("cards/c1.md").unwrap();
    assert!(text.contains("scheduler: FSRS"), "{text}");
    assert!(text.contains("difficulty: 5.6"), "{text}");
    assert!(text.contains("stability: 15.2"), "{text}");

    let parsed = artifact::parse(&text).unwrap();
    assert_eq!(parsed.schedule.state.kind(), SchedulerKind::Fsrs);
    assert_eq!(parsed.into_card(id.clone()), local);
}

#[tokio::test]
async fn stale_push_under_prefer_remote_takes_remote_fields() {
    let config = SyncConfig {
        conflict_policy: ConflictPolicy::PreferRemote,
        ..test_config()
    };
    let h = Harness::with_config(config).await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-05-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    h.remote.put(
        "cards/c1.md",
        "---\ncardId: c1\ntags:\n- theirs\nupdated: 2026-01-01T00:00:00Z\n---\n**Q:** Their Q\n\n**A:** Their A\n",
    );
    h.edit(&id, "My Q", "2026-09-01T00:00:00Z").await;
    let writes = h.remote.writes();

    let outcome = h.engine.push(&id).await.unwrap();

    assert!(matches!(outcome, PushOutcome::RemoteApplied { .. }), "{outcome:?}");
    assert_eq!(h.remote.writes(), writes);
    let local = h.card(&id).await;
    assert_eq!(local.front, "Their Q");
    assert_eq!(local.back, "Their A");
    assert_eq!(local.tags.into_iter().collect::<Vec<_>>(), vec!["theirs".to_string()]);
}

#[tokio::test]
async fn unknown_remote_card_is_created_locally() {
    let h = Harness::new().await;
    let token = h.remote.put(
        "cards/n1.md",
        "---\ncardId: n1\ntags:\n- geo\n- capitals\n---\n**Q:** Capital of France?\n\n**A:** Paris\n",
    );

    let report = h.engine.pull().await.unwrap();

    assert_eq!(report.created.len(), 1);
    let id = report.created[0].clone();
    let local = h.card(&id).await;
    assert_eq!(local.front, "Capital of France?");
    assert_eq!(local.back, "Paris");
    assert_eq!(
        local.tags.into_iter().collect::<Vec<_>>(),
        vec!["capitals".to_string(), "geo".to_string()]
    );

    let state = h.engine.state().await;
    let entry = state.identity.get(&id).unwrap();
    assert_eq!(entry.token, token);
    assert_eq!(entry.remote_path.as_str(), "cards/n1.md");
}

#[tokio::test]
async fn two_devices_converge() {
    // Arrange
    let a = Harness::new().await;
    let b = a.peer().await;
    let id = a
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;

    // Act
    a.engine.sync().await.unwrap();
    b.engine.sync().await.unwrap();
    b.edit(&id, "Edited on B", "2026-02-01T00:00:00Z").await;
    b.engine.sync().await.unwrap();
    let report = a.engine.sync().await.unwrap();

    // Assert
    assert_eq!(report.pull.updated, vec![id.clone()]);
    assert_eq!(a.card(&id).await, b.card(&id).await);
    assert!(
        report
            .push
            .iter()
            .all(|(_, o)| matches!(o, PushOutcome::Unchanged))
    );
}

#[tokio::test]
async fn pull_keeps_local_then_sync_pushes_it() {
    let a = Harness::new().await;
    let b = a.peer().await;
    let id = a
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    a.engine.sync().await.unwrap();
    b.engine.sync().await.unwrap();

    b.edit(&id, "B", "2026-02-01T00:00:00Z").await;
    b.engine.sync().await.unwrap();
    a.edit(&id, "A later", "2026-03-01T00:00:00Z").await;

    let report = a.engine.sync().await.unwrap();

    assert_eq!(report.pull.kept_local, vec![id.clone()]);
    assert!(
        remote_contains(&a.remote, "cards/c1.md", "**Q:** A later"),
        "local version should have been pushed"
    );
}

fn remote_contains(remote: &MemoryRemote, path: &str, needle: &str) -> bool {
    remote.get(path).is_some_and(|text| text.contains(needle))
}

#[tokio::test]
async fn state_survives_restart() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cardsync.db");
    let remote = Arc::new(MemoryRemote::new());
    let id = {
        let h = Harness::on_disk(&path, remote.clone()).await;
        let id = h.add(&card("c1", "Q", "A")).await;
        h.engine.push(&id).await.unwrap();
        h.engine.flush().await.unwrap();
        id
    };

    // Act
    let h = Harness::on_disk(&path, remote.clone()).await;
    let outcome = h.engine.push(&id).await.unwrap();

    // Assert
    assert!(matches!(outcome, PushOutcome::Unchanged), "{outcome:?}");
    assert_eq!(remote.writes(), 1);
    assert_eq!(h.engine.status().await.tracked, 1);
}

#[tokio::test]
async fn handwritten_artifact_round_trips_through_host() {
    let h = Harness::new().await;
    h.remote.put(
        "cards/hand.md",
        &artifact_text("hand", "Written by hand", "Yes", "2026-01-01"),
    );

    h.engine.pull().await.unwrap();
    let local = h.card(&cardsync_core::CardId::new("hand")).await;

    assert_eq!(local.front, "Written by hand");
    assert_eq!(local.updated_at, Some(crate::common::ts("2026-01-01T00:00:00Z")));
}
