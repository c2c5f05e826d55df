// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use cardsync_core::{CardId, PushOutcome, SyncConfig};
use pretty_assertions::assert_eq;

use crate::common::{Harness, ScriptedRemote, artifact_text, card_at, test_config};

/// Long enough for an unblocked push against the in-memory store to finish.
const WAIT: Duration = Duration::from_millis(200);

async fn scripted() -> (Arc<ScriptedRemote>, Harness) {
    let store = Arc::new(ScriptedRemote::new());
    let h = Harness::scripted(test_config(), store.clone()).await;
    (store, h)
}

#[tokio::test]
async fn push_waits_while_pull_reads_same_card() {
    // Arrange
    let (store, h) = scripted().await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    h.remote.put(
        "cards/c1.md",
        &artifact_text("c1", "Remote Q", "Remote A", "2026-02-01T00:00:00Z"),
    );
    h.edit(&id, "Local Q", "2026-03-01T00:00:00Z").await;

    // Act
    store.hold_next_read();
    let racer = async {
        store.reached().await;
        let push = tokio::time::timeout(WAIT, h.engine.push(&id)).await;
        store.release();
        push.is_err()
    };
    let (report, push_blocked) = tokio::join!(h.engine.pull(), racer);

    // Assert
    assert!(push_blocked, "push ran while the pull was reading the card");
    let report = report.unwrap();
    assert_eq!(report.kept_local, vec![id.clone()]);

    let outcome = h.engine.push(&id).await.unwrap();
    let PushOutcome::Written { token, .. } = outcome else {
        panic!("expected the local version to be written, got {outcome:?}");
    };
    assert_eq!(Some(token.clone()), h.remote.token("cards/c1.md"));
    assert_eq!(h.engine.state().await.identity.get(&id).unwrap().token, token);
    assert!(h.remote.get("cards/c1.md").unwrap().contains("**Q:** Local Q"));
}

#[tokio::test]
async fn pull_keeps_token_of_push_finished_after_listing() {
    // Arrange
    let (store, h) = scripted().await;
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&id).await.unwrap();
    h.edit(&id, "Local Q", "2026-03-01T00:00:00Z").await;

    // Act
    store.hold_next_list();
    let racer = async {
        store.reached().await;
        let outcome = h.engine.push(&id).await.unwrap();
        store.release();
        outcome
    };
    let (report, pushed) = tokio::join!(h.engine.pull(), racer);

    // Assert
    assert!(matches!(pushed, PushOutcome::Written { .. }), "{pushed:?}");
    let report = report.unwrap();
    assert_eq!(report.unchanged, 1);
    assert!(report.updated.is_empty());
    assert!(report.kept_local.is_empty());
    assert!(report.conflicts.is_empty());

    let state = h.engine.state().await;
    assert_eq!(
        Some(state.identity.get(&id).unwrap().token.clone()),
        h.remote.token("cards/c1.md")
    );
    assert_eq!(h.card(&id).await.front, "Local Q");
}

#[tokio::test]
async fn card_pushed_during_pull_is_not_treated_as_deleted() {
    // Arrange
    let (store, h) = scripted().await;
    let old = h
        .add(&card_at("c0", "Old", "A", "2026-01-01T00:00:00Z"))
        .await;
    h.engine.push(&old).await.unwrap();
    let new = h
        .add(&card_at("c1", "New", "A", "2026-01-02T00:00:00Z"))
        .await;

    // Act
    store.hold_next_list();
    let racer = async {
        store.reached().await;
        let outcome = h.engine.push(&new).await.unwrap();
        store.release();
        outcome
    };
    let (report, pushed) = tokio::join!(h.engine.pull(), racer);

    // Assert
    assert!(matches!(pushed, PushOutcome::Written { .. }), "{pushed:?}");
    let report = report.unwrap();
    assert!(report.removed.is_empty(), "{:?}", report.removed);
    assert!(!h.card(&new).await.is_archived());
    assert!(h.engine.state().await.identity.get(&new).is_some());
}

#[tokio::test]
async fn pushes_of_same_card_never_overlap() {
    let (store, h) = scripted().await;
    store.slow_writes(Duration::from_millis(50));
    let id = h
        .add(&card_at("c1", "Q", "A", "2026-01-01T00:00:00Z"))
        .await;

    let (a, b) = tokio::join!(h.engine.push(&id), h.engine.push(&id));

    assert_eq!(store.overlaps(), 0);
    assert_eq!(h.remote.writes(), 1);
    let outcomes = [a.unwrap(), b.unwrap()];
    assert!(
        outcomes
            .iter()
            .any(|o| matches!(o, PushOutcome::Written { .. })),
        "{outcomes:?}"
    );
    assert!(
        outcomes.iter().any(|o| matches!(o, PushOutcome::Unchanged)),
        "{outcomes:?}"
    );
}

#[tokio::test]
async fn pushes_of_different_cards_run_up_to_workers() {
    let store = Arc::new(ScriptedRemote::new());
    let config = SyncConfig {
        workers: 3,
        ..test_config()
    };
    let h = Harness::scripted(config, store.clone()).await;
    store.slow_writes(Duration::from_millis(100));
    let mut ids = Vec::new();
    for n in 0..6 {
        let id = format!("c{n}");
        ids.push(h.add(&card_at(&id, &id, "A", "2026-01-01T00:00:00Z")).await);
    }

    let outcomes = h.engine.push_many(ids.clone()).await.unwrap();

    assert_eq!(store.max_in_flight(), 3);
    assert_eq!(outcomes.len(), 6);
    assert!(
        outcomes
            .iter()
            .all(|(_, o)| matches!(o, PushOutcome::Written { .. })),
        "{outcomes:?}"
    );
    let mut pushed: Vec<CardId> = outcomes.into_iter().map(|(id, _)| id).collect();
    pushed.sort();
    assert_eq!(pushed, ids);
}
