// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use cardsync_core::{
    ARCHIVED_TAG, CardHost, DeletionOutcome, RemoteDeleteAction, SyncConfig, SyncError,
};

use crate::common::{Harness, card, test_config};

#[tokio::test]
async fn remote_deletion_archives_local_card() {
    // Arrange
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    h.remote.remove("cards/c1.md");

    // Act
    let report = h.engine.pull().await.unwrap();

    // Assert
    assert_eq!(report.removed, vec![(id.clone(), DeletionOutcome::Archived)]);
    assert!(h.card(&id).await.is_archived());
    assert!(h.db.list_tags().await.unwrap().contains(&ARCHIVED_TAG.to_string()));
    assert!(h.engine.state().await.identity.get(&id).is_none());

    // archived and untracked, so a full push leaves it alone
    let outcomes = h.engine.push_all().await.unwrap();
    assert!(matches!(outcomes[0].1, cardsync_core::PushOutcome::Skipped));
    assert!(h.remote.get("cards/c1.md").is_none());
}

#[tokio::test]
async fn declined_deletion_keeps_card_and_drops_entry() {
    let h = Harness::new().await.confirm(false);
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    h.remote.remove("cards/c1.md");

    let report = h.engine.pull().await.unwrap();

    assert_eq!(report.removed, vec![(id.clone(), DeletionOutcome::Declined)]);
    assert!(!h.card(&id).await.is_archived());
    assert!(h.engine.state().await.identity.get(&id).is_none());
}

#[tokio::test]
async fn confirmed_deletion_can_delete_card() {
    let config = SyncConfig {
        on_remote_delete: RemoteDeleteAction::Delete,
        ..test_config()
    };
    let h = Harness::with_config(config).await;
    let keep = h.add(&card("c1", "Q", "A")).await;
    let gone = h.add(&card("c2", "Q", "A")).await;
    h.engine.push_many([keep.clone(), gone.clone()]).await.unwrap();
    h.remote.remove("cards/c2.md");

    let report = h.engine.pull().await.unwrap();

    assert_eq!(report.removed, vec![(gone.clone(), DeletionOutcome::Deleted)]);
    assert!(h.try_card(&gone).await.is_none());
    assert!(h.try_card(&keep).await.is_some());
    assert_eq!(h.engine.state().await.identity.len(), 1);
}

#[tokio::test]
async fn keep_action_leaves_card_alone() {
    let config = SyncConfig {
        on_remote_delete: RemoteDeleteAction::Keep,
        ..test_config()
    };
    let h = Harness::with_config(config).await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    h.remote.remove("cards/c1.md");

    let report = h.engine.pull().await.unwrap();

    assert_eq!(report.removed, vec![(id.clone(), DeletionOutcome::Kept)]);
    assert_eq!(h.card(&id).await.front, "Q");
}

#[tokio::test]
async fn pull_of_another_directory_leaves_entries_alone() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();

    let other = Harness::build(
        SyncConfig {
            subdir: "elsewhere".to_string(),
            ..test_config()
        },
        h.remote.clone(),
        h.db.clone(),
    )
    .await;
    let report = other.engine.pull().await.unwrap();

    assert!(report.removed.is_empty());
    assert!(other.engine.state().await.identity.get(&id).is_some());
    assert!(!h.card(&id).await.is_archived());
}

#[tokio::test]
async fn delete_remote_removes_artifact_and_entry() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();

    h.db.delete_card(&id).await.unwrap();
    let deleted = h.engine.delete_remote(&id).await.unwrap();

    assert!(deleted);
    assert!(h.remote.get("cards/c1.md").is_none());
    assert_eq!(h.engine.status().await.tracked, 0);
    assert!(!h.engine.delete_remote(&id).await.unwrap());
}

#[tokio::test]
async fn delete_remote_with_stale_token_keeps_entry() {
    let h = Harness::new().await;
    let id = h.add(&card("c1", "Q", "A")).await;
    h.engine.push(&id).await.unwrap();
    h.remote.put("cards/c1.md", "---\ncardId: c1\n---\n**Q:** edited\n\n**A:** A\n");

    let result = h.engine.delete_remote(&id).await;

    assert!(matches!(result, Err(SyncError::VersionConflict(_))));
    assert!(h.remote.get("cards/c1.md").is_some());
    assert!(h.engine.state().await.identity.get(&id).is_some());
}
