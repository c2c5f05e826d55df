// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use cardsync_core::{SyncConfig, SyncError, SyncScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::common::{Harness, card, test_config};

fn quiet_config(debounce_secs: u64) -> SyncConfig {
    SyncConfig {
        auto_pull: false,
        debounce_secs,
        ..test_config()
    }
}

#[tokio::test]
async fn changes_are_pushed_after_debounce() {
    // Arrange
    let h = Harness::with_config(quiet_config(0)).await;
    let id = h.add(&card("c1", "Q", "A")).await;
    let remote = h.remote.clone();
    let scheduler = SyncScheduler::new(Arc::new(h.engine));
    let (changes_tx, changes_rx) = mpsc::channel(8);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        scheduler
            .run(changes_rx, async {
                let _ = stop_rx.await;
            })
            .await
    });

    // Act
    changes_tx.send(id.clone()).await.unwrap();
    changes_tx.send(id.clone()).await.unwrap();
    let mut pushed = false;
    for _ in 0..200 {
        if remote.get("cards/c1.md").is_some() {
            pushed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    stop_tx.send(()).unwrap();

    // Assert
    assert!(pushed, "card was not pushed");
    task.await.unwrap().unwrap();
    assert_eq!(remote.writes(), 1);
}

#[tokio::test]
async fn pending_changes_are_pushed_on_shutdown() {
    let h = Harness::with_config(quiet_config(3600)).await;
    let id = h.add(&card("c1", "Q", "A")).await;
    let remote = h.remote.clone();
    let scheduler = SyncScheduler::new(Arc::new(h.engine));
    let (changes_tx, changes_rx) = mpsc::channel(8);
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        scheduler
            .run(changes_rx, async {
                let _ = stop_rx.await;
            })
            .await
    });

    changes_tx.send(id).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(remote.get("cards/c1.md").is_none());

    stop_tx.send(()).unwrap();
    task.await.unwrap().unwrap();

    assert!(remote.get("cards/c1.md").is_some());
}

#[tokio::test]
async fn scheduler_refuses_to_start_without_configuration() {
    let config = SyncConfig {
        auth: cardsync_core::AuthMethod::None,
        ..quiet_config(0)
    };
    let h = Harness::with_config(config).await;
    let scheduler = SyncScheduler::new(Arc::new(h.engine));
    let (_changes_tx, changes_rx) = mpsc::channel(1);

    let result = scheduler.run(changes_rx, std::future::pending::<()>()).await;

    assert!(matches!(result, Err(SyncError::ConfigurationMissing(_))));
}
