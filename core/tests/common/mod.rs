// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities for integration tests.
//!
//! This module provides shared test infrastructure including:
//! - An in-memory remote store with version tokens
//! - A wrapper around it that holds, fails or times requests
//! - Engine fixtures backed by an in-memory SQLite host

mod fixtures;

#[allow(unused_imports)]
pub use fixtures::{
    Harness, StaticFetcher, artifact_text, card, card_at, test_config, ts,
};
#[allow(unused_imports)]
pub use memory::MemoryRemote;
#[allow(unused_imports)]
pub use scripted::ScriptedRemote;
