// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Two-way synchronization of flashcards with a versioned remote repository.
//!
//! Each card is stored remotely as one markdown artifact. The [`SyncEngine`]
//! pushes local changes, pulls remote ones, and resolves concurrent edits
//! with a [`ConflictPolicy`]. The host application provides cards through
//! [`CardHost`]; [`LocalDb`] is a SQLite implementation of it.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::too_many_lines
)]

pub mod artifact;
mod card;
mod config;
mod engine;
mod error;
mod host;
mod identity;
mod localdb;
mod locks;
mod media;
mod resolver;
mod retry;
mod scheduler;
mod store;

pub use crate::artifact::ParsedArtifact;
pub use crate::card::{ARCHIVED_TAG, Card, CardId, CardPatch, Schedule, SchedulerKind, SchedulerState};
pub use crate::config::{
    APP_NAME, FilenameStrategy, RemoteDeleteAction, SyncConfig, expand_path, get_config_dir,
};
pub use crate::engine::{
    DeletionOutcome, PullReport, PushOutcome, StatusReport, SyncEngine, SyncReport, SyncState,
    digest,
};
pub use crate::error::{ArtifactError, HostError, SyncError};
pub use crate::host::{AlwaysConfirm, CardHost, ConfirmDeletion, KvStore};
pub use crate::identity::{IdentityEntry, IdentityMap, file_name, slugify, split_file_name};
pub use crate::localdb::LocalDb;
pub use crate::media::{HttpFetcher, MediaFetcher, MediaTranslator};
pub use crate::resolver::{ConflictPolicy, Resolution, resolve};
pub use crate::retry::RetryQueue;
pub use crate::scheduler::SyncScheduler;
pub use crate::store::RemoteStore;

pub use cardsync_remote::{
    AuthMethod, ContentsClient, EntryKind, RemoteConfig, RemoteEntry, RemoteError, RemoteFile,
    RemotePath, VersionToken,
};
