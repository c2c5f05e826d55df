// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Client for repositories exposed through a GitHub-style contents API.
//!
//! Files are addressed by [`RemotePath`] and versioned by [`VersionToken`];
//! every write and delete must present the token of the version it replaces.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(clippy::similar_names, clippy::single_match_else)]

mod client;
mod config;
mod error;
mod http;
mod request;
mod response;
mod types;

pub use crate::client::ContentsClient;
pub use crate::config::{AuthMethod, RemoteConfig};
pub use crate::error::RemoteError;
pub use crate::request::{DeleteRequest, WriteRequest};
pub use crate::response::{ContentsResponse, DirEntryResponse, FileResponse};
pub use crate::types::{EntryKind, RemoteEntry, RemoteFile, RemotePath, VersionToken};
