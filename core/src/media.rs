// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Translation of media references between local and remote form.
//!
//! Locally, images are inline `data:` URIs or external URLs. Remotely, they
//! are stored as files next to the artifacts and referenced as `media/<name>`.

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cardsync_remote::{RemoteError, RemotePath};
use jiff::Timestamp;

use crate::artifact::{MEDIA_PREFIX, media_regex};
use crate::error::{HostError, SyncError};
use crate::store::RemoteStore;

/// Downloads external media.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetches the bytes behind `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SyncError>;
}

/// [`MediaFetcher`] over plain HTTP GET requests.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a new fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SyncError::Transport(RemoteError::from(e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, SyncError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SyncError::Transport(RemoteError::from(e)))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SyncError::Transport(RemoteError::from(e)))?;
        Ok(bytes.to_vec())
    }
}

/// Rewrites media references in card text.
pub struct MediaTranslator<'a> {
    store: &'a dyn RemoteStore,
    fetcher: &'a dyn MediaFetcher,
    base_dir: &'a str,
}

impl std::fmt::Debug for MediaTranslator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaTranslator")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> MediaTranslator<'a> {
    /// Creates a translator for artifacts stored under `base_dir`.
    pub fn new(store: &'a dyn RemoteStore, fetcher: &'a dyn MediaFetcher, base_dir: &'a str) -> Self {
        Self {
            store,
            fetcher,
            base_dir,
        }
    }

    /// Uploads inline and external media and rewrites them to path form.
    ///
    /// References already in path form are kept, as is any reference whose
    /// upload fails.
    pub async fn externalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for media in references(text) {
            out.push_str(text.get(last..media.start).unwrap_or_default());
            last = media.end;

            let whole = text.get(media.start..media.end).unwrap_or_default();
            if media.target.starts_with(MEDIA_PREFIX) {
                out.push_str(whole);
                continue;
            }

            match self.upload(&media.target).await {
                Ok(Some(name)) => out.push_str(&format!("![{}]({name})", media.alt)),
                Ok(None) => out.push_str(whole),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to upload media, keeping reference");
                    out.push_str(whole);
                }
            }
        }
        out.push_str(text.get(last..).unwrap_or_default());
        out
    }

    /// Downloads path-form media and rewrites it to inline `data:` URIs.
    ///
    /// References that cannot be downloaded stay in path form.
    pub async fn internalize(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for media in references(text) {
            out.push_str(text.get(last..media.start).unwrap_or_default());
            last = media.end;

            let whole = text.get(media.start..media.end).unwrap_or_default();
            if !media.target.starts_with(MEDIA_PREFIX) {
                out.push_str(whole);
                continue;
            }

            let path = RemotePath::join(self.base_dir, &media.target);
            match self.store.read_binary(&path).await {
                Ok((bytes, _)) => {
                    let mime = mime_from_name(&media.target);
                    let data = STANDARD.encode(bytes);
                    out.push_str(&format!("![{}](data:{mime};base64,{data})", media.alt));
                }
                Err(e) => {
                    tracing::warn!(%path, error = %e, "failed to download media, keeping path");
                    out.push_str(whole);
                }
            }
        }
        out.push_str(text.get(last..).unwrap_or_default());
        out
    }

    /// Uploads one reference, returning its path-form target. `Ok(None)`
    /// means the target is not something we can upload.
    async fn upload(&self, target: &str) -> Result<Option<String>, SyncError> {
        let (bytes, ext) = if let Some(uri) = target.strip_prefix("data:") {
            let (mime, bytes) = decode_data_uri(uri)?;
            (bytes, ext_from_mime(&mime).to_string())
        } else if target.starts_with("http://") || target.starts_with("https://") {
            let bytes = self.fetcher.fetch(target).await?;
            (bytes, ext_from_url(target))
        } else {
            return Ok(None);
        };

        let name = media_name(&ext);
        let path = RemotePath::join(self.base_dir, &name);
        self.store.write_binary(&path, &bytes, None).await?;
        tracing::debug!(%path, len = bytes.len(), "media uploaded");
        Ok(Some(name))
    }
}

/// A media reference located in a text.
struct Reference {
    start: usize,
    end: usize,
    alt: String,
    target: String,
}

fn references(text: &str) -> Vec<Reference> {
    media_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Reference {
                start: whole.start(),
                end: whole.end(),
                alt: caps.get(1)?.as_str().to_string(),
                target: caps.get(2)?.as_str().to_string(),
            })
        })
        .collect()
}

/// `media/<millis>_<uuid8><ext>`
fn media_name(ext: &str) -> String {
    let millis = Timestamp::now().as_millisecond();
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    let short = uuid.get(..8).unwrap_or(&uuid);
    format!("{MEDIA_PREFIX}{millis}_{short}{ext}")
}

/// Decodes the part of a data URI after `data:` into mime type and bytes.
fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), SyncError> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| HostError::new("data URI without payload"))?;
    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let mime = mime.split(';').next().unwrap_or_default();
    let mime = if mime.is_empty() { "text/plain" } else { mime };

    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| HostError::new(format!("invalid data URI: {e}")))?
    } else {
        urlencoding::decode_binary(payload.as_bytes()).into_owned()
    };
    Ok((mime.to_string(), bytes))
}

fn ext_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5)
        .map_or_else(|| ".png".to_string(), |e| format!(".{}", e.to_lowercase()))
}

fn ext_from_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "image/svg+xml" => ".svg",
        "image/bmp" => ".bmp",
        "application/pdf" => ".pdf",
        _ => ".png",
    }
}

fn mime_from_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
