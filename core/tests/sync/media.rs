// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! External media fetched over HTTP.

use cardsync_core::{HttpFetcher, MediaTranslator};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::MemoryRemote;

#[tokio::test]
async fn external_image_is_uploaded_and_rewritten() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/diagram.svg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"<svg/>".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let remote = MemoryRemote::new();
    let fetcher = HttpFetcher::new().unwrap();
    let translator = MediaTranslator::new(&remote, &fetcher, "cards");
    let text = format!("See ![diagram]({}/img/diagram.svg)", server.uri());

    let out = translator.externalize(&text).await;

    assert!(out.starts_with("See ![diagram](media/"), "{out}");
    assert!(out.ends_with(".svg)"), "{out}");
    let uploaded: Vec<_> = remote
        .paths()
        .into_iter()
        .filter(|p| p.starts_with("cards/media/"))
        .collect();
    assert_eq!(uploaded.len(), 1);
    assert_eq!(remote.get(&uploaded[0]).as_deref(), Some("<svg/>"));
}

#[tokio::test]
async fn failed_download_leaves_reference_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let remote = MemoryRemote::new();
    let fetcher = HttpFetcher::new().unwrap();
    let translator = MediaTranslator::new(&remote, &fetcher, "cards");
    let text = format!("![gone]({}/missing.png)", server.uri());

    let out = translator.externalize(&text).await;

    assert_eq!(out, text);
    assert!(remote.paths().is_empty());
}
