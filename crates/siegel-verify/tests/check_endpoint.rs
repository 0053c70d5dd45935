// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end tests: the verification client talking to the reference check
// service over real TCP, backed by an in-memory record store.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use siegel_canon::{digest_bytes, fingerprint_document};
use siegel_core::SiegelError;
use siegel_core::types::{Document, Fingerprint, MediaType, ServerStatus, Verdict};
use siegel_verify::wire::HashSubmission;
use siegel_verify::{CheckServer, HashStore, VerificationClient, VerificationService};

fn fp(seed: &str) -> Fingerprint {
    digest_bytes(seed.as_bytes())
}

fn submission(name: &str, fingerprint: &Fingerprint) -> HashSubmission {
    HashSubmission {
        file_name: name.into(),
        file_hash: fingerprint.to_string(),
    }
}

/// Start a server on an OS-assigned port over the given store.
async fn start_server(store: HashStore) -> (CheckServer, String) {
    let service = Arc::new(Mutex::new(VerificationService::new(store)));
    let mut server = CheckServer::new(Some(0));
    server.start(service).await.expect("server start");
    let addr = server.local_addr().expect("bound address");
    let endpoint = format!("http://127.0.0.1:{}", addr.port());
    (server, endpoint)
}

fn client(endpoint: &str) -> VerificationClient {
    VerificationClient::new(endpoint, Duration::from_secs(5)).expect("client setup")
}

#[tokio::test]
async fn full_check_round_trip() {
    let store = HashStore::open_in_memory().expect("store");
    store.record("report.html", &fp("v1")).expect("record v1");
    store.record("report.html", &fp("v2")).expect("record v2");
    let (mut server, endpoint) = start_server(store).await;

    let verdicts = client(&endpoint)
        .check_hashes(&[
            submission("report.html", &fp("v2")),
            submission("report.html.older", &fp("v1")),
        ])
        .await
        .expect("check");

    assert_eq!(verdicts["report.html"], Verdict::AuthenticAndCurrent);
    assert_eq!(verdicts["report.html.older"], Verdict::Unverified);

    let verdicts = client(&endpoint)
        .check_hashes(&[
            submission("report.html", &fp("v1")),
            submission("report.html", &fp("tampered")),
        ])
        .await
        .expect("check");

    // the service saw both submissions; the later one owns the map slot
    assert_eq!(verdicts["report.html"], Verdict::NotAuthentic);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn superseded_fingerprint_is_outdated_but_authentic() {
    let store = HashStore::open_in_memory().expect("store");
    store.record("report.html", &fp("v1")).expect("record v1");
    store.record("report.html", &fp("v2")).expect("record v2");
    let (mut server, endpoint) = start_server(store).await;

    let verdicts = client(&endpoint)
        .check_hashes(&[submission("report.html", &fp("v1"))])
        .await
        .expect("check");

    assert_eq!(verdicts["report.html"], Verdict::AuthenticNotCurrent);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn revoked_records_never_vouch() {
    let store = HashStore::open_in_memory().expect("store");
    store.record("leaked.html", &fp("v1")).expect("record");
    store.revoke("leaked.html", None).expect("revoke");
    let (mut server, endpoint) = start_server(store).await;

    let verdicts = client(&endpoint)
        .check_hashes(&[submission("leaked.html", &fp("v1"))])
        .await
        .expect("check");

    assert_eq!(verdicts["leaked.html"], Verdict::NotAuthentic);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn document_pipeline_end_to_end() {
    let html = "<body><div class=\"tuf-authenticate\"><p>quarterly numbers</p></div></body>";
    let document = Document::new("q3.html", MediaType::Markup, html.as_bytes().to_vec());
    let fingerprint = fingerprint_document(&document)
        .expect("pipeline")
        .expect("marked region");

    let store = HashStore::open_in_memory().expect("store");
    store.record("q3.html", &fingerprint).expect("record");
    let (mut server, endpoint) = start_server(store).await;

    let verdicts = client(&endpoint)
        .verify(std::slice::from_ref(&document))
        .await
        .expect("verify");
    assert_eq!(verdicts["q3.html"], Verdict::AuthenticAndCurrent);

    // the same page with its content edited must stop verifying
    let tampered = Document::new(
        "q3.html",
        MediaType::Markup,
        html.replace("quarterly", "fabricated").into_bytes(),
    );
    let verdicts = client(&endpoint)
        .verify(std::slice::from_ref(&tampered))
        .await
        .expect("verify");
    assert_eq!(verdicts["q3.html"], Verdict::NotAuthentic);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn non_post_methods_are_rejected() {
    let store = HashStore::open_in_memory().expect("store");
    let (mut server, endpoint) = start_server(store).await;

    let response = reqwest::get(format!("{endpoint}/_api/check-hashes"))
        .await
        .expect("request");
    assert_eq!(response.status(), 405);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn unknown_paths_are_rejected() {
    let store = HashStore::open_in_memory().expect("store");
    let (mut server, endpoint) = start_server(store).await;

    let response = reqwest::Client::new()
        .post(format!("{endpoint}/_api/other"))
        .body("[]")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let store = HashStore::open_in_memory().expect("store");
    let (mut server, endpoint) = start_server(store).await;

    let response = reqwest::Client::new()
        .post(format!("{endpoint}/_api/check-hashes"))
        .body("this is not json")
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn single_submission_object_is_accepted() {
    let store = HashStore::open_in_memory().expect("store");
    store.record("solo.html", &fp("v1")).expect("record");
    let (mut server, endpoint) = start_server(store).await;

    let response = reqwest::Client::new()
        .post(format!("{endpoint}/_api/check-hashes"))
        .json(&submission("solo.html", &fp("v1")))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("body");
    assert_eq!(body["solo.html"]["authentic"], true);
    assert_eq!(body["solo.html"]["current"], true);

    server.stop().await.expect("server stop");
}

#[tokio::test]
async fn occupied_port_fails_the_start() {
    let store = HashStore::open_in_memory().expect("store");
    let (mut running, _) = start_server(store).await;

    let store = HashStore::open_in_memory().expect("store");
    let service = Arc::new(Mutex::new(VerificationService::new(store)));
    let mut rival = CheckServer::new(Some(running.port()));
    let err = rival.start(service).await.expect_err("port is taken");

    assert!(matches!(err, SiegelError::Server(_)));
    assert_eq!(rival.status(), ServerStatus::Error);

    running.stop().await.expect("server stop");
}

#[tokio::test]
async fn stopped_server_refuses_connections() {
    let store = HashStore::open_in_memory().expect("store");
    let (mut server, endpoint) = start_server(store).await;
    assert_eq!(server.status(), ServerStatus::Running);

    server.stop().await.expect("server stop");
    assert_eq!(server.status(), ServerStatus::Stopped);

    let err = client(&endpoint)
        .check_hashes(&[submission("report.html", &fp("v1"))])
        .await
        .expect_err("must fail");
    assert!(matches!(err, SiegelError::VerificationUnavailable(_)));
}
