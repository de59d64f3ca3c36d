// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session restore and logout tests.
//!
//! A stored token is trusted at start-up only while its `exp` claim is in
//! the future. Restoring never talks to the backend.

use f1mexicorn_client::api::MockTransport;
use f1mexicorn_client::config::Config;
use f1mexicorn_client::session::SessionStatus;
use f1mexicorn_client::storage::{keys, FileStore, KeyValueStore, MemoryStore};
use f1mexicorn_client::Client;
use http::StatusCode;
use std::sync::{Arc, Mutex};

mod common;
use common::{ada, mint_token, offline_client, signed_in_storage};

#[test]
fn test_valid_token_restores_authenticated_offline() {
    let transport = MockTransport::always(StatusCode::OK, "{}");
    let token = mint_token("ada@example.com", Some(3600));
    let client = offline_client(&transport, signed_in_storage(&token));

    let snapshot = client.session.snapshot();
    assert_eq!(snapshot.status, SessionStatus::Authenticated);
    assert_eq!(snapshot.profile, Some(ada()));
    assert_eq!(client.session.credential().unwrap().token, token);
    assert_eq!(transport.request_count(), 0);
}

#[test]
fn test_expired_token_is_cleared_on_restore() {
    let transport = MockTransport::always(StatusCode::OK, "{}");
    let storage = signed_in_storage(&mint_token("ada@example.com", Some(-1)));
    let client = offline_client(&transport, storage.clone());

    assert_eq!(client.session.status(), SessionStatus::Anonymous);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::USER_INFO).unwrap(), None);
}

#[test]
fn test_malformed_token_is_cleared_on_restore() {
    let transport = MockTransport::always(StatusCode::OK, "{}");
    let storage = signed_in_storage("definitely.not.a-jwt");
    let client = offline_client(&transport, storage.clone());

    assert_eq!(client.session.status(), SessionStatus::Anonymous);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
}

#[test]
fn test_token_without_profile_is_anonymous() {
    let transport = MockTransport::always(StatusCode::OK, "{}");
    let storage = Arc::new(MemoryStore::new());
    storage
        .set(keys::ACCESS_TOKEN, mint_token("ada@example.com", Some(3600)))
        .unwrap();
    let client = offline_client(&transport, storage);

    assert_eq!(client.session.status(), SessionStatus::Anonymous);
}

#[test]
fn test_logout_clears_store_and_notifies() {
    let transport = MockTransport::always(StatusCode::OK, "{}");
    let storage = signed_in_storage(&mint_token("ada@example.com", Some(3600)));
    let client = offline_client(&transport, storage.clone());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = client
        .session
        .subscribe(move |s| sink.lock().unwrap().push(s.clone()));

    client.session.logout().unwrap();
    // Second logout is a no-op
    client.session.logout().unwrap();

    assert_eq!(client.session.status(), SessionStatus::Anonymous);
    assert_eq!(storage.get(keys::ACCESS_TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::USER_INFO).unwrap(), None);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].status, SessionStatus::Anonymous);
    assert_eq!(seen[0].profile, None);
}

#[test]
fn test_file_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("state").join("session.json");
    let token = mint_token("ada@example.com", Some(3600));

    {
        let storage = Arc::new(FileStore::open(&session_file).unwrap());
        f1mexicorn_client::session::TokenStore::new(storage)
            .save(&token, &ada())
            .unwrap();
    }

    let transport = MockTransport::always(StatusCode::OK, "{}");
    let storage = Arc::new(FileStore::open(&session_file).unwrap());
    let client = Client::with_parts(
        Config::test_default(),
        storage,
        Arc::new(transport.clone()),
    )
    .unwrap();

    assert_eq!(client.session.status(), SessionStatus::Authenticated);
    assert_eq!(client.session.snapshot().profile, Some(ada()));

    client.session.logout().unwrap();

    let reopened = FileStore::open(&session_file).unwrap();
    assert_eq!(reopened.get(keys::ACCESS_TOKEN).unwrap(), None);
}
