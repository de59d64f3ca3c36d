// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use f1mexicorn_client::api::{MockTransport, ReqwestTransport};
use f1mexicorn_client::config::Config;
use f1mexicorn_client::models::Profile;
use f1mexicorn_client::storage::MemoryStore;
use f1mexicorn_client::Client;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Signing key only the (simulated) backend knows.
#[allow(dead_code)]
pub const BACKEND_SIGNING_KEY: &[u8] = b"backend_signing_key_32_bytes!!!!";

#[allow(dead_code)]
pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Create a backend-style JWT. `exp_offset` is relative to now; `None`
/// leaves the claim out entirely.
#[allow(dead_code)]
pub fn mint_token(email: &str, exp_offset: Option<i64>) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        exp: Option<i64>,
    }

    let claims = Claims {
        sub: email.to_string(),
        exp: exp_offset.map(|offset| now() + offset),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(BACKEND_SIGNING_KEY),
    )
    .unwrap()
}

#[allow(dead_code)]
pub fn ada() -> Profile {
    Profile {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
    }
}

/// Client talking to a real HTTP server (wiremock) with in-memory storage.
#[allow(dead_code)]
pub fn http_client(api_url: &str, storage: Arc<MemoryStore>) -> Client {
    let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
    Client::with_parts(Config::for_api(api_url), storage, Arc::new(transport))
        .expect("Failed to build client")
}

/// Client with an offline recording transport.
#[allow(dead_code)]
pub fn offline_client(transport: &MockTransport, storage: Arc<MemoryStore>) -> Client {
    Client::with_parts(
        Config::test_default(),
        storage,
        Arc::new(transport.clone()),
    )
    .expect("Failed to build client")
}

/// Storage already holding a signed-in session.
#[allow(dead_code)]
pub fn signed_in_storage(token: &str) -> Arc<MemoryStore> {
    use f1mexicorn_client::session::TokenStore;

    let storage = Arc::new(MemoryStore::new());
    TokenStore::new(storage.clone())
        .save(token, &ada())
        .expect("Failed to seed session");
    storage
}
