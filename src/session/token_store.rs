// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer token and profile persistence.
//!
//! The token is the only credential the client holds. Its claims are decoded
//! without signature verification: the backend owns the signing key and stays
//! authoritative, the client only needs `exp` to avoid sending dead tokens.
//!
//! Anything found invalid on the way out (expired, malformed, orphaned
//! profile) is purged before `read` returns, so stale credentials never leak.

use std::sync::Arc;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Profile;
use crate::storage::{keys, KeyValueStore};

/// Claims the client cares about. Everything is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (Unix timestamp)
    #[serde(default)]
    pub exp: Option<i64>,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A bearer token together with its decoded claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub claims: Claims,
}

impl Credential {
    /// Decode a token. Returns `None` if the header or claims segment is
    /// not well-formed.
    pub fn parse(token: &str) -> Option<Self> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation).ok()?;

        Some(Self {
            token: token.to_string(),
            claims: data.claims,
        })
    }

    /// Valid iff `exp` is strictly after `now`. No `exp` means no expiry.
    pub fn is_valid_at(&self, now: i64) -> bool {
        match self.claims.exp {
            Some(exp) => now < exp,
            None => true,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(chrono::Utc::now().timestamp())
    }
}

/// Decode-and-check in one step.
pub fn is_token_valid_at(token: &str, now: i64) -> bool {
    Credential::parse(token).is_some_and(|c| c.is_valid_at(now))
}

/// Persists the credential and profile under the well-known keys.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStore> {
        &self.storage
    }

    /// Store token and profile together.
    pub fn save(&self, token: &str, profile: &Profile) -> Result<()> {
        let profile_json = serde_json::to_string(profile)
            .map_err(|e| crate::error::ClientError::Storage(e.to_string()))?;

        self.storage.set_many(&[
            (keys::ACCESS_TOKEN, token.to_string()),
            (keys::USER_INFO, profile_json),
        ])
    }

    /// Stored credential, or `None` if absent or invalid.
    pub fn read(&self) -> Option<Credential> {
        self.load().map(|(credential, _)| credential)
    }

    /// Profile of the stored session, or `None` if there is no valid one.
    pub fn profile(&self) -> Option<Profile> {
        self.load().map(|(_, profile)| profile)
    }

    /// Stored credential and profile, as of now.
    pub fn load(&self) -> Option<(Credential, Profile)> {
        self.load_at(chrono::Utc::now().timestamp())
    }

    /// Stored credential and profile, validated against `now`.
    ///
    /// Invalid contents are cleared before returning.
    pub fn load_at(&self, now: i64) -> Option<(Credential, Profile)> {
        let token = self.get_or_none(keys::ACCESS_TOKEN)?;

        let Some(credential) = Credential::parse(&token) else {
            tracing::warn!("Stored token is malformed, clearing session");
            self.discard();
            return None;
        };

        if !credential.is_valid_at(now) {
            tracing::warn!(exp = ?credential.claims.exp, "Stored token has expired, clearing session");
            self.discard();
            return None;
        }

        let profile = self
            .get_or_none(keys::USER_INFO)
            .and_then(|raw| serde_json::from_str::<Profile>(&raw).ok());

        match profile {
            Some(profile) => Some((credential, profile)),
            None => {
                tracing::warn!("Stored profile is missing or malformed, clearing session");
                self.discard();
                None
            }
        }
    }

    /// Remove token and profile. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.storage
            .remove_many(&[keys::ACCESS_TOKEN, keys::USER_INFO])
    }

    fn discard(&self) {
        if let Err(e) = self.clear() {
            tracing::error!(error = %e, "Failed to clear invalid session");
        }
    }

    fn get_or_none(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read session storage");
                None
            }
        }
    }
}
