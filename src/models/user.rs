// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and login exchange models.

use serde::{Deserialize, Serialize};

/// Signed-in user's profile, persisted alongside the bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Email address (also the owner key of a Guess)
    pub email: String,
}

/// Body of `POST /users/auth/google`.
#[derive(Debug, Clone, Serialize)]
pub struct GoogleAuthRequest {
    /// Authorization code returned by the identity provider
    pub auth_token: String,
}

/// Response of `POST /users/auth/google`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub name: String,
    pub email: String,
    pub access_token: AccessToken,
}

impl AuthResponse {
    pub fn profile(&self) -> Profile {
        Profile {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// A player who scored on a race, from `GET /results/winners`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Winner {
    #[serde(default)]
    pub user_id: Option<u64>,
    pub username: String,
    pub email: String,
}

/// The backend has shipped the token both bare and wrapped in an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AccessToken {
    Bare(String),
    Wrapped { access_token: String },
}

impl AccessToken {
    pub fn as_str(&self) -> &str {
        match self {
            AccessToken::Bare(token) => token,
            AccessToken::Wrapped { access_token } => access_token,
        }
    }
}
