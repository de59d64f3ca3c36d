// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth login handshake.
//!
//! `begin_login` stores a single-use nonce and hands back the provider URL.
//! When the provider redirects back, the caller builds one [`LoginCallback`]
//! for that redirect and completes it. The pending intent is taken out of
//! storage in one step before it is compared, whatever the result, so of
//! several callbacks for the same redirect only one can reach the exchange.
//!
//! A `LoginCallback` runs its handshake at most once no matter how many
//! times `complete` is called, so a re-fired UI effect cannot trigger a
//! second token exchange.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tokio::sync::OnceCell;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::Profile;
use crate::session::token_store::Credential;
use crate::session::{SessionState, SessionStatus};
use crate::storage::{keys, KeyValueStore};

const NONCE_BYTES: usize = 32;

/// Pending login record persisted between redirect and callback.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
enum LoginIntent {
    GoogleSso { state: String },
}

/// Result of one login callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Profile),
    StateMismatch,
    ExchangeFailed(String),
}

impl LoginOutcome {
    pub fn into_result(self) -> Result<Profile> {
        match self {
            LoginOutcome::Authenticated(profile) => Ok(profile),
            LoginOutcome::StateMismatch => Err(ClientError::StateMismatch),
            LoginOutcome::ExchangeFailed(reason) => Err(ClientError::ExchangeFailed(reason)),
        }
    }
}

/// Identity provider parameters.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub scope: String,
}

impl From<&Config> for OAuthSettings {
    fn from(config: &Config) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            redirect_uri: config.oauth_redirect_uri.clone(),
            authorize_url: config.oauth_authorize_url.clone(),
            scope: config.oauth_scope.clone(),
        }
    }
}

/// Starts logins and builds callbacks.
#[derive(Clone)]
pub struct OAuthHandshake {
    settings: OAuthSettings,
    storage: Arc<dyn KeyValueStore>,
    session: Arc<SessionState>,
    api: ApiClient,
}

impl OAuthHandshake {
    pub fn new(
        settings: OAuthSettings,
        storage: Arc<dyn KeyValueStore>,
        session: Arc<SessionState>,
        api: ApiClient,
    ) -> Self {
        Self {
            settings,
            storage,
            session,
            api,
        }
    }

    /// Issue a fresh nonce and return the provider authorization URL.
    ///
    /// Returns `None` without touching storage if already authenticated.
    pub fn begin_login(&self) -> Result<Option<String>> {
        if self.session.status() == SessionStatus::Authenticated {
            tracing::info!("Already authenticated, not starting login");
            return Ok(None);
        }

        let state = generate_nonce()?;
        let intent = serde_json::to_string(&LoginIntent::GoogleSso {
            state: state.clone(),
        })
        .map_err(|e| ClientError::Storage(e.to_string()))?;
        self.storage.set(keys::LOGIN_STATE, intent)?;

        self.session.begin_authenticating();

        tracing::info!(
            client_id = %self.settings.client_id,
            redirect_uri = %self.settings.redirect_uri,
            "Starting OAuth flow"
        );

        Ok(Some(self.authorization_url(&state)))
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?\
             response_type=code&\
             client_id={}&\
             redirect_uri={}&\
             scope={}&\
             state={}",
            self.settings.authorize_url,
            urlencoding::encode(&self.settings.client_id),
            urlencoding::encode(&self.settings.redirect_uri),
            urlencoding::encode(&self.settings.scope),
            urlencoding::encode(state),
        )
    }

    /// Callback for one provider redirect.
    pub fn callback(&self, state: impl Into<String>, code: impl Into<String>) -> LoginCallback {
        self.callback_with(CallbackParams {
            state: Some(state.into()),
            code: Some(code.into()),
            error: None,
        })
    }

    /// Callback for one provider redirect, parsed from the full redirect URL.
    pub fn callback_from_redirect(&self, redirect_url: &str) -> LoginCallback {
        self.callback_with(CallbackParams::from_redirect_url(redirect_url))
    }

    fn callback_with(&self, params: CallbackParams) -> LoginCallback {
        LoginCallback {
            handshake: self.clone(),
            params,
            outcome: OnceCell::new(),
        }
    }

    /// Remove the pending intent, returning its nonce if it is well-formed.
    ///
    /// Only one callback can take a given intent, and that callback owns the
    /// login attempt it started.
    fn take_pending_nonce(&self) -> PendingLogin {
        let raw = match self.storage.take(keys::LOGIN_STATE) {
            Ok(Some(raw)) => raw,
            Ok(None) => return PendingLogin::Absent,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to take pending login state");
                return PendingLogin::Absent;
            }
        };

        match serde_json::from_str::<LoginIntent>(&raw) {
            Ok(LoginIntent::GoogleSso { state }) => PendingLogin::Nonce(state),
            Err(_) => PendingLogin::Malformed,
        }
    }

    async fn run(&self, params: &CallbackParams) -> LoginOutcome {
        let pending = self.take_pending_nonce();

        let state_matches = match (&pending, &params.state) {
            (PendingLogin::Nonce(expected), Some(returned)) => {
                bool::from(expected.as_bytes().ct_eq(returned.as_bytes()))
            }
            _ => false,
        };

        if !state_matches {
            tracing::warn!(pending = pending.kind(), "OAuth state mismatch, aborting login");
            // With no intent taken, any login in flight belongs to another
            // callback and is left alone.
            if !matches!(pending, PendingLogin::Absent) {
                self.session.fail_authenticating();
            }
            return LoginOutcome::StateMismatch;
        }

        if let Some(error) = &params.error {
            tracing::warn!(error = %error, "OAuth error from identity provider");
            self.session.fail_authenticating();
            return LoginOutcome::ExchangeFailed(format!("Identity provider error: {}", error));
        }

        let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
            self.session.fail_authenticating();
            return LoginOutcome::ExchangeFailed("Missing authorization code".to_string());
        };

        // The redirect reloads the client, so the handshake may resume from
        // ANONYMOUS here.
        if !self.session.begin_authenticating() {
            return LoginOutcome::ExchangeFailed("Session is already authenticated".to_string());
        }

        tracing::info!("Exchanging authorization code for session token");

        let response = match self.api.exchange_google_code(code).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "Token exchange failed");
                self.session.fail_authenticating();
                return LoginOutcome::ExchangeFailed(e.to_string());
            }
        };

        let token = response.access_token.as_str();
        if !Credential::parse(token).is_some_and(|c| c.is_valid()) {
            tracing::warn!("Backend issued a token that is malformed or already expired");
            self.session.fail_authenticating();
            return LoginOutcome::ExchangeFailed("Issued token is not valid".to_string());
        }

        let profile = response.profile();
        if let Err(e) = self.session.complete_authenticated(token, &profile) {
            tracing::error!(error = %e, "Failed to persist session");
            self.session.fail_authenticating();
            return LoginOutcome::ExchangeFailed(format!("Failed to persist session: {}", e));
        }

        tracing::info!(email = %profile.email, "Login successful");
        LoginOutcome::Authenticated(profile)
    }
}

/// What a callback found under the login intent key.
enum PendingLogin {
    Absent,
    Malformed,
    Nonce(String),
}

impl PendingLogin {
    fn kind(&self) -> &'static str {
        match self {
            PendingLogin::Absent => "none",
            PendingLogin::Malformed => "malformed",
            PendingLogin::Nonce(_) => "nonce",
        }
    }
}

/// Query parameters of the provider redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub state: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Accepts a full URL or a bare query string.
    pub fn from_redirect_url(url: &str) -> Self {
        let query = match url.split_once('?') {
            Some((_, query)) => query,
            None => url,
        };
        let query = query.split('#').next().unwrap_or_default();

        let mut params = Self::default();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            match key {
                "state" => params.state = Some(value),
                "code" => params.code = Some(value),
                "error" => params.error = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// One provider redirect. Completing it more than once is harmless.
pub struct LoginCallback {
    handshake: OAuthHandshake,
    params: CallbackParams,
    outcome: OnceCell<LoginOutcome>,
}

impl LoginCallback {
    pub fn params(&self) -> &CallbackParams {
        &self.params
    }

    /// Run the handshake, or return the outcome of the run already made.
    pub async fn complete(&self) -> LoginOutcome {
        self.outcome
            .get_or_init(|| self.handshake.run(&self.params))
            .await
            .clone()
    }
}

fn generate_nonce() -> Result<String> {
    let mut bytes = [0u8; NONCE_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| ClientError::ExchangeFailed("System randomness unavailable".to_string()))?;
    Ok(STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_32_random_bytes() {
        let a = generate_nonce().unwrap();
        let b = generate_nonce().unwrap();

        assert_eq!(STANDARD.decode(&a).unwrap().len(), NONCE_BYTES);
        assert_ne!(a, b);
    }

    #[test]
    fn test_login_intent_wire_format() {
        let json = serde_json::to_value(LoginIntent::GoogleSso {
            state: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "GoogleSso", "data": { "state": "abc" } })
        );

        assert!(serde_json::from_str::<LoginIntent>(
            r#"{"type":"GitHub","data":{"state":"abc"}}"#
        )
        .is_err());
    }

    #[test]
    fn test_callback_params_from_redirect_url() {
        let params = CallbackParams::from_redirect_url(
            "http://localhost:3000/googlesso?state=a%2Bb%2F%3D&code=4%2F0Ab&scope=email#frag",
        );
        assert_eq!(params.state.as_deref(), Some("a+b/="));
        assert_eq!(params.code.as_deref(), Some("4/0Ab"));
        assert_eq!(params.error, None);

        let params = CallbackParams::from_redirect_url("error=access_denied&state=x");
        assert_eq!(params.error.as_deref(), Some("access_denied"));
        assert_eq!(params.code, None);
    }
}
