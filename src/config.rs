// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL, without a trailing slash
    pub api_url: String,
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Redirect URI registered with the identity provider
    pub oauth_redirect_uri: String,
    /// Identity provider authorization endpoint
    pub oauth_authorize_url: String,
    /// Space-separated OAuth scopes
    pub oauth_scope: String,
    /// Location of the durable session file
    pub session_file: PathBuf,
    /// Timeout applied to every backend call
    pub http_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000".to_string(),
            google_client_id: "test_client_id.apps.googleusercontent.com".to_string(),
            oauth_redirect_uri: "http://localhost:3000/googlesso".to_string(),
            oauth_authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            oauth_scope: "openid email profile".to_string(),
            session_file: PathBuf::from(".f1mexicorn/session.json"),
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let http_timeout = match env::var("HTTP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid("HTTP_TIMEOUT_SECS", raw))?,
            ),
            Err(_) => defaults.http_timeout,
        };

        Ok(Self {
            api_url: env::var("API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?,
            oauth_redirect_uri: env::var("OAUTH_REDIRECT_URI")
                .unwrap_or(defaults.oauth_redirect_uri),
            oauth_authorize_url: env::var("OAUTH_AUTHORIZE_URL")
                .unwrap_or(defaults.oauth_authorize_url),
            oauth_scope: env::var("OAUTH_SCOPE").unwrap_or(defaults.oauth_scope),
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            http_timeout,
        })
    }

    /// Config pointing at a test backend (e.g. a wiremock server).
    pub fn test_default() -> Self {
        Self::default()
    }

    /// Same as [`Config::test_default`] but with a custom backend URL.
    pub fn for_api(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
