// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed backend API.
//!
//! Every call goes through the [`RequestPipeline`]; nothing here talks to
//! the transport directly.

pub mod pipeline;
pub mod transport;

pub use pipeline::{BearerAuth, Interceptor, RequestPipeline};
pub use transport::{HttpClient, MockTransport, ReqwestTransport};

use http::Method;

use crate::error::{ClientError, Result};
use crate::models::{AuthResponse, Driver, GoogleAuthRequest, Guess, Race, Standings, Winner};

/// Backend paths.
pub mod paths {
    /// Token exchange; the only unauthenticated call.
    pub const GOOGLE_AUTH: &str = "/users/auth/google";
    pub const SESSIONS: &str = "/f1/sessions";
    pub const SESSION_DRIVERS: &str = "/f1/session_drivers";
    pub const GUESS: &str = "/f1/guess";
    pub const SESSION_STANDING: &str = "/f1/session_standing";
    pub const SESSION_STANDING_SSE: &str = "/f1/session_standing_sse";
    pub const RESULTS_WINNERS: &str = "/results/winners";
}

/// Prediction game backend client.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: RequestPipeline,
}

impl ApiClient {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Exchange a provider authorization code for a session token.
    pub async fn exchange_google_code(&self, code: &str) -> Result<AuthResponse> {
        let body = GoogleAuthRequest {
            auth_token: code.to_string(),
        };
        self.pipeline.post_json(paths::GOOGLE_AUTH, &body).await
    }

    /// Races, most recent first. `None` returns all of them.
    pub async fn sessions(&self, limit: Option<u32>) -> Result<Vec<Race>> {
        let path = match limit {
            Some(limit) => format!("{}?limit={}", paths::SESSIONS, limit),
            None => paths::SESSIONS.to_string(),
        };
        self.pipeline.get_json(&path).await
    }

    /// Most recent race, if any.
    pub async fn latest_session(&self) -> Result<Option<Race>> {
        Ok(self.sessions(Some(1)).await?.into_iter().next())
    }

    pub async fn session_drivers(&self, session_id: u64) -> Result<Vec<Driver>> {
        self.pipeline
            .get_json(&format!("{}?session_id={}", paths::SESSION_DRIVERS, session_id))
            .await
    }

    /// The caller's stored guess for a race, if one exists.
    pub async fn guess(&self, race_id: u64) -> Result<Option<Guess>> {
        let request =
            self.pipeline
                .request(Method::GET, &format!("{}/{}", paths::GUESS, race_id), String::new())?;

        let response = match self.pipeline.send(request).await {
            Ok(response) => response,
            Err(ClientError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        if is_absent(response.body()) {
            return Ok(None);
        }
        pipeline::decode_json(response).map(Some)
    }

    pub async fn submit_guess(&self, guess: &Guess) -> Result<Guess> {
        self.pipeline.post_json(paths::GUESS, guess).await
    }

    pub async fn session_standing(&self, session_id: u64) -> Result<Standings> {
        self.pipeline
            .get_json(&format!("{}?session_id={}", paths::SESSION_STANDING, session_id))
            .await
    }

    /// Players who called a race. `None` lets the backend pick the race.
    pub async fn winners(&self, session_key: Option<u64>) -> Result<Vec<Winner>> {
        let path = match session_key {
            Some(key) => format!("{}?session_key={}", paths::RESULTS_WINNERS, key),
            None => paths::RESULTS_WINNERS.to_string(),
        };
        self.pipeline.get_json(&path).await
    }
}

/// Empty results come back as nothing, `null` or `{}` depending on route.
fn is_absent(body: &str) -> bool {
    let body = body.trim();
    body.is_empty() || body == "null" || body == "{}"
}
