// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! F1 Mexicorn client: session and request layer for the prediction game.
//!
//! This crate owns the login handshake with Google, the stored bearer
//! token, the request pipeline every backend call goes through, the live
//! standings stream and the drag-and-drop prediction editor state.

pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod live;
pub mod models;
pub mod session;
pub mod storage;

use std::sync::Arc;

use api::{paths, ApiClient, BearerAuth, HttpClient, RequestPipeline, ReqwestTransport};
use config::Config;
use error::Result;
use live::LiveUpdateChannel;
use session::{OAuthHandshake, OAuthSettings, SessionState, TokenStore};
use storage::{FileStore, KeyValueStore};

/// Wired-up client components.
pub struct Client {
    pub config: Config,
    pub session: Arc<SessionState>,
    pub api: ApiClient,
    pub oauth: OAuthHandshake,
    pub live: LiveUpdateChannel,
}

impl Client {
    /// Production wiring: session file on disk, `reqwest` transport.
    pub fn from_config(config: Config) -> Result<Self> {
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.session_file)?);
        let transport: Arc<dyn HttpClient> = Arc::new(ReqwestTransport::new(config.http_timeout)?);
        Self::with_parts(config, storage, transport)
    }

    /// Wiring with caller-provided storage and transport.
    pub fn with_parts(
        config: Config,
        storage: Arc<dyn KeyValueStore>,
        transport: Arc<dyn HttpClient>,
    ) -> Result<Self> {
        let session = Arc::new(SessionState::restore(TokenStore::new(storage.clone())));

        let pipeline = RequestPipeline::new(transport, config.api_url.clone())
            .with_interceptor(BearerAuth::new(session.clone()).exempt(paths::GOOGLE_AUTH));
        let api = ApiClient::new(pipeline);

        let oauth = OAuthHandshake::new(
            OAuthSettings::from(&config),
            storage,
            session.clone(),
            api.clone(),
        );
        let live = LiveUpdateChannel::new(api.pipeline(), config.http_timeout)?;

        Ok(Self {
            config,
            session,
            api,
            oauth,
            live,
        })
    }
}
