// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session state machine.
//!
//! ```text
//! ANONYMOUS ──begin_login──▶ AUTHENTICATING ──exchange ok──▶ AUTHENTICATED
//!     ▲                            │                              │
//!     └──────── any failure ───────┘                              │
//!     └──────── logout / expired token / 401 ─────────────────────┘
//! ```
//!
//! The status is the only thing held here; the profile is always read
//! through the [`TokenStore`]. Listeners are called synchronously, once per
//! transition, after the internal lock has been released.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::error::{ClientError, Result};
use crate::models::Profile;
use crate::session::token_store::{Credential, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Externally observable projection of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub profile: Option<Profile>,
}

type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

struct Inner {
    status: SessionStatus,
    listeners: Vec<(u64, Listener)>,
    next_id: u64,
}

/// Session status plus observer registry.
pub struct SessionState {
    tokens: TokenStore,
    inner: Arc<Mutex<Inner>>,
}

impl SessionState {
    /// Start-up: AUTHENTICATED iff a valid credential is already stored.
    ///
    /// No network access; an expired or malformed token is purged here.
    pub fn restore(tokens: TokenStore) -> Self {
        let status = match tokens.load() {
            Some((_, profile)) => {
                tracing::info!(email = %profile.email, "Restored stored session");
                SessionStatus::Authenticated
            }
            None => SessionStatus::Anonymous,
        };

        Self {
            tokens,
            inner: Arc::new(Mutex::new(Inner {
                status,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// Current status, after a lazy validity check of the stored token.
    pub fn status(&self) -> SessionStatus {
        self.snapshot().status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        if self.current() == SessionStatus::Authenticated {
            if let Some((_, profile)) = self.tokens.load() {
                return SessionSnapshot {
                    status: SessionStatus::Authenticated,
                    profile: Some(profile),
                };
            }
            self.expire();
        }

        SessionSnapshot {
            status: self.current(),
            profile: None,
        }
    }

    /// Credential to attach to an outbound call.
    ///
    /// Finding no valid credential while AUTHENTICATED logs the session out.
    pub fn credential(&self) -> Option<Credential> {
        let credential = self.tokens.read();
        if credential.is_none() && self.current() == SessionStatus::Authenticated {
            self.expire();
        }
        credential
    }

    /// Register a listener. It stays registered until the returned handle
    /// is dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.listeners.push((id, Arc::new(listener)));

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// ANONYMOUS → AUTHENTICATING.
    ///
    /// Returns `false` when already AUTHENTICATED; login must not proceed.
    pub(crate) fn begin_authenticating(&self) -> bool {
        match self.current() {
            SessionStatus::Authenticated => false,
            SessionStatus::Authenticating => true,
            SessionStatus::Anonymous => {
                self.transition(&[SessionStatus::Anonymous], SessionStatus::Authenticating);
                true
            }
        }
    }

    /// Persist the exchanged credential, then AUTHENTICATING → AUTHENTICATED.
    ///
    /// Fails, leaving nothing stored, if the attempt was abandoned while the
    /// exchange was in flight.
    pub(crate) fn complete_authenticated(&self, token: &str, profile: &Profile) -> Result<()> {
        if self.current() != SessionStatus::Authenticating {
            return Err(abandoned());
        }

        self.tokens.save(token, profile)?;
        if self.transition(
            &[SessionStatus::Authenticating],
            SessionStatus::Authenticated,
        ) {
            return Ok(());
        }

        if self.current() != SessionStatus::Authenticated {
            if let Err(e) = self.tokens.clear() {
                tracing::error!(error = %e, "Failed to discard credential of abandoned login");
            }
        }
        Err(abandoned())
    }

    /// AUTHENTICATING → ANONYMOUS.
    pub(crate) fn fail_authenticating(&self) {
        self.transition(&[SessionStatus::Authenticating], SessionStatus::Anonymous);
    }

    /// Explicit logout. Idempotent.
    pub fn logout(&self) -> Result<()> {
        self.tokens.clear()?;
        if self.transition(&[SessionStatus::Authenticated], SessionStatus::Anonymous) {
            tracing::info!("Logged out");
        }
        Ok(())
    }

    /// Logout forced by the backend rejecting our credential.
    pub fn force_logout(&self) {
        if let Err(e) = self.tokens.clear() {
            tracing::error!(error = %e, "Failed to clear credential after 401");
        }
        if self.transition(&[SessionStatus::Authenticated], SessionStatus::Anonymous) {
            tracing::warn!("Backend rejected credential, session logged out");
        }
    }

    fn expire(&self) {
        if self.transition(&[SessionStatus::Authenticated], SessionStatus::Anonymous) {
            tracing::warn!("Session token no longer valid, logged out");
        }
    }

    fn current(&self) -> SessionStatus {
        self.lock().status
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `to` if the current status is one of `from`, then notify.
    fn transition(&self, from: &[SessionStatus], to: SessionStatus) -> bool {
        let listeners: Vec<Listener> = {
            let mut inner = self.lock();
            if inner.status == to || !from.contains(&inner.status) {
                return false;
            }
            tracing::debug!(from = ?inner.status, to = ?to, "Session transition");
            inner.status = to;
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };

        let snapshot = SessionSnapshot {
            status: to,
            profile: match to {
                SessionStatus::Authenticated => self.tokens.profile(),
                _ => None,
            },
        };

        for listener in listeners {
            listener(&snapshot);
        }
        true
    }
}

fn abandoned() -> ClientError {
    ClientError::ExchangeFailed("Login attempt was abandoned".to_string())
}

/// Listener registration handle.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
