// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session layer: stored credential, login handshake, observable state.

pub mod oauth;
pub mod state;
pub mod token_store;

pub use oauth::{CallbackParams, LoginCallback, LoginOutcome, OAuthHandshake, OAuthSettings};
pub use state::{SessionSnapshot, SessionState, SessionStatus, Subscription};
pub use token_store::{Claims, Credential, TokenStore};
