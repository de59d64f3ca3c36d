// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wire models shared with the backend.

pub mod race;
pub mod user;

pub use race::{Driver, DriverPosition, Guess, Race, Standings};
pub use user::{AccessToken, AuthResponse, GoogleAuthRequest, Profile, Winner};
