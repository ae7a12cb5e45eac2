// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - clients for the external collaborators.

pub mod firebase_auth;
pub mod inference;
pub mod storage;

pub use firebase_auth::{FirebaseTokenVerifier, VerifiedUser, VerifyError};
pub use inference::InferenceClient;
pub use storage::GcsUrlSigner;
