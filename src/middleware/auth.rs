// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication middleware.

use crate::error::AppError;
use crate::services::VerifyError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Identity of the caller, inserted into request extensions by `require_auth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Verified Firebase uid; `None` when `DEV_NO_AUTH` bypasses verification.
    pub subject: Option<String>,
}

impl Caller {
    /// Caller with no asserted identity (bypass mode).
    pub fn anonymous() -> Self {
        Self { subject: None }
    }

    pub fn verified(uid: impl Into<String>) -> Self {
        Self {
            subject: Some(uid.into()),
        }
    }

    /// Fail with 403 when a verified caller targets another user's path.
    ///
    /// Without a verified identity the path segment is trusted as-is.
    pub fn ensure_owns(&self, user_id: &str) -> Result<(), AppError> {
        match &self.subject {
            Some(uid) if uid != user_id => {
                tracing::warn!(caller = %uid, target = %user_id, "Cross-user access blocked");
                Err(AppError::Forbidden("Forbidden".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Middleware that requires a valid Firebase ID token unless auth is bypassed.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.config.dev_no_auth {
        request.extensions_mut().insert(Caller::anonymous());
        return Ok(next.run(request).await);
    }

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let user = match state.token_verifier.verify(token).await {
        Ok(user) => user,
        Err(e @ VerifyError::Unavailable(_)) => {
            tracing::error!(error = %e, "Token verification unavailable");
            return Err(AppError::InvalidToken);
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token rejected");
            return Err(AppError::InvalidToken);
        }
    };

    tracing::debug!(uid = %user.uid, "Authenticated request");
    request.extensions_mut().insert(Caller::verified(user.uid));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_check() {
        assert!(Caller::verified("alice").ensure_owns("alice").is_ok());
        assert!(matches!(
            Caller::verified("alice").ensure_owns("bob"),
            Err(AppError::Forbidden(_))
        ));
        assert!(Caller::anonymous().ensure_owns("bob").is_ok());
    }
}
