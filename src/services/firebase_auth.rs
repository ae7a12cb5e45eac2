// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase ID token verification.
//!
//! Tokens are RS256 JWTs issued by `https://securetoken.google.com/{project}`
//! with the project ID as audience. Signing keys come from Google's
//! securetoken JWKS and are cached for the `max-age` the endpoint advertises.

use crate::config::Config;
use anyhow::Context;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::header::CACHE_CONTROL;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const ISSUER_PREFIX: &str = "https://securetoken.google.com/";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
const CLOCK_SKEW_SECS: u64 = 60;
/// Firebase caps uid length at 128 characters.
const MAX_UID_LEN: usize = 128;

/// Identity extracted from a verified Firebase ID token.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub uid: String,
}

/// Verification failure. Both variants reject the request with 401; the
/// distinction only drives logging.
#[derive(Debug, Clone)]
pub enum VerifyError {
    /// The token itself is bad: malformed, expired, wrong issuer, bad signature.
    Rejected(String),
    /// Keys could not be fetched.
    Unavailable(String),
}

impl std::fmt::Display for VerifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerifyError::Rejected(msg) => write!(f, "token rejected: {msg}"),
            VerifyError::Unavailable(msg) => write!(f, "verifier unavailable: {msg}"),
        }
    }
}

#[derive(Clone)]
enum KeySource {
    Google,
    Static {
        kid: String,
        decoding_key: Arc<DecodingKey>,
    },
}

#[derive(Clone)]
struct JwksCacheEntry {
    keys_by_kid: HashMap<String, Arc<DecodingKey>>,
    expires_at: Instant,
}

/// Verifier for Firebase Authentication ID tokens.
pub struct FirebaseTokenVerifier {
    http_client: reqwest::Client,
    project_id: String,
    issuer: String,
    keys: KeySource,
    jwks_cache: RwLock<Option<JwksCacheEntry>>,
    refresh_lock: Mutex<()>,
}

impl FirebaseTokenVerifier {
    /// Create a production verifier that fetches and caches Google's keys.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let verifier = Self::build(config, KeySource::Google)?;
        tracing::info!(
            project = %verifier.project_id,
            issuer = %verifier.issuer,
            "Initialized Firebase token verifier"
        );
        Ok(verifier)
    }

    /// Create a verifier with a single static RSA public key.
    ///
    /// This is intended for deterministic local/integration tests.
    pub fn new_with_static_key(
        config: &Config,
        kid: impl Into<String>,
        decoding_key: DecodingKey,
    ) -> anyhow::Result<Self> {
        let kid = kid.into();
        if kid.trim().is_empty() {
            anyhow::bail!("static key id must not be empty");
        }

        Self::build(
            config,
            KeySource::Static {
                kid,
                decoding_key: Arc::new(decoding_key),
            },
        )
    }

    fn build(config: &Config, keys: KeySource) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building JWKS HTTP client")?;

        Ok(Self {
            http_client,
            project_id: config.firebase_project_id.clone(),
            issuer: format!("{ISSUER_PREFIX}{}", config.firebase_project_id),
            keys,
            jwks_cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        })
    }

    /// Expected `iss` claim.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify a raw ID token (without the `Bearer ` prefix).
    pub async fn verify(&self, token: &str) -> Result<VerifiedUser, VerifyError> {
        let header = decode_header(token)
            .map_err(|e| VerifyError::Rejected(format!("invalid JWT header: {e}")))?;

        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::Rejected(format!(
                "unexpected JWT alg: {:?}",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| VerifyError::Rejected("missing JWT kid".to_string()))?;

        let decoding_key = self.decoding_key_for_kid(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.leeway = CLOCK_SKEW_SECS;

        let claims = decode::<FirebaseClaims>(token, decoding_key.as_ref(), &validation)
            .map_err(|e| VerifyError::Rejected(format!("JWT validation failed: {e}")))?
            .claims;

        if claims.sub.is_empty() || claims.sub.len() > MAX_UID_LEN {
            return Err(VerifyError::Rejected("invalid sub claim".to_string()));
        }

        validate_not_future(claims.iat, "iat")?;
        if let Some(auth_time) = claims.auth_time {
            validate_not_future(Some(auth_time), "auth_time")?;
        }

        Ok(VerifiedUser { uid: claims.sub })
    }

    async fn decoding_key_for_kid(&self, kid: &str) -> Result<Arc<DecodingKey>, VerifyError> {
        if let KeySource::Static {
            kid: static_kid,
            decoding_key,
        } = &self.keys
        {
            return if kid == static_kid {
                Ok(decoding_key.clone())
            } else {
                Err(VerifyError::Rejected(format!(
                    "unknown JWT kid for static verifier: {kid}"
                )))
            };
        }

        if let Some(key) = self.lookup_cached_key(kid).await {
            return Ok(key);
        }

        // Keys rotate; an unknown kid earns exactly one forced refresh.
        for force_refresh in [false, true] {
            self.refresh_jwks(force_refresh).await?;
            if let Some(key) = self.lookup_cached_key(kid).await {
                return Ok(key);
            }
        }

        Err(VerifyError::Rejected(format!(
            "JWT kid not found in JWKS after refresh: {kid}"
        )))
    }

    async fn lookup_cached_key(&self, kid: &str) -> Option<Arc<DecodingKey>> {
        let cache = self.jwks_cache.read().await;
        let now = Instant::now();
        cache
            .as_ref()
            .filter(|entry| entry.expires_at > now)
            .and_then(|entry| entry.keys_by_kid.get(kid))
            .cloned()
    }

    async fn refresh_jwks(&self, force_refresh: bool) -> Result<(), VerifyError> {
        let _guard = self.refresh_lock.lock().await;

        if !force_refresh {
            let cache = self.jwks_cache.read().await;
            if cache
                .as_ref()
                .is_some_and(|entry| entry.expires_at > Instant::now())
            {
                return Ok(());
            }
        }

        tracing::debug!(jwks_uri = JWKS_URL, "Refreshing Firebase JWKS cache");

        let response = self
            .http_client
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("JWKS request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(VerifyError::Unavailable(format!(
                "JWKS request returned status {}",
                response.status()
            )));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(max_age_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CACHE_TTL);

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| VerifyError::Unavailable(format!("invalid JWKS JSON: {e}")))?;

        let keys_by_kid = usable_keys(jwks);
        if keys_by_kid.is_empty() {
            return Err(VerifyError::Unavailable(
                "JWKS response did not include any usable RSA keys".to_string(),
            ));
        }

        *self.jwks_cache.write().await = Some(JwksCacheEntry {
            keys_by_kid,
            expires_at: Instant::now() + ttl,
        });

        tracing::debug!(ttl_secs = ttl.as_secs(), "Firebase JWKS cache refreshed");
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    kty: String,
    alg: Option<String>,
    #[serde(default)]
    n: String,
    #[serde(default)]
    e: String,
    #[serde(rename = "use")]
    use_: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    iat: Option<u64>,
    auth_time: Option<u64>,
}

/// RS256 signing keys from a JWKS document, keyed by `kid`.
fn usable_keys(jwks: Jwks) -> HashMap<String, Arc<DecodingKey>> {
    jwks.keys
        .into_iter()
        .filter(|jwk| jwk.kty == "RSA" && !jwk.kid.trim().is_empty())
        .filter(|jwk| jwk.alg.as_deref().map_or(true, |alg| alg == "RS256"))
        .filter(|jwk| jwk.use_.as_deref().map_or(true, |u| u == "sig"))
        .filter_map(|jwk| match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
            Ok(key) => Some((jwk.kid, Arc::new(key))),
            Err(e) => {
                tracing::warn!(error = %e, kid = %jwk.kid, "Skipping invalid RSA JWKS key");
                None
            }
        })
        .collect()
}

fn validate_not_future(ts: Option<u64>, claim: &str) -> Result<(), VerifyError> {
    let Some(ts) = ts else {
        return Err(VerifyError::Rejected(format!("missing {claim} claim")));
    };

    if ts > now_unix_secs() + CLOCK_SKEW_SECS {
        return Err(VerifyError::Rejected(format!(
            "{claim} claim is in the future"
        )));
    }

    Ok(())
}

/// `max-age` directive of a Cache-Control header value.
fn max_age_secs(cache_control: &str) -> Option<u64> {
    cache_control
        .split(',')
        .filter_map(|d| d.trim().strip_prefix("max-age="))
        .find_map(|raw| raw.trim_matches('"').parse().ok())
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
