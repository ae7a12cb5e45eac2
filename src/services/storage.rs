// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Storage V4 signed download URLs.
//!
//! Signing is done locally with the service account's RSA key (no network
//! call), following the GOOG4-RSA-SHA256 query-string scheme:
//! canonical request -> string to sign -> RSA-SHA256 -> hex signature.

use crate::error::AppError;
use anyhow::Context;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use ring::rand::SystemRandom;
use ring::signature::{RsaKeyPair, RSA_PKCS1_SHA256};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

const STORAGE_HOST: &str = "storage.googleapis.com";
const SIGNING_ALGORITHM: &str = "GOOG4-RSA-SHA256";
/// Cloud Storage rejects V4 signatures valid for longer than 7 days.
pub const MAX_SIGNED_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Fields of a service-account JSON key file we need for signing.
#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
}

/// Signs GET URLs for objects in one bucket.
pub struct GcsUrlSigner {
    bucket: String,
    client_email: String,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
}

impl GcsUrlSigner {
    /// Load signing credentials from a service-account key file.
    pub fn from_credentials_file(bucket: &str, path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading credentials file {}", path.display()))?;
        let key: ServiceAccountKey =
            serde_json::from_str(&raw).context("credentials file is not a service-account key")?;
        Self::new(bucket, &key.client_email, &key.private_key)
    }

    /// Build a signer from a client email and a PKCS#8 PEM private key.
    pub fn new(bucket: &str, client_email: &str, private_key_pem: &str) -> anyhow::Result<Self> {
        let der = pem_to_der(private_key_pem)?;
        let key_pair = RsaKeyPair::from_pkcs8(&der)
            .map_err(|e| anyhow::anyhow!("invalid RSA private key: {e}"))?;

        Ok(Self {
            bucket: bucket.to_string(),
            client_email: client_email.to_string(),
            key_pair,
            rng: SystemRandom::new(),
        })
    }

    /// Signed GET URL for `object_path`, valid for `ttl` from now.
    pub fn signed_get_url(&self, object_path: &str, ttl: Duration) -> Result<String, AppError> {
        self.signed_get_url_at(object_path, ttl, Utc::now())
    }

    fn signed_get_url_at(
        &self,
        object_path: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let request = self.canonical_parts(object_path, ttl, now);
        let string_to_sign = request.string_to_sign();

        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(
                &RSA_PKCS1_SHA256,
                &self.rng,
                string_to_sign.as_bytes(),
                &mut signature,
            )
            .map_err(|_| anyhow::anyhow!("RSA signing failed"))?;

        Ok(format!(
            "https://{}{}?{}&X-Goog-Signature={}",
            STORAGE_HOST,
            request.resource,
            request.query,
            hex::encode(signature)
        ))
    }

    fn canonical_parts(&self, object_path: &str, ttl: Duration, now: DateTime<Utc>) -> V4Request {
        let timestamp = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!("{}/auto/storage/goog4_request", now.format("%Y%m%d"));
        let credential = format!("{}/{}", self.client_email, scope);
        let expires = ttl.min(MAX_SIGNED_URL_TTL).as_secs().max(1);

        let resource = format!("/{}/{}", self.bucket, encode_object_path(object_path));

        // Parameter names are already in sorted order.
        let query = [
            ("X-Goog-Algorithm", SIGNING_ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", timestamp.clone()),
            ("X-Goog-Expires", expires.to_string()),
            ("X-Goog-SignedHeaders", "host".to_string()),
        ]
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

        V4Request {
            resource,
            query,
            timestamp,
            scope,
        }
    }
}

/// The pieces of a V4 canonical GET request that feed the signature.
struct V4Request {
    resource: String,
    query: String,
    timestamp: String,
    scope: String,
}

impl V4Request {
    fn canonical_request(&self) -> String {
        format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            self.resource, self.query, STORAGE_HOST
        )
    }

    fn string_to_sign(&self) -> String {
        let digest = Sha256::digest(self.canonical_request().as_bytes());
        format!(
            "{}\n{}\n{}\n{}",
            SIGNING_ALGORITHM,
            self.timestamp,
            self.scope,
            hex::encode(digest)
        )
    }
}

/// Percent-encode each path segment, keeping `/` separators.
fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn pem_to_der(pem: &str) -> anyhow::Result<Vec<u8>> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();
    BASE64
        .decode(body)
        .context("private key PEM is not valid base64")
}
