// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! All documents live under `artifacts/{appId}/users/{userId}`:
//! - `userProfile/profile` (merge-written profile)
//! - `catches/{catchId}` (one document per logged catch)

use crate::db::{collections, DocumentStore, UserScope};
use crate::error::AppError;
use crate::models::catch::sort_newest_first;
use crate::models::{Catch, NewCatch, Profile, ProfileUpdate};
use async_trait::async_trait;
use firestore::FirestoreTransformServerValue;
use futures_util::TryStreamExt;
use ring::rand::{SecureRandom, SystemRandom};

const CREATED_AT: &str = "createdAt";
const UPDATED_AT: &str = "updatedAt";

const AUTO_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const AUTO_ID_LEN: usize = 20;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Connect to the catch-log project, or to the emulator when
    /// FIRESTORE_EMULATOR_HOST is set.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Emulator connection; the emulator accepts any bearer token.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Store with no connection. Every profile or catch call fails with `AppError::Database`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Parent path `artifacts/{appId}/users/{userId}` for sub-collection access.
    fn user_parent(
        client: &firestore::FirestoreDb,
        scope: &UserScope,
    ) -> Result<firestore::ParentPathBuilder, AppError> {
        client
            .parent_path(collections::ARTIFACTS, &scope.app_id)
            .and_then(|path| path.at(collections::USERS, &scope.user_id))
            .map_err(|e| AppError::Database(format!("Invalid document path: {}", e)))
    }
}

#[async_trait]
impl DocumentStore for FirestoreDb {
    async fn get_profile(&self, scope: &UserScope) -> Result<Option<Profile>, AppError> {
        let client = self.get_client()?;
        let parent = Self::user_parent(client, scope)?;

        client
            .fluent()
            .select()
            .by_id_in(collections::USER_PROFILE)
            .parent(&parent)
            .obj()
            .one(collections::PROFILE_DOC)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn merge_profile(
        &self,
        scope: &UserScope,
        update: &ProfileUpdate,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent = Self::user_parent(client, scope)?;
        let mask = update.field_mask();

        tracing::debug!(user_id = %scope.user_id, fields = ?mask, "Merging profile");

        // The update mask limits the write to supplied fields; everything else
        // in the stored document is preserved.
        let _: () = client
            .fluent()
            .update()
            .fields(mask)
            .in_col(collections::USER_PROFILE)
            .document_id(collections::PROFILE_DOC)
            .parent(&parent)
            .transforms(|t| {
                t.fields([t
                    .field(UPDATED_AT)
                    .server_value(FirestoreTransformServerValue::RequestTime)])
            })
            .object(update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_catches(&self, scope: &UserScope) -> Result<Vec<Catch>, AppError> {
        let client = self.get_client()?;
        let parent = Self::user_parent(client, scope)?;

        // Ordered here rather than with `order_by`, which would drop
        // documents that lack a `dateTime` field.
        let documents: Vec<gcloud_sdk::google::firestore::v1::Document> = client
            .fluent()
            .select()
            .from(collections::CATCHES)
            .parent(&parent)
            .stream_query_with_errors()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let mut catches = readable_catches(
            scope,
            documents.iter().map(|doc| {
                (
                    doc.name.as_str(),
                    firestore::FirestoreDb::deserialize_doc_to::<Catch>(doc),
                )
            }),
        );

        sort_newest_first(&mut catches);
        Ok(catches)
    }

    async fn create_catch(&self, scope: &UserScope, new: &NewCatch) -> Result<String, AppError> {
        let client = self.get_client()?;
        let parent = Self::user_parent(client, scope)?;
        let catch_id = new_document_id()?;

        let _: () = client
            .fluent()
            .update()
            .in_col(collections::CATCHES)
            .document_id(&catch_id)
            .parent(&parent)
            .transforms(|t| {
                t.fields([
                    t.field(CREATED_AT)
                        .server_value(FirestoreTransformServerValue::RequestTime),
                    t.field(UPDATED_AT)
                        .server_value(FirestoreTransformServerValue::RequestTime),
                ])
            })
            .object(new)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id = %scope.user_id, catch_id = %catch_id, "Catch created");
        Ok(catch_id)
    }

    async fn delete_catch(&self, scope: &UserScope, catch_id: &str) -> Result<(), AppError> {
        let client = self.get_client()?;
        let parent = Self::user_parent(client, scope)?;

        client
            .fluent()
            .delete()
            .from(collections::CATCHES)
            .document_id(catch_id)
            .parent(&parent)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id = %scope.user_id, catch_id, "Catch deleted");
        Ok(())
    }
}

/// Keep the catches that decoded; log and drop the rest so one malformed
/// document does not hide the whole log.
fn readable_catches<'a, E: std::fmt::Display>(
    scope: &UserScope,
    decoded: impl IntoIterator<Item = (&'a str, Result<Catch, E>)>,
) -> Vec<Catch> {
    decoded
        .into_iter()
        .filter_map(|(name, result)| match result {
            Ok(catch) => Some(catch),
            Err(e) => {
                tracing::warn!(
                    user_id = %scope.user_id,
                    document = name,
                    error = %e,
                    "Skipping unreadable catch document"
                );
                None
            }
        })
        .collect()
}

/// Generate a 20-character Firestore-style auto id.
fn new_document_id() -> Result<String, AppError> {
    // Largest multiple of the alphabet size below 256, so accepted bytes map uniformly.
    let limit = (256 / AUTO_ID_ALPHABET.len() * AUTO_ID_ALPHABET.len()) as u8;
    let rng = SystemRandom::new();
    let mut id = String::with_capacity(AUTO_ID_LEN);
    let mut buf = [0u8; 32];

    while id.len() < AUTO_ID_LEN {
        rng.fill(&mut buf)
            .map_err(|_| anyhow::anyhow!("system RNG unavailable"))?;
        for &b in buf.iter().filter(|&&b| b < limit) {
            if id.len() == AUTO_ID_LEN {
                break;
            }
            id.push(AUTO_ID_ALPHABET[b as usize % AUTO_ID_ALPHABET.len()] as char);
        }
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_are_alphanumeric() {
        let a = new_document_id().unwrap();
        let b = new_document_id().unwrap();
        assert_eq!(a.len(), AUTO_ID_LEN);
        assert!(a.bytes().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn unreadable_documents_are_skipped() {
        let scope = UserScope::new("app", "alice");
        let decoded = vec![
            (
                "catches/a",
                serde_json::from_value::<Catch>(
                    serde_json::json!({"_firestore_id": "a", "species": "Bass", "weight": "3.5"}),
                ),
            ),
            (
                "catches/b",
                serde_json::from_value::<Catch>(serde_json::json!({"species": ["not", "text"]})),
            ),
        ];

        let catches = readable_catches(&scope, decoded);
        assert_eq!(catches.len(), 1);
        assert_eq!(catches[0].id, "a");
        assert_eq!(catches[0].weight, 3.5);
    }

    #[tokio::test]
    async fn offline_client_reports_database_error() {
        let db = FirestoreDb::new_mock();
        let scope = UserScope::new("app", "alice");
        assert!(matches!(
            db.list_catches(&scope).await,
            Err(AppError::Database(_))
        ));
    }
}
