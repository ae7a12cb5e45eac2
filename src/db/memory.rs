// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory `DocumentStore` for tests and offline runs.
//!
//! Mirrors the Firestore semantics the handlers rely on: merge-writes keep
//! untouched fields, ids are generated by the store, list order is by
//! `dateTime` descending, deletes are idempotent.

use crate::db::{DocumentStore, UserScope};
use crate::error::AppError;
use crate::models::catch::sort_newest_first;
use crate::models::{Catch, NewCatch, Profile, ProfileUpdate};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

#[derive(Default)]
struct UserDocs {
    profile: Option<Profile>,
    catches: BTreeMap<String, Catch>,
}

/// Document store held entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<RwLock<HashMap<UserScope, UserDocs>>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::Database("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_profile(&self, scope: &UserScope) -> Result<Option<Profile>, AppError> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        Ok(users.get(scope).and_then(|docs| docs.profile.clone()))
    }

    async fn merge_profile(
        &self,
        scope: &UserScope,
        update: &ProfileUpdate,
    ) -> Result<(), AppError> {
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;
        let profile = users
            .entry(scope.clone())
            .or_default()
            .profile
            .get_or_insert_with(Profile::default);
        update.merge_into(profile);
        profile.updated_at = Some(chrono::Utc::now());
        Ok(())
    }

    async fn list_catches(&self, scope: &UserScope) -> Result<Vec<Catch>, AppError> {
        let users = self.users.read().map_err(|_| Self::poisoned())?;
        let mut catches: Vec<Catch> = users
            .get(scope)
            .map(|docs| docs.catches.values().cloned().collect())
            .unwrap_or_default();
        sort_newest_first(&mut catches);
        Ok(catches)
    }

    async fn create_catch(&self, scope: &UserScope, new: &NewCatch) -> Result<String, AppError> {
        let id = format!("mem-{:08}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let catch = Catch::from_new(id.clone(), new.clone(), chrono::Utc::now());

        let mut users = self.users.write().map_err(|_| Self::poisoned())?;
        users
            .entry(scope.clone())
            .or_default()
            .catches
            .insert(id.clone(), catch);
        Ok(id)
    }

    async fn delete_catch(&self, scope: &UserScope, catch_id: &str) -> Result<(), AppError> {
        let mut users = self.users.write().map_err(|_| Self::poisoned())?;
        if let Some(docs) = users.get_mut(scope) {
            docs.catches.remove(catch_id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn catches_are_scoped_per_user() {
        let store = MemoryStore::new();
        let alice = UserScope::new("app", "alice");
        let bob = UserScope::new("app", "bob");

        let id = store
            .create_catch(&alice, &NewCatch::with_species("Bass"))
            .await
            .unwrap();

        assert_eq!(store.list_catches(&alice).await.unwrap().len(), 1);
        assert!(store.list_catches(&bob).await.unwrap().is_empty());

        store.delete_catch(&bob, &id).await.unwrap();
        assert_eq!(store.list_catches(&alice).await.unwrap().len(), 1);

        store.delete_catch(&alice, &id).await.unwrap();
        store.delete_catch(&alice, &id).await.unwrap();
        assert!(store.list_catches(&alice).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn merge_creates_then_preserves() {
        let store = MemoryStore::new();
        let scope = UserScope::new("app", "alice");
        assert!(store.get_profile(&scope).await.unwrap().is_none());

        let first = ProfileUpdate {
            name: Some("Alice".into()),
            ..Default::default()
        };
        store.merge_profile(&scope, &first).await.unwrap();

        let second = ProfileUpdate {
            bio: Some("fly fishing".into()),
            ..Default::default()
        };
        store.merge_profile(&scope, &second).await.unwrap();

        let profile = store.get_profile(&scope).await.unwrap().unwrap();
        assert_eq!(profile.name.as_deref(), Some("Alice"));
        assert_eq!(profile.bio.as_deref(), Some("fly fishing"));
        assert!(profile.updated_at.is_some());
    }
}
