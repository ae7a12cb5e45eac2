// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer (Firestore).
//!
//! Handlers talk to a `DocumentStore`; production uses `FirestoreDb`, tests
//! use `MemoryStore`.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::AppError;
use crate::models::{Catch, NewCatch, Profile, ProfileUpdate};
use async_trait::async_trait;

/// Collection and document names as constants.
pub mod collections {
    /// Top-level segment shared by documents and storage objects
    pub const ARTIFACTS: &str = "artifacts";
    pub const USERS: &str = "users";
    pub const USER_PROFILE: &str = "userProfile";
    /// Fixed document id of the profile inside `userProfile`
    pub const PROFILE_DOC: &str = "profile";
    pub const CATCHES: &str = "catches";
}

/// One user's namespace: `artifacts/{app_id}/users/{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserScope {
    pub app_id: String,
    pub user_id: String,
}

impl UserScope {
    pub fn new(app_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Document path of the user root, without a trailing separator.
    pub fn root_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            collections::ARTIFACTS,
            self.app_id,
            collections::USERS,
            self.user_id
        )
    }

    /// Object-store prefix owned by this user (trailing `/` included).
    pub fn storage_prefix(&self) -> String {
        format!("{}/", self.root_path())
    }

    /// Whether an object path lives inside this user's namespace.
    pub fn owns_object(&self, object_path: &str) -> bool {
        object_path.starts_with(&self.storage_prefix())
    }
}

/// Per-user document operations backed by the external document database.
///
/// Every call is a single round trip; implementations do not retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the profile document, `None` if it was never written.
    async fn get_profile(&self, scope: &UserScope) -> Result<Option<Profile>, AppError>;

    /// Merge the present fields of `update` into the profile and restamp
    /// `updatedAt`. Creates the document if missing.
    async fn merge_profile(&self, scope: &UserScope, update: &ProfileUpdate)
        -> Result<(), AppError>;

    /// All catches, newest `dateTime` first.
    async fn list_catches(&self, scope: &UserScope) -> Result<Vec<Catch>, AppError>;

    /// Persist a new catch under a server-generated id and return the id.
    async fn create_catch(&self, scope: &UserScope, new: &NewCatch) -> Result<String, AppError>;

    /// Delete a catch. Deleting a missing id succeeds.
    async fn delete_catch(&self, scope: &UserScope, catch_id: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_prefix_scopes_to_user() {
        let scope = UserScope::new("app1", "alice");
        assert_eq!(scope.root_path(), "artifacts/app1/users/alice");
        assert!(scope.owns_object("artifacts/app1/users/alice/photos/1.jpg"));
        assert!(!scope.owns_object("artifacts/app1/users/alice2/photos/1.jpg"));
        assert!(!scope.owns_object("artifacts/app1/users/bob/photos/1.jpg"));
        assert!(!scope.owns_object("artifacts/app2/users/alice/photos/1.jpg"));
        assert!(!scope.owns_object("artifacts/app1/users/alice"));
    }
}
