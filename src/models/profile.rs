// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Profile visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ProfilePrivacy {
    Public,
    Private,
}

/// Profile document stored at `artifacts/{appId}/users/{userId}/userProfile/profile`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_privacy: Option<ProfilePrivacy>,
    /// Server time of the last merge-write
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial profile update.
///
/// Absent and `null` fields both mean "leave the stored value alone"; the
/// merge never clears a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_privacy: Option<ProfilePrivacy>,
}

impl ProfileUpdate {
    /// Stored field names this update touches (the Firestore update mask).
    pub fn field_mask(&self) -> Vec<&'static str> {
        let fields: [(&'static str, bool); 7] = [
            ("name", self.name.is_some()),
            ("username", self.username.is_some()),
            ("email", self.email.is_some()),
            ("avatar", self.avatar.is_some()),
            ("bio", self.bio.is_some()),
            ("location", self.location.is_some()),
            ("profilePrivacy", self.profile_privacy.is_some()),
        ];
        fields
            .into_iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }

    /// Apply the present fields onto an existing profile.
    pub fn merge_into(&self, profile: &mut Profile) {
        fn set<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *target = Some(v.clone());
            }
        }

        set(&mut profile.name, &self.name);
        set(&mut profile.username, &self.username);
        set(&mut profile.email, &self.email);
        set(&mut profile.avatar, &self.avatar);
        set(&mut profile.bio, &self.bio);
        set(&mut profile.location, &self.location);
        set(&mut profile.profile_privacy, &self.profile_privacy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_and_absent_fields_are_untouched() {
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"bio":"x","name":null}"#).unwrap();
        assert_eq!(update.field_mask(), vec!["bio"]);

        let mut profile = Profile {
            name: Some("Ana".into()),
            bio: Some("old".into()),
            ..Default::default()
        };
        update.merge_into(&mut profile);
        assert_eq!(profile.name.as_deref(), Some("Ana"));
        assert_eq!(profile.bio.as_deref(), Some("x"));
    }

    #[test]
    fn privacy_rejects_unknown_values() {
        assert!(serde_json::from_str::<ProfileUpdate>(r#"{"profilePrivacy":"friends"}"#).is_err());
        let update: ProfileUpdate =
            serde_json::from_str(r#"{"profilePrivacy":"private"}"#).unwrap();
        assert_eq!(update.profile_privacy, Some(ProfilePrivacy::Private));
        assert_eq!(update.field_mask(), vec!["profilePrivacy"]);
    }
}
