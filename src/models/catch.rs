// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catch model: one logged fishing event per document.
//!
//! `NewCatch` is the write shape accepted by `POST /users/{id}/catches` with
//! every optional field defaulted. `Catch` is what the store hands back: the
//! same fields plus the server-assigned id and timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Whether the fish was kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum KeptOrReleased {
    Kept,
    #[default]
    Released,
}

/// Where the catch happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatchLocation {
    /// `[latitude, longitude]`
    pub coordinates: Option<[f64; 2]>,
    pub address: String,
    pub water_body_name: String,
    pub water_type: String,
    pub spot_name: String,
}

/// Conditions at the time of the catch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatchEnvironment {
    pub air_temperature: Option<f64>,
    pub water_temperature: Option<f64>,
    pub weather_condition: String,
    pub wind_speed: Option<f64>,
    pub wind_direction: String,
    pub air_pressure: Option<f64>,
    pub moon_phase: String,
    pub tide_info: Option<String>,
    pub visibility: String,
    pub cloud_cover: String,
}

/// How the fish was caught.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatchFishing {
    pub bait: String,
    pub lure: String,
    pub technique: String,
    pub gear_used: Vec<String>,
    pub depth: Option<f64>,
    pub time_of_day: String,
    /// Minutes
    pub duration: Option<i64>,
}

/// Catch as submitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NewCatch {
    #[validate(length(min = 1, message = "species must not be empty"))]
    pub species: String,
    #[serde(default)]
    pub species_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weight: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub length: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kept_or_released: KeptOrReleased,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: CatchLocation,
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment: CatchEnvironment,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fishing: CatchFishing,
    /// Event time, ISO 8601. Catches are listed newest first by this field.
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl NewCatch {
    /// A catch with only the species set; everything else defaulted.
    pub fn with_species(species: impl Into<String>) -> Self {
        Self {
            species: species.into(),
            species_id: None,
            weight: 0.0,
            length: 0.0,
            photos: Vec::new(),
            notes: String::new(),
            kept_or_released: KeptOrReleased::Released,
            location: CatchLocation::default(),
            environment: CatchEnvironment::default(),
            fishing: CatchFishing::default(),
            date_time: None,
            is_public: true,
            tags: Vec::new(),
        }
    }
}

/// Stored catch, as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Catch {
    /// Server-assigned document id
    #[serde(alias = "_firestore_id", default)]
    pub id: String,
    #[serde(default)]
    pub species: String,
    #[serde(default)]
    pub species_id: Option<String>,
    /// Older web clients stored these as numeric strings.
    #[serde(default, deserialize_with = "lenient_number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "lenient_number")]
    pub length: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub photos: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kept_or_released: KeptOrReleased,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: CatchLocation,
    #[serde(default, deserialize_with = "null_as_default")]
    pub environment: CatchEnvironment,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fishing: CatchFishing,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Catch {
    /// Build the stored form of a new catch.
    pub fn from_new(id: String, new: NewCatch, now: DateTime<Utc>) -> Self {
        Self {
            id,
            species: new.species,
            species_id: new.species_id,
            weight: new.weight,
            length: new.length,
            photos: new.photos,
            notes: new.notes,
            kept_or_released: new.kept_or_released,
            location: new.location,
            environment: new.environment,
            fishing: new.fishing,
            date_time: new.date_time,
            is_public: new.is_public,
            tags: new.tags,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Parsed event time, when `dateTime` holds a usable ISO 8601 value.
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.date_time.as_deref()?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        // Browser datetime-local inputs omit the offset; treat those as UTC.
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

/// Newest event time first; catches whose `dateTime` is missing or
/// unparseable sort last. Equal times fall back to the raw string.
pub fn sort_newest_first(catches: &mut [Catch]) {
    catches.sort_by_cached_key(|c| (Reverse(c.event_time()), Reverse(c.date_time.clone())));
}

fn default_true() -> bool {
    true
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A number, a numeric string or null. Unparseable text reads as 0.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => n,
        Some(Raw::Text(text)) => text.trim().parse().unwrap_or(0.0),
        None => 0.0,
    })
}

fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_only_gets_defaults() {
        let new: NewCatch = serde_json::from_str(r#"{"species":"Bass"}"#).unwrap();
        assert_eq!(new, NewCatch::with_species("Bass"));
        assert!(new.validate().is_ok());
    }

    #[test]
    fn nulls_fall_back_to_defaults() {
        let new: NewCatch = serde_json::from_str(
            r#"{"species":"Pike","weight":null,"isPublic":null,"keptOrReleased":null,"location":null}"#,
        )
        .unwrap();
        assert_eq!(new.weight, 0.0);
        assert!(new.is_public);
        assert_eq!(new.kept_or_released, KeptOrReleased::Released);
        assert_eq!(new.location, CatchLocation::default());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(serde_json::from_str::<NewCatch>(r#"{"weight":1}"#).is_err());
        assert!(
            serde_json::from_str::<NewCatch>(r#"{"species":"Bass","keptOrReleased":"eaten"}"#)
                .is_err()
        );
        let empty: NewCatch = serde_json::from_str(r#"{"species":""}"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn sorts_newest_first_with_undated_last() {
        let now = Utc::now();
        let mut catches: Vec<Catch> = [
            Some("2024-01-01T08:00:00Z"),
            None,
            Some("2024-03-01T08:00:00Z"),
            Some("2024-02-01T08:00:00Z"),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, dt)| {
            let mut new = NewCatch::with_species("Trout");
            new.date_time = dt.map(String::from);
            Catch::from_new(i.to_string(), new, now)
        })
        .collect();

        sort_newest_first(&mut catches);
        let ids: Vec<&str> = catches.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "0", "1"]);
    }

    #[test]
    fn sorts_by_instant_across_offsets() {
        let now = Utc::now();
        let mut catches: Vec<Catch> = [
            ("mid", Some("2024-01-01T12:00:00Z")),
            ("garbled", Some("sometime")),
            ("late", Some("2024-01-01T10:00:00-05:00")),
            ("early", Some("2024-01-01T11:00:00Z")),
        ]
        .into_iter()
        .map(|(id, dt)| {
            let mut new = NewCatch::with_species("Trout");
            new.date_time = dt.map(String::from);
            Catch::from_new(id.to_string(), new, now)
        })
        .collect();

        sort_newest_first(&mut catches);
        let ids: Vec<&str> = catches.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["late", "mid", "early", "garbled"]);
    }

    #[test]
    fn reads_web_client_document() {
        let catch: Catch = serde_json::from_value(serde_json::json!({
            "_firestore_id": "x1",
            "species": "Bass",
            "weight": "3.5",
            "length": 41,
            "verified": false,
            "keptOrReleased": "kept",
            "location": {"waterBodyName": "Lake Erie", "coordinates": null},
            "dateTime": "2024-07-04T06:15",
            "userId": "alice"
        }))
        .unwrap();

        assert_eq!(catch.id, "x1");
        assert_eq!(catch.weight, 3.5);
        assert_eq!(catch.length, 41.0);
        assert_eq!(catch.kept_or_released, KeptOrReleased::Kept);
        assert_eq!(catch.location.water_body_name, "Lake Erie");
        assert!(catch.is_public);

        let odd: Catch =
            serde_json::from_value(serde_json::json!({"species": "Bass", "weight": "heavy"}))
                .unwrap();
        assert_eq!(odd.weight, 0.0);
    }

    #[test]
    fn event_time_accepts_local_datetime() {
        let mut catch = Catch::from_new("a".into(), NewCatch::with_species("Carp"), Utc::now());
        catch.date_time = Some("2024-06-01T05:30".into());
        assert_eq!(
            catch.event_time().unwrap().to_rfc3339(),
            "2024-06-01T05:30:00+00:00"
        );
        catch.date_time = Some("yesterday".into());
        assert!(catch.event_time().is_none());
    }
}
