// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catch statistics, computed on demand from a user's catch list.
//!
//! Nothing here is persisted: the stats endpoint reads the catches and folds
//! them into a `CatchStats` on every request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{Catch, KeptOrReleased};

/// Time window for statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsRange {
    #[default]
    All,
    Week,
    Month,
    Year,
}

impl StatsRange {
    /// Oldest event time included in this range, if bounded.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            StatsRange::All => return None,
            StatsRange::Week => 7,
            StatsRange::Month => 30,
            StatsRange::Year => 365,
        };
        Some(now - Duration::days(days))
    }
}

/// The heaviest catch in the set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct BiggestCatch {
    pub id: String,
    pub species: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct KeepReleaseRatio {
    pub kept: u32,
    pub released: u32,
}

/// Aggregate statistics over a set of catches.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CatchStats {
    pub total_catches: u32,
    pub total_weight: f64,
    pub average_weight: f64,
    pub biggest_catch: Option<BiggestCatch>,
    pub species_count: u32,
    /// Catch count per species
    pub species_breakdown: BTreeMap<String, u32>,
    /// Catch count per water body ("Unknown" when not recorded)
    pub location_breakdown: BTreeMap<String, u32>,
    /// Catch count per month ("YYYY-MM")
    pub monthly_breakdown: BTreeMap<String, u32>,
    pub bait_breakdown: BTreeMap<String, u32>,
    pub time_of_day_breakdown: BTreeMap<String, u32>,
    pub weather_breakdown: BTreeMap<String, u32>,
    pub keep_release_ratio: KeepReleaseRatio,
    pub catches_last_30_days: u32,
}

impl CatchStats {
    /// Fold catches inside `range` into statistics.
    ///
    /// For a bounded range, catches without a parseable `dateTime` are left out.
    pub fn compute(catches: &[Catch], range: StatsRange, now: DateTime<Utc>) -> Self {
        let since = range.since(now);
        let last_30 = now - Duration::days(30);

        let mut stats = CatchStats::default();
        let mut species = HashSet::new();

        for catch in catches {
            let event_time = catch.event_time();
            if let Some(since) = since {
                if !event_time.is_some_and(|t| t >= since) {
                    continue;
                }
            }

            stats.total_catches += 1;

            if catch.weight > 0.0 {
                stats.total_weight += catch.weight;
                let bigger = stats
                    .biggest_catch
                    .as_ref()
                    .map_or(true, |b| catch.weight > b.weight);
                if bigger {
                    stats.biggest_catch = Some(BiggestCatch {
                        id: catch.id.clone(),
                        species: catch.species.clone(),
                        weight: catch.weight,
                    });
                }
            }

            if !catch.species.is_empty() {
                species.insert(catch.species.as_str());
                bump(&mut stats.species_breakdown, &catch.species);
            }

            let water = catch.location.water_body_name.trim();
            bump(
                &mut stats.location_breakdown,
                if water.is_empty() { "Unknown" } else { water },
            );

            if let Some(t) = event_time {
                bump(
                    &mut stats.monthly_breakdown,
                    &t.format("%Y-%m").to_string(),
                );
                if t >= last_30 {
                    stats.catches_last_30_days += 1;
                }
            }

            if !catch.fishing.bait.is_empty() {
                bump(&mut stats.bait_breakdown, &catch.fishing.bait);
            }
            if !catch.fishing.time_of_day.is_empty() {
                bump(&mut stats.time_of_day_breakdown, &catch.fishing.time_of_day);
            }
            if !catch.environment.weather_condition.is_empty() {
                bump(
                    &mut stats.weather_breakdown,
                    &catch.environment.weather_condition,
                );
            }

            match catch.kept_or_released {
                KeptOrReleased::Kept => stats.keep_release_ratio.kept += 1,
                KeptOrReleased::Released => stats.keep_release_ratio.released += 1,
            }
        }

        stats.species_count = species.len() as u32;
        if stats.total_catches > 0 {
            stats.average_weight = stats.total_weight / f64::from(stats.total_catches);
        }

        stats
    }
}

fn bump(map: &mut BTreeMap<String, u32>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}
