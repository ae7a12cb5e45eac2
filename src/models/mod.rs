// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod catch;
pub mod profile;
pub mod stats;

pub use catch::{Catch, CatchEnvironment, CatchFishing, CatchLocation, KeptOrReleased, NewCatch};
pub use profile::{Profile, ProfilePrivacy, ProfileUpdate};
pub use stats::{CatchStats, StatsRange};
