use crate::db::models::game_models::{GameSettings, SettingsUpdate};
use crate::error::Error;
use anyhow::Result;
use std::ops::RangeInclusive;

pub const CAPTURE_RADIUS_RANGE: RangeInclusive<i32> = 5..=100;
pub const POINTS_INTERVAL_RANGE: RangeInclusive<i32> = 5..=3600;
pub const DURATION_MINUTES_RANGE: RangeInclusive<i32> = 5..=43200;
pub const MAX_TEAMS_RANGE: RangeInclusive<i32> = 2..=50;

/// A game must last at least this many points intervals
const MIN_INTERVALS_PER_GAME: i64 = 10;

/// Overlay `update` onto `current` and validate the merged result.
///
/// `auto_start_time` is only checked against `now` when the update sets it.
pub fn merge_settings(current: &GameSettings, update: &SettingsUpdate, now: i64) -> Result<GameSettings> {
    let merged = GameSettings {
        capture_radius_meters: update
            .capture_radius_meters
            .unwrap_or(current.capture_radius_meters),
        points_interval_seconds: update
            .points_interval_seconds
            .unwrap_or(current.points_interval_seconds),
        auto_start_time: update.auto_start_time.unwrap_or(current.auto_start_time),
        duration_minutes: update.duration_minutes.unwrap_or(current.duration_minutes),
        max_teams: update.max_teams.unwrap_or(current.max_teams),
    };

    validate_settings(&merged)?;

    if let Some(Some(auto_start_time)) = update.auto_start_time {
        if auto_start_time <= now {
            return Err(Error::Validation(format!(
                "Auto start time {} must be in the future",
                auto_start_time
            ))
            .into());
        }
    }

    Ok(merged)
}

pub fn validate_settings(settings: &GameSettings) -> Result<()> {
    check_range(
        "Capture radius (meters)",
        settings.capture_radius_meters,
        &CAPTURE_RADIUS_RANGE,
    )?;
    check_range(
        "Points interval (seconds)",
        settings.points_interval_seconds,
        &POINTS_INTERVAL_RANGE,
    )?;
    check_range("Max teams", settings.max_teams, &MAX_TEAMS_RANGE)?;

    if let Some(duration_minutes) = settings.duration_minutes {
        check_range("Duration (minutes)", duration_minutes, &DURATION_MINUTES_RANGE)?;

        let min_seconds = MIN_INTERVALS_PER_GAME * i64::from(settings.points_interval_seconds);
        if i64::from(duration_minutes) * 60 < min_seconds {
            return Err(Error::Validation(format!(
                "Duration of {} minutes is shorter than {} points intervals ({} seconds)",
                duration_minutes, MIN_INTERVALS_PER_GAME, min_seconds
            ))
            .into());
        }
    }

    Ok(())
}

fn check_range(what: &str, value: i32, range: &RangeInclusive<i32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be between {} and {}, got {}",
            what,
            range.start(),
            range.end(),
            value
        ))
        .into())
    }
}
