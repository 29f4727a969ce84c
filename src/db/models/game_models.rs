use super::base_models::BaseView;
use super::team_models::TeamStanding;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle state of a game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "game_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Setup,
    Active,
    Ended,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Setup => "setup",
            GameStatus::Active => "active",
            GameStatus::Ended => "ended",
        }
    }
}

/// Game model
///
/// `start_time` is set iff the status is active or ended, `end_time` iff ended.
/// Times are Unix seconds.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Game {
    pub id: String,
    pub name: String,
    pub host_name: Option<String>,
    #[serde(skip_serializing)]
    pub admin_password_hash: String,
    pub status: GameStatus,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub auto_start_time: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub capture_radius_meters: i32,
    pub points_interval_seconds: i32,
    pub max_teams: i32,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn settings(&self) -> GameSettings {
        GameSettings {
            capture_radius_meters: self.capture_radius_meters,
            points_interval_seconds: self.points_interval_seconds,
            auto_start_time: self.auto_start_time,
            duration_minutes: self.duration_minutes,
            max_teams: self.max_teams,
        }
    }

    pub fn apply_settings(&mut self, settings: &GameSettings) {
        self.capture_radius_meters = settings.capture_radius_meters;
        self.points_interval_seconds = settings.points_interval_seconds;
        self.auto_start_time = settings.auto_start_time;
        self.duration_minutes = settings.duration_minutes;
        self.max_teams = settings.max_teams;
    }

    /// The moment an active game with a duration runs out
    pub fn scheduled_end_time(&self) -> Option<i64> {
        match (self.start_time, self.duration_minutes) {
            (Some(start), Some(minutes)) => Some(start + i64::from(minutes) * 60),
            _ => None,
        }
    }
}

/// Host-tunable settings, mutable only while the game is in setup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    pub capture_radius_meters: i32,
    pub points_interval_seconds: i32,
    pub auto_start_time: Option<i64>,
    pub duration_minutes: Option<i32>,
    pub max_teams: i32,
}

/// Partial settings patch
///
/// The nullable settings use a nested option: absent leaves the value alone,
/// `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub capture_radius_meters: Option<i32>,
    #[serde(default)]
    pub points_interval_seconds: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub auto_start_time: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub duration_minutes: Option<Option<i32>>,
    #[serde(default)]
    pub max_teams: Option<i32>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.capture_radius_meters.is_none()
            && self.points_interval_seconds.is_none()
            && self.auto_start_time.is_none()
            && self.duration_minutes.is_none()
            && self.max_teams.is_none()
    }
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Game creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGame {
    pub name: String,
    pub host_name: Option<String>,
    pub admin_password: String,
    #[serde(default)]
    pub settings: SettingsUpdate,
}

/// Full game as shown to hosts and players
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: String,
    pub name: String,
    pub host_name: Option<String>,
    pub status: GameStatus,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub scheduled_end_time: Option<i64>,
    pub settings: GameSettings,
    pub teams: Vec<TeamStanding>,
    pub bases: Vec<BaseView>,
}
