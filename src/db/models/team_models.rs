use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Team model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Uuid,
    pub game_id: String,
    pub name: String,
    pub color: String,
    /// Code players scan to join; released when the game ends
    pub access_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A participant on a team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Player {
    pub id: Uuid,
    pub team_id: Uuid,
    pub joined_at: i64,
}

/// Team creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub color: String,
    pub access_code: Option<String>,
}

/// Team update request, at least one field must be present
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// A team's place on the scoreboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub player_count: i64,
    pub score: i64,
}
