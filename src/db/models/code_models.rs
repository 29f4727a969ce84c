use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an access code is currently bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CodeBinding {
    Team { team_id: Uuid, game_id: String },
    Base { base_id: Uuid, game_id: String },
    Unassigned,
}

impl CodeBinding {
    pub fn is_free(&self) -> bool {
        matches!(self, CodeBinding::Unassigned)
    }
}

/// Row of the `access_codes` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccessCodeRow {
    pub code: String,
    pub game_id: String,
    pub team_id: Option<Uuid>,
    pub base_id: Option<Uuid>,
}

impl From<AccessCodeRow> for CodeBinding {
    fn from(row: AccessCodeRow) -> Self {
        match (row.team_id, row.base_id) {
            (Some(team_id), _) => CodeBinding::Team {
                team_id,
                game_id: row.game_id,
            },
            (None, Some(base_id)) => CodeBinding::Base {
                base_id,
                game_id: row.game_id,
            },
            (None, None) => CodeBinding::Unassigned,
        }
    }
}
