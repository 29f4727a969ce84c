use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A timestamped claim of a base by a team
///
/// Events are ordered by `(captured_at, seq)`; `seq` is the store's arrival
/// counter and breaks ties between captures in the same second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CaptureEvent {
    pub id: Uuid,
    pub seq: i64,
    pub game_id: String,
    pub base_id: Uuid,
    pub team_id: Uuid,
    pub captured_at: i64,
}

impl CaptureEvent {
    pub fn order_key(&self) -> (i64, i64) {
        (self.captured_at, self.seq)
    }
}

/// Capture request sent by a player standing at a base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub player_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
}
