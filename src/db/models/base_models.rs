use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Base model, a GPS-pinned point teams capture
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Base {
    pub id: Uuid,
    pub game_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub access_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Base creation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBase {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub access_code: Option<String>,
}

/// Base as shown in the game view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseView {
    pub id: Uuid,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub owned_by: Option<Uuid>,
    pub access_code: Option<String>,
}
