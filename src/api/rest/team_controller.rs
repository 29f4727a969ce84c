use crate::api::rest::{ApiResult, AppState, Authorized};
use crate::db::models::team_models::{NewTeam, Team, TeamUpdate};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{post, put};
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/games/:id/teams", post(add_team))
        .route("/api/teams/:id", put(update_team))
        .route("/api/teams/:id/join", post(join_team))
}

async fn add_team(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<Authorized<NewTeam>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let team = state
        .games
        .add_team(&game_id, &request.admin_password, request.body)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "team_id": team.id, "access_code": team.access_code })),
    ))
}

async fn update_team(
    Path(team_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<Authorized<TeamUpdate>>,
) -> ApiResult<Json<Team>> {
    let team = state
        .games
        .update_team(&team_id, &request.admin_password, request.body)
        .await?;
    Ok(Json(team))
}

async fn join_team(
    Path(team_id): Path<Uuid>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let player = state.games.join_team(&team_id).await?;
    Ok(Json(json!({ "player_id": player.id })))
}
