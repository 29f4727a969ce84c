use crate::api::rest::{ApiResult, AppState, Authorized, Credential};
use crate::db::models::game_models::{CreateGame, GameSettings, GameView, SettingsUpdate};
use crate::db::models::team_models::TeamStanding;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post, put};
use axum::Router;
use serde_json::{json, Value};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/games", post(create_game))
        .route("/api/games/:id", get(get_game).delete(delete_game))
        .route("/api/games/:id/start", post(start_game))
        .route("/api/games/:id/end", post(end_game))
        .route("/api/games/:id/settings", put(update_settings))
        .route("/api/games/:id/scores", get(get_scores))
}

async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGame>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let game = state.games.create_game(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "game_id": game.id }))))
}

async fn get_game(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<GameView>> {
    Ok(Json(state.games.get_game(&id).await?))
}

async fn delete_game(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(credential): Json<Credential>,
) -> ApiResult<Json<Value>> {
    state
        .games
        .delete_game(&id, &credential.admin_password)
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn start_game(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(credential): Json<Credential>,
) -> ApiResult<Json<Value>> {
    let game = state
        .games
        .start_game(&id, &credential.admin_password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "status": game.status,
        "startTime": game.start_time,
    })))
}

async fn end_game(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(credential): Json<Credential>,
) -> ApiResult<Json<Value>> {
    let game = state.games.end_game(&id, &credential.admin_password).await?;
    Ok(Json(json!({
        "success": true,
        "status": game.status,
        "endTime": game.end_time,
    })))
}

async fn update_settings(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<Authorized<SettingsUpdate>>,
) -> ApiResult<Json<GameSettings>> {
    let settings = state
        .games
        .update_settings(&id, &request.admin_password, request.body)
        .await?;
    Ok(Json(settings))
}

async fn get_scores(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TeamStanding>>> {
    Ok(Json(state.games.get_scores(&id).await?))
}
