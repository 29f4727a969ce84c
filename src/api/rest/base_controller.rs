use crate::api::rest::{ApiResult, AppState, Authorized};
use crate::db::models::base_models::NewBase;
use crate::db::models::capture_models::CaptureRequest;
use crate::db::models::code_models::CodeBinding;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::{json, Value};
use uuid::Uuid;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/api/games/:id/bases", post(add_base))
        .route("/api/bases/:id/capture", post(capture_base))
        .route("/api/codes/:code/status", get(code_status))
}

async fn add_base(
    Path(game_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<Authorized<NewBase>>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let base = state
        .games
        .add_base(&game_id, &request.admin_password, request.body)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "base_id": base.id }))))
}

async fn capture_base(
    Path(base_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CaptureRequest>,
) -> ApiResult<Json<Value>> {
    let event = state.games.capture_base(&base_id, request).await?;
    Ok(Json(json!({
        "success": true,
        "teamId": event.team_id,
        "capturedAt": event.captured_at,
    })))
}

async fn code_status(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<CodeBinding>> {
    Ok(Json(state.games.code_status(&code).await?))
}
