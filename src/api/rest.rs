use crate::config::ApiConfig;
use crate::error::Error;
use crate::services::GameService;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

pub mod base_controller;
pub mod game_controller;
pub mod team_controller;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameService>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Host credential carried in request bodies
#[derive(Debug, Deserialize)]
pub struct Credential {
    pub admin_password: String,
}

/// A request body with the host credential alongside its own fields
#[derive(Debug, Deserialize)]
pub struct Authorized<T> {
    pub admin_password: String,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) | Error::GeofenceViolation { .. } => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Conflict(_) | Error::State(_) => StatusCode::CONFLICT,
            Error::Config(_) | Error::Database(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        ApiError {
            message: err.to_string(),
            status: status.as_u16(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return err.clone().into();
        }

        ApiError {
            message: err.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            warn!("Request failed: {}", self.message);
        }
        let body = Json(self);
        (status, body).into_response()
    }
}

pub struct RestApi {
    config: ApiConfig,
    games: Arc<GameService>,
}

impl RestApi {
    pub fn new(config: &ApiConfig, games: Arc<GameService>) -> Self {
        Self {
            config: config.clone(),
            games,
        }
    }

    /// All API routes with their state applied
    pub fn router(&self) -> Router {
        let state = AppState {
            games: Arc::clone(&self.games),
        };

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(false)
            .max_age(Duration::from_secs(3600));

        // Client-side routes resolve to the web client's entry page
        let web_client = ServeDir::new(&self.config.static_dir)
            .fallback(ServeFile::new(self.config.static_dir.join("index.html")));

        Router::new()
            .route("/api/health-check", get(health_check))
            .merge(game_controller::create_router())
            .merge(team_controller::create_router())
            .merge(base_controller::create_router())
            .with_state(state)
            .fallback_service(web_client)
            .layer(cors)
    }

    pub async fn run(&self) -> Result<()> {
        let app = self.router();

        let addr = self.config.address.clone() + ":" + &self.config.port.to_string();
        let addr: SocketAddr = addr.parse()?;

        info!("API server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;

        axum::Server::from_tcp(listener.into_std()?)?
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("API server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    if state.games.health_check().await? {
        Ok(Json(json!({ "status": "ok" })))
    } else {
        Err(ApiError {
            message: "Store is unavailable".to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameDefaultsConfig, SecurityConfig};
    use crate::security::SecurityService;
    use crate::services::game_codes::WordPairGenerator;
    use crate::services::SystemClock;
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn api_serving(static_dir: std::path::PathBuf) -> RestApi {
        let games = GameService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            SecurityService::new(SecurityConfig {
                password_hash_cost: 4,
            }),
            Arc::new(WordPairGenerator),
            GameDefaultsConfig::default(),
        );
        let config = ApiConfig {
            static_dir,
            ..ApiConfig::default()
        };
        RestApi::new(&config, Arc::new(games))
    }

    async fn get_path(api: &RestApi, path: &str) -> (StatusCode, String) {
        let response = api
            .router()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn unknown_paths_serve_the_web_client() {
        let dir = std::env::temp_dir().join(format!("geoflag-static-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<h1>geoflag</h1>").unwrap();
        std::fs::write(dir.join("app.js"), "start();").unwrap();
        let api = api_serving(dir.clone());

        assert_eq!(get_path(&api, "/app.js").await, (StatusCode::OK, "start();".to_string()));
        assert_eq!(
            get_path(&api, "/game/brave-falcon").await,
            (StatusCode::OK, "<h1>geoflag</h1>".to_string())
        );

        let (status, body) = get_path(&api, "/api/health-check").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("ok"));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (Error::NotFound("x".into()), 404),
            (Error::Unauthorized("x".into()), 403),
            (Error::Validation("x".into()), 400),
            (Error::Conflict("x".into()), 409),
            (
                Error::GeofenceViolation {
                    distance_meters: 20.0,
                    radius_meters: 15,
                },
                403,
            ),
            (Error::State("x".into()), 409),
            (Error::Database("x".into()), 500),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(anyhow::Error::from(err)).status, status);
        }
    }

    #[test]
    fn foreign_errors_are_internal() {
        let err = ApiError::from(anyhow::anyhow!("disk on fire"));
        assert_eq!(err.status, 500);
        assert_eq!(err.message, "disk on fire");
    }

    #[test]
    fn credential_is_split_from_the_body() {
        #[derive(Debug, Deserialize)]
        struct Body {
            name: String,
        }

        let parsed: Authorized<Body> =
            serde_json::from_str(r#"{"admin_password": "pw", "name": "North"}"#).unwrap();
        assert_eq!(parsed.admin_password, "pw");
        assert_eq!(parsed.body.name, "North");
    }
}
