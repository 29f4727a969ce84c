use crate::{
    db::{
        map_insert_error,
        models::game_models::{Game, GameSettings, GameStatus},
        repositories::access_codes,
    },
    error::Error,
    services::lifecycle::{Transition, TransitionOutcome},
};
use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::info;

const GAME_COLUMNS: &str = "id, name, host_name, admin_password_hash, status, start_time, end_time, \
     auto_start_time, duration_minutes, capture_radius_meters, points_interval_seconds, \
     max_teams, created_at";

/// Games repository for handling game rows and their lifecycle
#[derive(Clone)]
pub struct GamesRepository {
    pool: Arc<PgPool>,
}

impl GamesRepository {
    /// Create a new games repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a new game
    pub async fn create(&self, game: &Game) -> Result<()> {
        info!("Creating new game: {} ({})", game.name, game.id);

        sqlx::query(
            r#"
            INSERT INTO games (
                id, name, host_name, admin_password_hash, status, start_time, end_time,
                auto_start_time, duration_minutes, capture_radius_meters, points_interval_seconds,
                max_teams, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&game.id)
        .bind(&game.name)
        .bind(&game.host_name)
        .bind(&game.admin_password_hash)
        .bind(game.status)
        .bind(game.start_time)
        .bind(game.end_time)
        .bind(game.auto_start_time)
        .bind(game.duration_minutes)
        .bind(game.capture_radius_meters)
        .bind(game.points_interval_seconds)
        .bind(game.max_teams)
        .bind(game.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            map_insert_error(
                e,
                || format!("Game id already in use: {}", game.id),
                "create game",
            )
        })?;

        Ok(())
    }

    /// Get game by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Game>> {
        let result = sqlx::query_as::<_, Game>(&format!(
            "SELECT {} FROM games WHERE id = $1",
            GAME_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get game by ID: {}", e)))?;

        Ok(result)
    }

    /// Update settings while the game is still in setup
    pub async fn update_settings(&self, id: &str, settings: &GameSettings) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE games
            SET capture_radius_meters = $2, points_interval_seconds = $3,
                auto_start_time = $4, duration_minutes = $5, max_teams = $6
            WHERE id = $1 AND status = 'setup'
            "#,
        )
        .bind(id)
        .bind(settings.capture_radius_meters)
        .bind(settings.points_interval_seconds)
        .bind(settings.auto_start_time)
        .bind(settings.duration_minutes)
        .bind(settings.max_teams)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update game settings: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Apply a lifecycle transition guarded on the current status
    pub async fn transition(&self, id: &str, transition: Transition) -> Result<Option<TransitionOutcome>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        // Waits out in-flight capture appends, which share-lock the row
        sqlx::query("SELECT id FROM games WHERE id = $1 FOR UPDATE")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to lock game: {}", e)))?;

        let transition = match transition {
            Transition::End { .. } => {
                let last_capture = sqlx::query_scalar::<_, Option<i64>>(
                    "SELECT MAX(captured_at) FROM captures WHERE game_id = $1",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to read last capture: {}", e)))?;
                transition.not_before(last_capture)
            }
            Transition::Start { .. } => transition,
        };

        let query = match transition {
            Transition::Start { at } => sqlx::query(
                "UPDATE games SET status = 'active', start_time = $2 WHERE id = $1 AND status = 'setup'",
            )
            .bind(id)
            .bind(at),
            Transition::End { at } => sqlx::query(
                "UPDATE games SET status = 'ended', end_time = $2 WHERE id = $1 AND status = 'active'",
            )
            .bind(id)
            .bind(at),
        };

        let updated = query
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to update game status: {}", e)))?
            .rows_affected();

        if updated == 0 {
            return Ok(None);
        }

        let released_codes = match transition {
            Transition::End { .. } => access_codes::release_for_game(&mut *tx, id).await?,
            Transition::Start { .. } => 0,
        };

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit game transition: {}", e)))?;

        Ok(Some(TransitionOutcome {
            applied: transition,
            released_codes,
        }))
    }

    /// Delete a game, cascading to everything it owns
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        let result = sqlx::query(
            r#"
            DELETE FROM games
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to delete game: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit game deletion: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the games table
    pub async fn health_check(&self) -> Result<bool> {
        match sqlx::query("SELECT 1 FROM games LIMIT 1")
            .execute(&*self.pool)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::error!("Database health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// How strongly `lock_in_setup` holds the game row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowLock {
    Share,
    Update,
}

/// Lock a game inside the caller's transaction and require it to be in
/// setup. Returns the game's `max_teams`.
pub(crate) async fn lock_in_setup(conn: &mut PgConnection, game_id: &str, lock: RowLock) -> Result<i32> {
    let sql = match lock {
        RowLock::Share => "SELECT status, max_teams FROM games WHERE id = $1 FOR SHARE",
        RowLock::Update => "SELECT status, max_teams FROM games WHERE id = $1 FOR UPDATE",
    };

    let (status, max_teams) = sqlx::query_as::<_, (GameStatus, i32)>(sql)
        .bind(game_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| Error::Database(format!("Failed to lock game: {}", e)))?
        .ok_or_else(|| Error::NotFound(format!("Game not found: {}", game_id)))?;

    if status != GameStatus::Setup {
        return Err(Error::State(format!(
            "Game {} is {}; teams and bases can only be added during setup",
            game_id,
            status.as_str()
        ))
        .into());
    }
    Ok(max_teams)
}
