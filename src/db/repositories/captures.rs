use crate::{
    db::models::{capture_models::CaptureEvent, game_models::GameStatus},
    error::Error,
};
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Captures repository, the append-only ledger table
#[derive(Clone)]
pub struct CapturesRepository {
    pool: Arc<PgPool>,
}

impl CapturesRepository {
    /// Create a new captures repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Append a capture if the game is active and not yet past its
    /// scheduled end.
    ///
    /// The game row is share-locked so an end transition can't slip in
    /// between the status check and the insert, and the base row is
    /// locked so appends to one base are serialized.
    pub async fn append(
        &self,
        game_id: &str,
        base_id: Uuid,
        team_id: Uuid,
        captured_at: i64,
    ) -> Result<Option<CaptureEvent>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        let (status, start_time, duration_minutes) =
            sqlx::query_as::<_, (GameStatus, Option<i64>, Option<i32>)>(
                "SELECT status, start_time, duration_minutes FROM games WHERE id = $1 FOR SHARE",
            )
            .bind(game_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to lock game: {}", e)))?
            .ok_or_else(|| Error::NotFound(format!("Game not found: {}", game_id)))?;

        let past_end = match (start_time, duration_minutes) {
            (Some(start), Some(minutes)) => captured_at >= start + i64::from(minutes) * 60,
            _ => false,
        };
        if status != GameStatus::Active || past_end {
            return Ok(None);
        }

        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM bases WHERE id = $1 AND game_id = $2 FOR UPDATE",
        )
        .bind(base_id)
        .bind(game_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to lock base: {}", e)))?
        .ok_or_else(|| Error::NotFound(format!("Base not found: {}", base_id)))?;

        let event = sqlx::query_as::<_, CaptureEvent>(
            r#"
            INSERT INTO captures (id, game_id, base_id, team_id, captured_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, seq, game_id, base_id, team_id, captured_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(game_id)
        .bind(base_id)
        .bind(team_id)
        .bind(captured_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to record capture: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit capture: {}", e)))?;

        Ok(Some(event))
    }

    /// All captures of a game, per base in ledger order
    pub async fn get_by_game(&self, game_id: &str) -> Result<Vec<CaptureEvent>> {
        let result = sqlx::query_as::<_, CaptureEvent>(
            r#"
            SELECT id, seq, game_id, base_id, team_id, captured_at
            FROM captures
            WHERE game_id = $1
            ORDER BY base_id, captured_at, seq
            "#,
        )
        .bind(game_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get captures for game: {}", e)))?;

        Ok(result)
    }
}
