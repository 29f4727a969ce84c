use crate::{
    db::{
        models::base_models::Base,
        repositories::{
            access_codes,
            games::{self, RowLock},
        },
    },
    error::Error,
};
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Bases repository
#[derive(Clone)]
pub struct BasesRepository {
    pool: Arc<PgPool>,
}

impl BasesRepository {
    /// Create a new bases repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a base and bind its access code in one transaction, while the
    /// game is in setup
    pub async fn create(&self, base: &Base) -> Result<()> {
        info!(
            "Creating new base: {} at ({}, {}) in game {}",
            base.name, base.latitude, base.longitude, base.game_id
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        games::lock_in_setup(&mut *tx, &base.game_id, RowLock::Share).await?;

        sqlx::query(
            r#"
            INSERT INTO bases (id, game_id, name, latitude, longitude, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(base.id)
        .bind(&base.game_id)
        .bind(&base.name)
        .bind(base.latitude)
        .bind(base.longitude)
        .bind(base.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to create base: {}", e)))?;

        if let Some(code) = &base.access_code {
            access_codes::bind(&mut *tx, code, &base.game_id, None, Some(base.id)).await?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit base: {}", e)))?;

        Ok(())
    }

    /// Get base by ID
    pub async fn get_by_id(&self, id: &Uuid) -> Result<Option<Base>> {
        let result = sqlx::query_as::<_, Base>(
            r#"
            SELECT b.id, b.game_id, b.name, b.latitude, b.longitude, c.code AS access_code, b.created_at
            FROM bases b
            LEFT JOIN access_codes c ON c.base_id = b.id
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get base by ID: {}", e)))?;

        Ok(result)
    }

    /// Get bases of a game in creation order
    pub async fn get_by_game(&self, game_id: &str) -> Result<Vec<Base>> {
        let result = sqlx::query_as::<_, Base>(
            r#"
            SELECT b.id, b.game_id, b.name, b.latitude, b.longitude, c.code AS access_code, b.created_at
            FROM bases b
            LEFT JOIN access_codes c ON c.base_id = b.id
            WHERE b.game_id = $1
            ORDER BY b.created_at
            "#,
        )
        .bind(game_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get bases for game: {}", e)))?;

        Ok(result)
    }
}
