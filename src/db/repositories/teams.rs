use crate::{
    db::{
        models::team_models::{Player, Team, TeamUpdate},
        repositories::{
            access_codes,
            games::{self, RowLock},
        },
    },
    error::Error,
};
use anyhow::Result;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Teams repository for handling team and player operations
#[derive(Clone)]
pub struct TeamsRepository {
    pool: Arc<PgPool>,
}

impl TeamsRepository {
    /// Create a new teams repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a team and bind its access code in one transaction, while the
    /// game is in setup and below `max_teams`
    pub async fn create(&self, team: &Team) -> Result<()> {
        info!("Creating new team: {} in game {}", team.name, team.game_id);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to begin transaction: {}", e)))?;

        // Exclusive so concurrent adds count teams one at a time
        let max_teams = games::lock_in_setup(&mut *tx, &team.game_id, RowLock::Update).await?;
        let current = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams WHERE game_id = $1")
            .bind(&team.game_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Error::Database(format!("Failed to count teams: {}", e)))?;
        if current >= i64::from(max_teams) {
            return Err(Error::Validation(format!(
                "Game {} already has the maximum of {} teams",
                team.game_id, max_teams
            ))
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO teams (id, game_id, name, color, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(team.id)
        .bind(&team.game_id)
        .bind(&team.name)
        .bind(&team.color)
        .bind(team.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| Error::Database(format!("Failed to create team: {}", e)))?;

        if let Some(code) = &team.access_code {
            access_codes::bind(&mut *tx, code, &team.game_id, Some(team.id), None).await?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit team: {}", e)))?;

        Ok(())
    }

    /// Get team by ID
    pub async fn get_by_id(&self, id: &Uuid) -> Result<Option<Team>> {
        let result = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.game_id, t.name, t.color, c.code AS access_code, t.created_at
            FROM teams t
            LEFT JOIN access_codes c ON c.team_id = t.id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get team by ID: {}", e)))?;

        Ok(result)
    }

    /// Get teams of a game in creation order
    pub async fn get_by_game(&self, game_id: &str) -> Result<Vec<Team>> {
        let result = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.game_id, t.name, t.color, c.code AS access_code, t.created_at
            FROM teams t
            LEFT JOIN access_codes c ON c.team_id = t.id
            WHERE t.game_id = $1
            ORDER BY t.created_at
            "#,
        )
        .bind(game_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get teams for game: {}", e)))?;

        Ok(result)
    }

    /// Update team name and/or color
    pub async fn update(&self, id: &Uuid, update: &TeamUpdate) -> Result<Option<Team>> {
        let result = sqlx::query(
            r#"
            UPDATE teams
            SET name = COALESCE($2, name), color = COALESCE($3, color)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.color)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update team: {}", e)))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Add a player to a team
    pub async fn add_player(&self, player: &Player) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO players (id, team_id, joined_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(player.id)
        .bind(player.team_id)
        .bind(player.joined_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to add player: {}", e)))?;

        Ok(())
    }

    /// Get player by ID
    pub async fn get_player(&self, id: &Uuid) -> Result<Option<Player>> {
        let result = sqlx::query_as::<_, Player>(
            r#"
            SELECT id, team_id, joined_at
            FROM players
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get player by ID: {}", e)))?;

        Ok(result)
    }

    /// Count players per team for a game
    pub async fn player_counts(&self, game_id: &str) -> Result<HashMap<Uuid, i64>> {
        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            r#"
            SELECT p.team_id, COUNT(*)
            FROM players p
            JOIN teams t ON t.id = p.team_id
            WHERE t.game_id = $1
            GROUP BY p.team_id
            "#,
        )
        .bind(game_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to count players: {}", e)))?;

        Ok(rows.into_iter().collect())
    }
}
