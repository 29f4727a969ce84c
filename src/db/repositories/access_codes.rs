use crate::{
    db::{
        map_insert_error,
        models::code_models::{AccessCodeRow, CodeBinding},
    },
    error::Error,
};
use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use uuid::Uuid;

/// Access codes repository, resolving codes to the team or base they open
#[derive(Clone)]
pub struct AccessCodesRepository {
    pool: Arc<PgPool>,
}

impl AccessCodesRepository {
    /// Create a new access codes repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Look up what a code is bound to
    pub async fn resolve(&self, code: &str) -> Result<CodeBinding> {
        let result = sqlx::query_as::<_, AccessCodeRow>(
            r#"
            SELECT code, game_id, team_id, base_id
            FROM access_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to resolve access code: {}", e)))?;

        Ok(result.map_or(CodeBinding::Unassigned, CodeBinding::from))
    }
}

/// Bind a code inside the caller's transaction; a taken code is a `Conflict`
pub(crate) async fn bind(
    conn: &mut PgConnection,
    code: &str,
    game_id: &str,
    team_id: Option<Uuid>,
    base_id: Option<Uuid>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO access_codes (code, game_id, team_id, base_id)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(code)
    .bind(game_id)
    .bind(team_id)
    .bind(base_id)
    .execute(conn)
    .await
    .map_err(|e| {
        map_insert_error(
            e,
            || format!("Access code already assigned: {}", code),
            "bind access code",
        )
    })?;

    Ok(())
}

/// Release every code of a game inside the caller's transaction
pub(crate) async fn release_for_game(conn: &mut PgConnection, game_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM access_codes
        WHERE game_id = $1
        "#,
    )
    .bind(game_id)
    .execute(conn)
    .await
    .map_err(|e| Error::Database(format!("Failed to release access codes: {}", e)))?;

    Ok(result.rows_affected())
}
