use anyhow::Result;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Embedded migration scripts, applied in order. Each script is idempotent.
const MIGRATIONS: &[(&str, &str)] = &[
    ("001_create_games.sql", include_str!("sql/001_create_games.sql")),
    (
        "002_create_teams_and_bases.sql",
        include_str!("sql/002_create_teams_and_bases.sql"),
    ),
    ("003_create_captures.sql", include_str!("sql/003_create_captures.sql")),
];

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        execute_migration(pool, name, sql).await?;
    }

    Ok(())
}

async fn execute_migration(pool: &PgPool, name: &str, sql: &str) -> Result<()> {
    pool.execute(sql).await?;
    info!("Applied migration: {}", name);
    Ok(())
}
