use super::GameStore;
use crate::db::models::base_models::Base;
use crate::db::models::capture_models::CaptureEvent;
use crate::db::models::code_models::CodeBinding;
use crate::db::models::game_models::{Game, GameSettings};
use crate::db::models::team_models::{Player, Team, TeamUpdate};
use crate::db::repositories::{
    access_codes::AccessCodesRepository, bases::BasesRepository, captures::CapturesRepository,
    games::GamesRepository, teams::TeamsRepository,
};
use crate::services::lifecycle::{Transition, TransitionOutcome};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Postgres-backed store composed from the table repositories
#[derive(Clone)]
pub struct PgStore {
    games: GamesRepository,
    teams: TeamsRepository,
    bases: BasesRepository,
    captures: CapturesRepository,
    codes: AccessCodesRepository,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            games: GamesRepository::new(pool.clone()),
            teams: TeamsRepository::new(pool.clone()),
            bases: BasesRepository::new(pool.clone()),
            captures: CapturesRepository::new(pool.clone()),
            codes: AccessCodesRepository::new(pool),
        }
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn health_check(&self) -> Result<bool> {
        self.games.health_check().await
    }

    async fn insert_game(&self, game: &Game) -> Result<()> {
        self.games.create(game).await
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>> {
        self.games.get_by_id(game_id).await
    }

    async fn update_settings(&self, game_id: &str, settings: &GameSettings) -> Result<bool> {
        self.games.update_settings(game_id, settings).await
    }

    async fn apply_transition(
        &self,
        game_id: &str,
        transition: Transition,
    ) -> Result<Option<TransitionOutcome>> {
        self.games.transition(game_id, transition).await
    }

    async fn delete_game(&self, game_id: &str) -> Result<bool> {
        self.games.delete(game_id).await
    }

    async fn insert_team(&self, team: &Team) -> Result<()> {
        self.teams.create(team).await
    }

    async fn get_team(&self, team_id: &Uuid) -> Result<Option<Team>> {
        self.teams.get_by_id(team_id).await
    }

    async fn list_teams(&self, game_id: &str) -> Result<Vec<Team>> {
        self.teams.get_by_game(game_id).await
    }

    async fn update_team(&self, team_id: &Uuid, update: &TeamUpdate) -> Result<Option<Team>> {
        self.teams.update(team_id, update).await
    }

    async fn insert_base(&self, base: &Base) -> Result<()> {
        self.bases.create(base).await
    }

    async fn get_base(&self, base_id: &Uuid) -> Result<Option<Base>> {
        self.bases.get_by_id(base_id).await
    }

    async fn list_bases(&self, game_id: &str) -> Result<Vec<Base>> {
        self.bases.get_by_game(game_id).await
    }

    async fn resolve_code(&self, code: &str) -> Result<CodeBinding> {
        self.codes.resolve(code).await
    }

    async fn insert_player(&self, player: &Player) -> Result<()> {
        self.teams.add_player(player).await
    }

    async fn get_player(&self, player_id: &Uuid) -> Result<Option<Player>> {
        self.teams.get_player(player_id).await
    }

    async fn player_counts(&self, game_id: &str) -> Result<HashMap<Uuid, i64>> {
        self.teams.player_counts(game_id).await
    }

    async fn append_capture(
        &self,
        game_id: &str,
        base_id: Uuid,
        team_id: Uuid,
        captured_at: i64,
    ) -> Result<Option<CaptureEvent>> {
        self.captures
            .append(game_id, base_id, team_id, captured_at)
            .await
    }

    async fn list_captures(&self, game_id: &str) -> Result<Vec<CaptureEvent>> {
        self.captures.get_by_game(game_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use crate::db::models::game_models::GameStatus;
    use crate::error::Error;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;

    // Skip unless a scratch database is available
    async fn test_store() -> Result<Option<PgStore>> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("Skipping Postgres test. Set TEST_DATABASE_URL to run.");
                return Ok(None);
            }
        };
        let pool = PgPoolOptions::new().max_connections(4).connect(&url).await?;
        migrations::run_migrations(&pool).await?;
        Ok(Some(PgStore::new(Arc::new(pool))))
    }

    fn game() -> Game {
        Game {
            id: format!("pg-test-{}", Uuid::new_v4()),
            name: "Postgres".to_string(),
            host_name: Some("host".to_string()),
            admin_password_hash: "x".to_string(),
            status: GameStatus::Setup,
            start_time: None,
            end_time: None,
            auto_start_time: None,
            duration_minutes: None,
            capture_radius_meters: 15,
            points_interval_seconds: 15,
            max_teams: 8,
            created_at: Utc::now(),
        }
    }

    fn team(game_id: &str, code: &str) -> Team {
        Team {
            id: Uuid::new_v4(),
            game_id: game_id.to_string(),
            name: "Team".to_string(),
            color: "#00ff00".to_string(),
            access_code: Some(code.to_string()),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn end_releases_codes_once() -> Result<()> {
        let Some(store) = test_store().await? else {
            return Ok(());
        };
        let g = game();
        let code = format!("code-{}", Uuid::new_v4());
        store.insert_game(&g).await?;
        let t = team(&g.id, &code);
        store.insert_team(&t).await?;

        assert!(store
            .apply_transition(&g.id, Transition::Start { at: 10 })
            .await?
            .is_some());
        let first = store
            .apply_transition(&g.id, Transition::End { at: 20 })
            .await?;
        let second = store
            .apply_transition(&g.id, Transition::End { at: 30 })
            .await?;

        assert_eq!(
            first,
            Some(TransitionOutcome {
                applied: Transition::End { at: 20 },
                released_codes: 1,
            })
        );
        assert_eq!(second, None);
        assert_eq!(store.resolve_code(&code).await?, CodeBinding::Unassigned);
        assert_eq!(store.get_game(&g.id).await?.unwrap().end_time, Some(20));

        store.delete_game(&g.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn captures_follow_ledger_order() -> Result<()> {
        let Some(store) = test_store().await? else {
            return Ok(());
        };
        let g = game();
        store.insert_game(&g).await?;
        let t = team(&g.id, &format!("code-{}", Uuid::new_v4()));
        store.insert_team(&t).await?;
        let base = Base {
            id: Uuid::new_v4(),
            game_id: g.id.clone(),
            name: "Base".to_string(),
            latitude: 44.97,
            longitude: -93.23,
            access_code: None,
            created_at: Utc::now(),
        };
        store.insert_base(&base).await?;

        assert!(store.append_capture(&g.id, base.id, t.id, 5).await?.is_none());

        store.apply_transition(&g.id, Transition::Start { at: 1 }).await?;
        let a = store.append_capture(&g.id, base.id, t.id, 50).await?.unwrap();
        let b = store.append_capture(&g.id, base.id, t.id, 50).await?.unwrap();
        assert!(b.seq > a.seq);

        let captures = store.list_captures(&g.id).await?;
        assert_eq!(captures, vec![a, b]);

        assert!(store.delete_game(&g.id).await?);
        assert!(store.get_team(&t.id).await?.is_none());
        assert!(store.list_captures(&g.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn end_is_stamped_no_earlier_than_the_last_capture() -> Result<()> {
        let Some(store) = test_store().await? else {
            return Ok(());
        };
        let g = game();
        store.insert_game(&g).await?;
        let t = team(&g.id, &format!("code-{}", Uuid::new_v4()));
        store.insert_team(&t).await?;
        let base = Base {
            id: Uuid::new_v4(),
            game_id: g.id.clone(),
            name: "Base".to_string(),
            latitude: 44.97,
            longitude: -93.23,
            access_code: None,
            created_at: Utc::now(),
        };
        store.insert_base(&base).await?;
        store.apply_transition(&g.id, Transition::Start { at: 0 }).await?;
        store.append_capture(&g.id, base.id, t.id, 101).await?;

        let outcome = store
            .apply_transition(&g.id, Transition::End { at: 100 })
            .await?
            .unwrap();
        assert_eq!(outcome.applied, Transition::End { at: 101 });
        assert_eq!(store.get_game(&g.id).await?.unwrap().end_time, Some(101));

        store.delete_game(&g.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn team_inserts_stop_at_max_teams_and_after_setup() -> Result<()> {
        let Some(store) = test_store().await? else {
            return Ok(());
        };
        let g = Game { max_teams: 2, ..game() };
        store.insert_game(&g).await?;

        let t1 = team(&g.id, &format!("code-{}", Uuid::new_v4()));
        let t2 = team(&g.id, &format!("code-{}", Uuid::new_v4()));
        let t3 = team(&g.id, &format!("code-{}", Uuid::new_v4()));
        let (a, b, c) = tokio::join!(
            store.insert_team(&t1),
            store.insert_team(&t2),
            store.insert_team(&t3)
        );
        let rejected: Vec<_> = [a, b, c].into_iter().filter_map(|r| r.err()).collect();
        assert_eq!(rejected.len(), 1);
        assert!(matches!(
            rejected[0].downcast_ref::<Error>(),
            Some(Error::Validation(_))
        ));
        assert_eq!(store.list_teams(&g.id).await?.len(), 2);

        store.apply_transition(&g.id, Transition::Start { at: 1 }).await?;
        let late_base = Base {
            id: Uuid::new_v4(),
            game_id: g.id.clone(),
            name: "Late".to_string(),
            latitude: 44.97,
            longitude: -93.23,
            access_code: None,
            created_at: Utc::now(),
        };
        let err = store.insert_base(&late_base).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::State(_))));

        store.delete_game(&g.id).await?;
        Ok(())
    }
}
