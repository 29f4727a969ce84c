//! Persistence seam of the game engine.

use crate::db::models::base_models::Base;
use crate::db::models::capture_models::CaptureEvent;
use crate::db::models::code_models::CodeBinding;
use crate::db::models::game_models::{Game, GameSettings};
use crate::db::models::team_models::{Player, Team, TeamUpdate};
use crate::services::lifecycle::{Transition, TransitionOutcome};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Keyed storage for games and everything that hangs off them.
///
/// Implementations must make `apply_transition`, `append_capture`,
/// `insert_team`/`insert_base` and `delete_game` atomic.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Fails with `Conflict` if the id is taken
    async fn insert_game(&self, game: &Game) -> Result<()>;

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>>;

    /// Write settings only if the game is still in setup. Returns whether it did.
    async fn update_settings(&self, game_id: &str, settings: &GameSettings) -> Result<bool>;

    /// Compare-and-set on status. `None` if the game was not in the
    /// transition's source status; ending also releases every access code
    /// of the game.
    async fn apply_transition(
        &self,
        game_id: &str,
        transition: Transition,
    ) -> Result<Option<TransitionOutcome>>;

    /// Remove the game with its teams, players, bases, captures and codes.
    /// Returns whether the game existed.
    async fn delete_game(&self, game_id: &str) -> Result<bool>;

    /// Insert a team and bind its access code, `Conflict` if the code is taken
    async fn insert_team(&self, team: &Team) -> Result<()>;

    async fn get_team(&self, team_id: &Uuid) -> Result<Option<Team>>;

    async fn list_teams(&self, game_id: &str) -> Result<Vec<Team>>;

    async fn update_team(&self, team_id: &Uuid, update: &TeamUpdate) -> Result<Option<Team>>;

    /// Insert a base and bind its access code, `Conflict` if the code is taken
    async fn insert_base(&self, base: &Base) -> Result<()>;

    async fn get_base(&self, base_id: &Uuid) -> Result<Option<Base>>;

    async fn list_bases(&self, game_id: &str) -> Result<Vec<Base>>;

    async fn resolve_code(&self, code: &str) -> Result<CodeBinding>;

    async fn insert_player(&self, player: &Player) -> Result<()>;

    async fn get_player(&self, player_id: &Uuid) -> Result<Option<Player>>;

    /// Players per team for a game; teams without players may be absent
    async fn player_counts(&self, game_id: &str) -> Result<HashMap<Uuid, i64>>;

    /// Serialized append. `None` if the game is not active at append time.
    async fn append_capture(
        &self,
        game_id: &str,
        base_id: Uuid,
        team_id: Uuid,
        captured_at: i64,
    ) -> Result<Option<CaptureEvent>>;

    /// Every capture of a game, ordered by base then `(captured_at, seq)`
    async fn list_captures(&self, game_id: &str) -> Result<Vec<CaptureEvent>>;
}
