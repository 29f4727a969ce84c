use super::GameStore;
use crate::db::models::base_models::Base;
use crate::db::models::capture_models::CaptureEvent;
use crate::db::models::code_models::CodeBinding;
use crate::db::models::game_models::{Game, GameSettings, GameStatus};
use crate::db::models::team_models::{Player, Team, TeamUpdate};
use crate::error::Error;
use crate::services::lifecycle::{Transition, TransitionOutcome};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    games: HashMap<String, Game>,
    teams: HashMap<Uuid, Team>,
    bases: HashMap<Uuid, Base>,
    players: HashMap<Uuid, Player>,
    captures: Vec<CaptureEvent>,
    codes: HashMap<String, CodeBinding>,
    next_seq: i64,
}

impl MemoryState {
    fn require_game(&self, game_id: &str) -> Result<&Game> {
        self.games
            .get(game_id)
            .ok_or_else(|| Error::NotFound(format!("Game not found: {}", game_id)).into())
    }

    fn require_setup(&self, game_id: &str) -> Result<&Game> {
        let game = self.require_game(game_id)?;
        if game.status != GameStatus::Setup {
            return Err(Error::State(format!(
                "Game {} is {}; teams and bases can only be added during setup",
                game_id,
                game.status.as_str()
            ))
            .into());
        }
        Ok(game)
    }

    fn last_capture_at(&self, game_id: &str) -> Option<i64> {
        self.captures
            .iter()
            .filter(|c| c.game_id == game_id)
            .map(|c| c.captured_at)
            .max()
    }

    fn claim_code(&self, code: &Option<String>) -> Result<()> {
        match code {
            Some(code) if self.codes.contains_key(code) => {
                Err(Error::Conflict(format!("Access code already assigned: {}", code)).into())
            }
            _ => Ok(()),
        }
    }

    fn release_codes(&mut self, game_id: &str) -> u64 {
        let before = self.codes.len();
        self.codes.retain(|_, binding| match binding {
            CodeBinding::Team { game_id: g, .. } | CodeBinding::Base { game_id: g, .. } => g != game_id,
            CodeBinding::Unassigned => true,
        });
        for team in self.teams.values_mut().filter(|t| t.game_id == game_id) {
            team.access_code = None;
        }
        for base in self.bases.values_mut().filter(|b| b.game_id == game_id) {
            base.access_code = None;
        }
        (before - self.codes.len()) as u64
    }
}

/// In-process store; a single lock serializes every write
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn insert_game(&self, game: &Game) -> Result<()> {
        let mut state = self.state.write().await;
        if state.games.contains_key(&game.id) {
            return Err(Error::Conflict(format!("Game id already in use: {}", game.id)).into());
        }
        state.games.insert(game.id.clone(), game.clone());
        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<Game>> {
        Ok(self.state.read().await.games.get(game_id).cloned())
    }

    async fn update_settings(&self, game_id: &str, settings: &GameSettings) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.games.get_mut(game_id) {
            Some(game) if game.status == GameStatus::Setup => {
                game.apply_settings(settings);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn apply_transition(
        &self,
        game_id: &str,
        transition: Transition,
    ) -> Result<Option<TransitionOutcome>> {
        let mut state = self.state.write().await;
        let transition = transition.not_before(state.last_capture_at(game_id));
        let applied = match state.games.get_mut(game_id) {
            Some(game) => transition.apply(game),
            None => false,
        };
        if !applied {
            return Ok(None);
        }

        let released_codes = match transition {
            Transition::End { .. } => state.release_codes(game_id),
            Transition::Start { .. } => 0,
        };
        Ok(Some(TransitionOutcome {
            applied: transition,
            released_codes,
        }))
    }

    async fn delete_game(&self, game_id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.games.remove(game_id).is_none() {
            return Ok(false);
        }

        state.release_codes(game_id);
        state.captures.retain(|c| c.game_id != game_id);
        state.bases.retain(|_, b| b.game_id != game_id);
        let team_ids: Vec<Uuid> = state
            .teams
            .values()
            .filter(|t| t.game_id == game_id)
            .map(|t| t.id)
            .collect();
        state.players.retain(|_, p| !team_ids.contains(&p.team_id));
        state.teams.retain(|_, t| t.game_id != game_id);
        Ok(true)
    }

    async fn insert_team(&self, team: &Team) -> Result<()> {
        let mut state = self.state.write().await;
        let max_teams = state.require_setup(&team.game_id)?.max_teams;
        let current = state.teams.values().filter(|t| t.game_id == team.game_id).count();
        if current >= max_teams as usize {
            return Err(Error::Validation(format!(
                "Game {} already has the maximum of {} teams",
                team.game_id, max_teams
            ))
            .into());
        }
        state.claim_code(&team.access_code)?;

        if let Some(code) = &team.access_code {
            state.codes.insert(
                code.clone(),
                CodeBinding::Team {
                    team_id: team.id,
                    game_id: team.game_id.clone(),
                },
            );
        }
        state.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn get_team(&self, team_id: &Uuid) -> Result<Option<Team>> {
        Ok(self.state.read().await.teams.get(team_id).cloned())
    }

    async fn list_teams(&self, game_id: &str) -> Result<Vec<Team>> {
        let state = self.state.read().await;
        let mut teams: Vec<Team> = state
            .teams
            .values()
            .filter(|t| t.game_id == game_id)
            .cloned()
            .collect();
        teams.sort_by_key(|t| t.created_at);
        Ok(teams)
    }

    async fn update_team(&self, team_id: &Uuid, update: &TeamUpdate) -> Result<Option<Team>> {
        let mut state = self.state.write().await;
        Ok(state.teams.get_mut(team_id).map(|team| {
            if let Some(name) = &update.name {
                team.name = name.clone();
            }
            if let Some(color) = &update.color {
                team.color = color.clone();
            }
            team.clone()
        }))
    }

    async fn insert_base(&self, base: &Base) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_setup(&base.game_id)?;
        state.claim_code(&base.access_code)?;

        if let Some(code) = &base.access_code {
            state.codes.insert(
                code.clone(),
                CodeBinding::Base {
                    base_id: base.id,
                    game_id: base.game_id.clone(),
                },
            );
        }
        state.bases.insert(base.id, base.clone());
        Ok(())
    }

    async fn get_base(&self, base_id: &Uuid) -> Result<Option<Base>> {
        Ok(self.state.read().await.bases.get(base_id).cloned())
    }

    async fn list_bases(&self, game_id: &str) -> Result<Vec<Base>> {
        let state = self.state.read().await;
        let mut bases: Vec<Base> = state
            .bases
            .values()
            .filter(|b| b.game_id == game_id)
            .cloned()
            .collect();
        bases.sort_by_key(|b| b.created_at);
        Ok(bases)
    }

    async fn resolve_code(&self, code: &str) -> Result<CodeBinding> {
        let state = self.state.read().await;
        Ok(state
            .codes
            .get(code)
            .cloned()
            .unwrap_or(CodeBinding::Unassigned))
    }

    async fn insert_player(&self, player: &Player) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.teams.contains_key(&player.team_id) {
            return Err(Error::NotFound(format!("Team not found: {}", player.team_id)).into());
        }
        state.players.insert(player.id, player.clone());
        Ok(())
    }

    async fn get_player(&self, player_id: &Uuid) -> Result<Option<Player>> {
        Ok(self.state.read().await.players.get(player_id).cloned())
    }

    async fn player_counts(&self, game_id: &str) -> Result<HashMap<Uuid, i64>> {
        let state = self.state.read().await;
        let mut counts = HashMap::new();
        for player in state.players.values() {
            let in_game = state
                .teams
                .get(&player.team_id)
                .map_or(false, |t| t.game_id == game_id);
            if in_game {
                *counts.entry(player.team_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn append_capture(
        &self,
        game_id: &str,
        base_id: Uuid,
        team_id: Uuid,
        captured_at: i64,
    ) -> Result<Option<CaptureEvent>> {
        let mut state = self.state.write().await;
        let game = state.require_game(game_id)?;
        let past_end = game
            .scheduled_end_time()
            .map_or(false, |end| captured_at >= end);
        if game.status != GameStatus::Active || past_end {
            return Ok(None);
        }
        if !state.bases.contains_key(&base_id) {
            return Err(Error::NotFound(format!("Base not found: {}", base_id)).into());
        }

        state.next_seq += 1;
        let event = CaptureEvent {
            id: Uuid::new_v4(),
            seq: state.next_seq,
            game_id: game_id.to_string(),
            base_id,
            team_id,
            captured_at,
        };
        state.captures.push(event.clone());
        Ok(Some(event))
    }

    async fn list_captures(&self, game_id: &str) -> Result<Vec<CaptureEvent>> {
        let state = self.state.read().await;
        let mut captures: Vec<CaptureEvent> = state
            .captures
            .iter()
            .filter(|c| c.game_id == game_id)
            .cloned()
            .collect();
        captures.sort_by_key(|c| (c.base_id, c.captured_at, c.seq));
        Ok(captures)
    }
}
