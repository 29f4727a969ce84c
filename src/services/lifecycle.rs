//! Game lifecycle: setup -> active -> ended.
//!
//! There is no timer. Automatic transitions are computed from the game and
//! the current time whenever a game is touched, and written with a
//! compare-and-set on the status so concurrent readers apply them once.

use crate::db::models::game_models::{Game, GameStatus};
use crate::error::Error;
use crate::store::GameStore;
use anyhow::Result;
use log::{info, warn};
use std::fmt;
use std::sync::Arc;

/// Teams required before a game can start
pub const MIN_TEAMS_TO_START: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start { at: i64 },
    End { at: i64 },
}

impl Transition {
    /// Status the game must be in for the transition to apply
    pub fn from_status(&self) -> GameStatus {
        match self {
            Transition::Start { .. } => GameStatus::Setup,
            Transition::End { .. } => GameStatus::Active,
        }
    }

    pub fn to_status(&self) -> GameStatus {
        match self {
            Transition::Start { .. } => GameStatus::Active,
            Transition::End { .. } => GameStatus::Ended,
        }
    }

    /// Apply in place if the game is still in the expected status
    pub fn apply(&self, game: &mut Game) -> bool {
        if game.status != self.from_status() {
            return false;
        }
        match *self {
            Transition::Start { at } => game.start_time = Some(at),
            Transition::End { at } => game.end_time = Some(at),
        }
        game.status = self.to_status();
        true
    }
}

impl Transition {
    /// Push an end forward so it never lands before `last_capture`
    pub fn not_before(self, last_capture: Option<i64>) -> Transition {
        match (self, last_capture) {
            (Transition::End { at }, Some(last)) if last > at => Transition::End { at: last },
            _ => self,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Start { at } => write!(f, "start at {}", at),
            Transition::End { at } => write!(f, "end at {}", at),
        }
    }
}

/// Result of a transition that won the compare-and-set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionOutcome {
    /// What the store committed. An end is never stamped before the last
    /// capture already in the ledger.
    pub applied: Transition,
    pub released_codes: u64,
}

/// The automatic transition due at `now`, if any.
///
/// Auto-start stamps the evaluation time; auto-end stamps the computed
/// boundary so a late read doesn't stretch the game.
pub fn due_transition(game: &Game, now: i64) -> Option<Transition> {
    match game.status {
        GameStatus::Setup => match game.auto_start_time {
            Some(auto_start) if now >= auto_start => Some(Transition::Start { at: now }),
            _ => None,
        },
        GameStatus::Active => match game.scheduled_end_time() {
            Some(boundary) if now >= boundary => Some(Transition::End { at: boundary }),
            _ => None,
        },
        GameStatus::Ended => None,
    }
}

/// Pure form of the lazy evaluation: the game as it should be seen at `now`
pub fn advance(game: &Game, now: i64) -> Game {
    let mut game = game.clone();
    while let Some(transition) = due_transition(&game, now) {
        if !transition.apply(&mut game) {
            break;
        }
    }
    game
}

/// Drives lifecycle transitions against the store
#[derive(Clone)]
pub struct LifecycleController {
    store: Arc<dyn GameStore>,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// Load a game and bring it up to date with `now`
    pub async fn load(&self, game_id: &str, now: i64) -> Result<Game> {
        let game = self
            .store
            .get_game(game_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Game not found: {}", game_id)))?;

        Ok(self.refresh(game, now).await)
    }

    /// Apply any due automatic transitions. Never fails: a storage error
    /// leaves the caller with the snapshot it already had.
    pub async fn refresh(&self, mut game: Game, now: i64) -> Game {
        let mut target = advance(&game, now).status;

        // statuses only move forward, so every pass either progresses or stops
        while game.status != target {
            let Some(transition) = due_transition(&game, now) else {
                break;
            };

            match self.store.apply_transition(&game.id, transition).await {
                Ok(Some(outcome)) => {
                    info!(
                        "Game {} auto {} (released {} codes)",
                        game.id, outcome.applied, outcome.released_codes
                    );
                    outcome.applied.apply(&mut game);
                }
                Ok(None) => match self.store.get_game(&game.id).await {
                    // someone else got there first
                    Ok(Some(current)) => {
                        target = advance(&current, now).status;
                        game = current;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to reload game {} after transition: {}", game.id, e);
                        break;
                    }
                },
                Err(e) => {
                    warn!("Failed to apply auto {} to game {}: {}", transition, game.id, e);
                    break;
                }
            }
        }

        game
    }

    /// Manual setup -> active
    pub async fn start(&self, game: &Game, now: i64) -> Result<Game> {
        if game.status != GameStatus::Setup {
            return Err(Error::State(format!(
                "Game {} cannot be started, it is {}",
                game.id,
                game.status.as_str()
            ))
            .into());
        }

        let teams = self.store.list_teams(&game.id).await?;
        if teams.len() < MIN_TEAMS_TO_START {
            return Err(Error::State(format!(
                "At least {} teams are required to start the game",
                MIN_TEAMS_TO_START
            ))
            .into());
        }

        self.commit(game, Transition::Start { at: now }).await
    }

    /// Manual active -> ended
    pub async fn end(&self, game: &Game, now: i64) -> Result<Game> {
        if game.status != GameStatus::Active {
            return Err(Error::State(format!(
                "Game {} cannot be ended, it is {}",
                game.id,
                game.status.as_str()
            ))
            .into());
        }

        self.commit(game, Transition::End { at: now }).await
    }

    async fn commit(&self, game: &Game, transition: Transition) -> Result<Game> {
        match self.store.apply_transition(&game.id, transition).await? {
            Some(outcome) => {
                info!(
                    "Game {} {} (released {} codes)",
                    game.id, outcome.applied, outcome.released_codes
                );
                let mut game = game.clone();
                outcome.applied.apply(&mut game);
                Ok(game)
            }
            None => Err(Error::State(format!(
                "Game {} changed state while applying {}",
                game.id, transition
            ))
            .into()),
        }
    }
}
