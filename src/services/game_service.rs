use crate::config::GameDefaultsConfig;
use crate::db::models::base_models::{Base, BaseView, NewBase};
use crate::db::models::capture_models::{CaptureEvent, CaptureRequest};
use crate::db::models::code_models::CodeBinding;
use crate::db::models::game_models::{
    CreateGame, Game, GameSettings, GameStatus, GameView, SettingsUpdate,
};
use crate::db::models::team_models::{NewTeam, Player, Team, TeamStanding, TeamUpdate};
use crate::error::Error;
use crate::security::password::generate_access_code;
use crate::security::SecurityService;
use crate::services::clock::Clock;
use crate::services::game_codes::{GameIdGenerator, MAX_PLAIN_ATTEMPTS, MAX_SUFFIX_ATTEMPTS};
use crate::services::geofence;
use crate::services::ledger::{CaptureLedger, LedgerSnapshot};
use crate::services::lifecycle::LifecycleController;
use crate::services::scoring;
use crate::services::settings::merge_settings;
use crate::store::GameStore;
use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const MAX_NAME_LEN: usize = 64;
const GENERATED_CODE_LEN: usize = 8;

static COLOR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color pattern is valid"));

/// Entry point for every game operation.
///
/// Each operation reads the clock once and brings the game up to date
/// through the lifecycle controller before acting on it.
pub struct GameService {
    store: Arc<dyn GameStore>,
    clock: Arc<dyn Clock>,
    security: SecurityService,
    ids: Arc<dyn GameIdGenerator>,
    defaults: GameDefaultsConfig,
    lifecycle: LifecycleController,
    ledger: CaptureLedger,
}

impl GameService {
    pub fn new(
        store: Arc<dyn GameStore>,
        clock: Arc<dyn Clock>,
        security: SecurityService,
        ids: Arc<dyn GameIdGenerator>,
        defaults: GameDefaultsConfig,
    ) -> Self {
        Self {
            lifecycle: LifecycleController::new(store.clone()),
            ledger: CaptureLedger::new(store.clone()),
            store,
            clock,
            security,
            ids,
            defaults,
        }
    }

    pub async fn health_check(&self) -> Result<bool> {
        self.store.health_check().await
    }

    /// Create a game in setup, returning it with its new id
    pub async fn create_game(&self, request: CreateGame) -> Result<Game> {
        let now = self.clock.now();
        let name = validate_name("Game name", &request.name)?;
        let host_name = match request.host_name.as_deref() {
            Some(host) if !host.trim().is_empty() => Some(validate_name("Host name", host)?),
            _ => None,
        };

        let defaults = GameSettings {
            capture_radius_meters: self.defaults.capture_radius_meters,
            points_interval_seconds: self.defaults.points_interval_seconds,
            auto_start_time: None,
            duration_minutes: None,
            max_teams: self.defaults.max_teams,
        };
        let settings = merge_settings(&defaults, &request.settings, now)?;
        let admin_password_hash = self.security.hash_admin_password(&request.admin_password)?;

        let mut game = Game {
            id: self.unique_game_id().await?,
            name,
            host_name,
            admin_password_hash,
            status: GameStatus::Setup,
            start_time: None,
            end_time: None,
            auto_start_time: None,
            duration_minutes: None,
            capture_radius_meters: 0,
            points_interval_seconds: 0,
            max_teams: 0,
            created_at: Utc::now(),
        };
        game.apply_settings(&settings);

        self.store.insert_game(&game).await?;
        info!("Created game {} ({})", game.id, game.name);

        Ok(game)
    }

    async fn unique_game_id(&self) -> Result<String> {
        for _ in 0..MAX_PLAIN_ATTEMPTS {
            let candidate = self.ids.generate();
            if self.store.get_game(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        for _ in 0..MAX_SUFFIX_ATTEMPTS {
            let candidate = self.ids.generate_with_suffix();
            if self.store.get_game(&candidate).await?.is_none() {
                return Ok(candidate);
            }
        }

        Err(Error::Conflict("Could not find a free game id, try again".to_string()).into())
    }

    /// Full view: teams with scores, bases with their current owner
    pub async fn get_game(&self, game_id: &str) -> Result<GameView> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;

        let snapshot = self.ledger.snapshot(&game.id).await?;
        let teams = self.standings(&game, &snapshot, now).await?;
        let reference = scoring::reference_time(&game, now);
        let bases = self
            .store
            .list_bases(&game.id)
            .await?
            .into_iter()
            .map(|base| BaseView {
                owned_by: snapshot.owner_at(&base.id, reference),
                id: base.id,
                name: base.name,
                lat: base.latitude,
                lng: base.longitude,
                access_code: base.access_code,
            })
            .collect();

        Ok(GameView {
            scheduled_end_time: game.scheduled_end_time(),
            settings: game.settings(),
            id: game.id,
            name: game.name,
            host_name: game.host_name,
            status: game.status,
            start_time: game.start_time,
            end_time: game.end_time,
            teams,
            bases,
        })
    }

    pub async fn start_game(&self, game_id: &str, credential: &str) -> Result<Game> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;
        self.security.authorize(&game, credential)?;

        self.lifecycle.start(&game, now).await
    }

    pub async fn end_game(&self, game_id: &str, credential: &str) -> Result<Game> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;
        self.security.authorize(&game, credential)?;

        self.lifecycle.end(&game, now).await
    }

    /// Apply a partial settings patch; the merged result is validated as a whole
    pub async fn update_settings(
        &self,
        game_id: &str,
        credential: &str,
        update: SettingsUpdate,
    ) -> Result<GameSettings> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;
        self.security.authorize(&game, credential)?;
        require_setup(&game, "Settings")?;

        if update.is_empty() {
            return Err(Error::Validation("No settings to update".to_string()).into());
        }

        let merged = merge_settings(&game.settings(), &update, now)?;
        if !self.store.update_settings(&game.id, &merged).await? {
            return Err(Error::State(format!(
                "Game {} left setup while its settings were being changed",
                game.id
            ))
            .into());
        }

        info!("Updated settings of game {}", game.id);
        Ok(merged)
    }

    pub async fn add_base(&self, game_id: &str, credential: &str, request: NewBase) -> Result<Base> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;
        self.security.authorize(&game, credential)?;
        require_setup(&game, "Bases")?;

        let name = validate_name("Base name", &request.name)?;
        validate_coordinates(request.latitude, request.longitude)?;

        let base = Base {
            id: Uuid::new_v4(),
            game_id: game.id.clone(),
            name,
            latitude: request.latitude,
            longitude: request.longitude,
            access_code: normalize_code(request.access_code),
            created_at: Utc::now(),
        };
        self.store.insert_base(&base).await?;
        info!("Added base {} ({}) to game {}", base.id, base.name, game.id);

        Ok(base)
    }

    /// Add a team; a join code is generated when none is given.
    ///
    /// The store re-checks setup and `max_teams` when it inserts.
    pub async fn add_team(&self, game_id: &str, credential: &str, request: NewTeam) -> Result<Team> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;
        self.security.authorize(&game, credential)?;
        require_setup(&game, "Teams")?;

        let name = validate_name("Team name", &request.name)?;
        let color = validate_color(&request.color)?;

        let access_code = normalize_code(request.access_code)
            .unwrap_or_else(|| generate_access_code(GENERATED_CODE_LEN));
        let team = Team {
            id: Uuid::new_v4(),
            game_id: game.id.clone(),
            name,
            color,
            access_code: Some(access_code),
            created_at: Utc::now(),
        };
        self.store.insert_team(&team).await?;
        info!("Added team {} ({}) to game {}", team.id, team.name, game.id);

        Ok(team)
    }

    /// Rename or recolor a team while the game is in setup
    pub async fn update_team(
        &self,
        team_id: &Uuid,
        credential: &str,
        update: TeamUpdate,
    ) -> Result<Team> {
        let now = self.clock.now();
        let team = self.require_team(team_id).await?;
        let game = self.lifecycle.load(&team.game_id, now).await?;
        self.security.authorize(&game, credential)?;

        require_setup(&game, "Teams")?;

        if update.name.is_none() && update.color.is_none() {
            return Err(Error::Validation("No fields to update".to_string()).into());
        }

        let update = TeamUpdate {
            name: update
                .name
                .map(|name| validate_name("Team name", &name))
                .transpose()?,
            color: update.color.map(|color| validate_color(&color)).transpose()?,
        };

        self.store
            .update_team(team_id, &update)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Team not found: {}", team_id)).into())
    }

    /// Register a new player on a team
    pub async fn join_team(&self, team_id: &Uuid) -> Result<Player> {
        let now = self.clock.now();
        let team = self.require_team(team_id).await?;
        let game = self.lifecycle.load(&team.game_id, now).await?;

        if game.status == GameStatus::Ended {
            return Err(Error::State(format!(
                "Game {} has ended, teams can no longer be joined",
                game.id
            ))
            .into());
        }

        let player = Player {
            id: Uuid::new_v4(),
            team_id: team.id,
            joined_at: now,
        };
        self.store.insert_player(&player).await?;
        info!("Player {} joined team {}", player.id, team.id);

        Ok(player)
    }

    /// Claim a base for the player's team.
    ///
    /// The capture is stamped with this operation's clock reading and only
    /// lands if the game is still active when the store appends it.
    pub async fn capture_base(&self, base_id: &Uuid, request: CaptureRequest) -> Result<CaptureEvent> {
        let now = self.clock.now();
        let base = self
            .store
            .get_base(base_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Base not found: {}", base_id)))?;
        let player = self
            .store
            .get_player(&request.player_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Player not found: {}", request.player_id)))?;
        let team = self.require_team(&player.team_id).await?;

        if team.game_id != base.game_id {
            return Err(Error::Validation(format!(
                "Team {} does not play in game {}",
                team.id, base.game_id
            ))
            .into());
        }

        let game = self.lifecycle.load(&base.game_id, now).await?;
        if game.status != GameStatus::Active {
            return Err(Error::State(format!(
                "Bases can only be captured while the game is active, game {} is {}",
                game.id,
                game.status.as_str()
            ))
            .into());
        }

        let distance = geofence::distance_meters(
            request.latitude,
            request.longitude,
            base.latitude,
            base.longitude,
        );
        if !geofence::is_within_radius(distance, f64::from(game.capture_radius_meters)) {
            warn!(
                "Rejected capture of base {} by team {}: {:.1} m away (radius {} m)",
                base.id, team.id, distance, game.capture_radius_meters
            );
            return Err(Error::GeofenceViolation {
                distance_meters: distance,
                radius_meters: game.capture_radius_meters,
            }
            .into());
        }

        let event = self
            .ledger
            .record_capture(&game.id, base.id, team.id, now)
            .await?
            .ok_or_else(|| Error::State(format!("Game {} is no longer active", game.id)))?;
        info!(
            "Team {} captured base {} in game {} at {}",
            team.id, base.id, game.id, now
        );

        Ok(event)
    }

    /// Standings sorted by score, highest first
    pub async fn get_scores(&self, game_id: &str) -> Result<Vec<TeamStanding>> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;

        let snapshot = self.ledger.snapshot(&game.id).await?;
        let mut standings = self.standings(&game, &snapshot, now).await?;
        standings.sort_by_key(|standing| Reverse(standing.score));
        Ok(standings)
    }

    pub async fn code_status(&self, code: &str) -> Result<CodeBinding> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::Validation("Access code must not be empty".to_string()).into());
        }

        self.store.resolve_code(code).await
    }

    /// Delete a game together with everything that belongs to it
    pub async fn delete_game(&self, game_id: &str, credential: &str) -> Result<()> {
        let now = self.clock.now();
        let game = self.lifecycle.load(game_id, now).await?;
        self.security.authorize(&game, credential)?;

        if !self.store.delete_game(&game.id).await? {
            return Err(Error::NotFound(format!("Game not found: {}", game.id)).into());
        }

        info!("Deleted game {}", game.id);
        Ok(())
    }

    async fn require_team(&self, team_id: &Uuid) -> Result<Team> {
        self.store
            .get_team(team_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Team not found: {}", team_id)).into())
    }

    /// Teams in creation order with player counts and scores
    async fn standings(
        &self,
        game: &Game,
        snapshot: &LedgerSnapshot,
        now: i64,
    ) -> Result<Vec<TeamStanding>> {
        let teams = self.store.list_teams(&game.id).await?;
        let counts = self.store.player_counts(&game.id).await?;
        let scores = scoring::score_game(game, snapshot, now);

        Ok(build_standings(teams, &counts, &scores))
    }
}

fn build_standings(
    teams: Vec<Team>,
    counts: &HashMap<Uuid, i64>,
    scores: &HashMap<Uuid, i64>,
) -> Vec<TeamStanding> {
    teams
        .into_iter()
        .map(|team| TeamStanding {
            player_count: counts.get(&team.id).copied().unwrap_or(0),
            score: scores.get(&team.id).copied().unwrap_or(0),
            id: team.id,
            name: team.name,
            color: team.color,
        })
        .collect()
}

fn require_setup(game: &Game, what: &str) -> Result<()> {
    if game.status != GameStatus::Setup {
        return Err(Error::State(format!(
            "{} can only be changed during setup, game {} is {}",
            what,
            game.id,
            game.status.as_str()
        ))
        .into());
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(format!("{} must not be empty", field)).into());
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        ))
        .into());
    }
    Ok(trimmed.to_string())
}

fn validate_color(color: &str) -> Result<String> {
    let color = color.trim();
    if !COLOR_PATTERN.is_match(color) {
        return Err(Error::Validation(format!(
            "Color must be in hex format (#RRGGBB), got {}",
            color
        ))
        .into());
    }
    Ok(color.to_string())
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::Validation(format!(
            "Latitude must be between -90 and 90, got {}",
            latitude
        ))
        .into());
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::Validation(format!(
            "Longitude must be between -180 and 180, got {}",
            longitude
        ))
        .into());
    }
    Ok(())
}

fn normalize_code(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_string()).filter(|c| !c.is_empty())
}
