use crate::config::SecurityConfig;
use crate::db::models::game_models::Game;
use crate::error::Error;
use anyhow::Result;

pub mod password;

const MIN_ADMIN_PASSWORD_LEN: usize = 4;

/// Host credential handling for games
#[derive(Debug, Clone)]
pub struct SecurityService {
    config: SecurityConfig,
}

impl SecurityService {
    /// Create a new security service
    pub fn new(config: SecurityConfig) -> Self {
        Self { config }
    }

    /// Hash the admin password a host chose for a new game
    pub fn hash_admin_password(&self, admin_password: &str) -> Result<String> {
        if admin_password.chars().count() < MIN_ADMIN_PASSWORD_LEN {
            return Err(Error::Validation(format!(
                "Admin password must be at least {} characters",
                MIN_ADMIN_PASSWORD_LEN
            ))
            .into());
        }

        password::hash_password(admin_password, &self.config)
    }

    /// Check a presented credential against the game's host password
    pub fn authorize(&self, game: &Game, credential: &str) -> Result<()> {
        if password::verify_password(credential, &game.admin_password_hash)? {
            Ok(())
        } else {
            Err(Error::Unauthorized("Invalid admin password".to_string()).into())
        }
    }
}
