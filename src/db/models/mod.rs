pub mod base_models;
pub mod capture_models;
pub mod code_models;
pub mod game_models;
pub mod team_models;
