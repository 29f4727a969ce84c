pub mod clock;
pub mod game_codes;
pub mod game_service;
pub mod geofence;
pub mod ledger;
pub mod lifecycle;
pub mod scoring;
pub mod settings;

pub use clock::{Clock, ManualClock, SystemClock};
pub use game_service::GameService;
