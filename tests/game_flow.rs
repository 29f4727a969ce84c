use anyhow::Result;
use geoflag::config::{GameDefaultsConfig, SecurityConfig};
use geoflag::db::models::base_models::NewBase;
use geoflag::db::models::capture_models::CaptureRequest;
use geoflag::db::models::game_models::{CreateGame, GameStatus, SettingsUpdate};
use geoflag::db::models::team_models::NewTeam;
use geoflag::security::SecurityService;
use geoflag::services::game_codes::WordPairGenerator;
use geoflag::services::{GameService, ManualClock};
use geoflag::store::MemoryStore;
use geoflag::Error;
use std::sync::Arc;

const PASSWORD: &str = "river-guard";
const START: i64 = 1_750_000_000;

fn service(clock: Arc<ManualClock>) -> GameService {
    GameService::new(
        Arc::new(MemoryStore::new()),
        clock,
        SecurityService::new(SecurityConfig {
            password_hash_cost: 4,
        }),
        Arc::new(WordPairGenerator),
        GameDefaultsConfig::default(),
    )
}

fn team(name: &str, color: &str, code: &str) -> NewTeam {
    NewTeam {
        name: name.to_string(),
        color: color.to_string(),
        access_code: Some(code.to_string()),
    }
}

fn base(name: &str, latitude: f64, longitude: f64, code: &str) -> NewBase {
    NewBase {
        name: name.to_string(),
        latitude,
        longitude,
        access_code: Some(code.to_string()),
    }
}

#[tokio::test]
async fn full_game_from_setup_to_final_scores() -> Result<()> {
    let clock = Arc::new(ManualClock::new(START));
    let games = service(clock.clone());

    let game = games
        .create_game(CreateGame {
            name: "Riverside".to_string(),
            host_name: Some("Sam".to_string()),
            admin_password: PASSWORD.to_string(),
            settings: SettingsUpdate {
                points_interval_seconds: Some(10),
                duration_minutes: Some(Some(30)),
                capture_radius_meters: Some(25),
                ..Default::default()
            },
        })
        .await?;

    let red = games
        .add_team(&game.id, PASSWORD, team("Red", "#ff0000", "TEAM-RED"))
        .await?;
    let blue = games
        .add_team(&game.id, PASSWORD, team("Blue", "#0000ff", "TEAM-BLUE"))
        .await?;
    let bridge = games
        .add_base(&game.id, PASSWORD, base("Bridge", 44.9740, -93.2277, "BASE-BRIDGE"))
        .await?;
    let mill = games
        .add_base(&game.id, PASSWORD, base("Mill", 44.9795, -93.2560, "BASE-MILL"))
        .await?;

    let red_player = games.join_team(&red.id).await?;
    let blue_player = games.join_team(&blue.id).await?;

    games.start_game(&game.id, PASSWORD).await?;

    // red holds the bridge from the start, blue takes it at +120
    games
        .capture_base(
            &bridge.id,
            CaptureRequest {
                player_id: red_player.id,
                latitude: 44.9741,
                longitude: -93.2277,
            },
        )
        .await?;
    clock.advance(60);
    games
        .capture_base(
            &mill.id,
            CaptureRequest {
                player_id: blue_player.id,
                latitude: 44.9795,
                longitude: -93.2560,
            },
        )
        .await?;
    clock.advance(60);
    games
        .capture_base(
            &bridge.id,
            CaptureRequest {
                player_id: blue_player.id,
                latitude: 44.9740,
                longitude: -93.2278,
            },
        )
        .await?;

    // too far from the mill
    let rejected = games
        .capture_base(
            &mill.id,
            CaptureRequest {
                player_id: red_player.id,
                latitude: 44.9740,
                longitude: -93.2277,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.downcast_ref::<Error>(),
        Some(Error::GeofenceViolation { .. })
    ));

    clock.advance(180);
    let live = games.get_scores(&game.id).await?;
    // blue: mill 240 s + bridge 180 s = 42 points; red: bridge 120 s = 12
    assert_eq!(live[0].id, blue.id);
    assert_eq!(live[0].score, 42);
    assert_eq!(live[1].score, 12);

    // the game runs out at +1800 and nobody is looking
    clock.advance(10_000);
    let view = games.get_game(&game.id).await?;
    assert_eq!(view.status, GameStatus::Ended);
    assert_eq!(view.end_time, Some(START + 1_800));
    assert!(view.bases.iter().all(|b| b.access_code.is_none()));

    let final_scores = games.get_scores(&game.id).await?;
    // blue: mill 1740 s + bridge 1680 s; red: bridge 120 s
    assert_eq!(final_scores[0].score, 174 + 168);
    assert_eq!(final_scores[1].score, 12);

    assert!(games.code_status("TEAM-RED").await?.is_free());
    assert!(games.code_status("BASE-MILL").await?.is_free());

    games.delete_game(&game.id, PASSWORD).await?;
    assert!(games.get_game(&game.id).await.is_err());
    Ok(())
}
