//! Territory-control scoring.
//!
//! Each base's capture history is folded into ownership intervals in one
//! pass; a team earns `floor(seconds_held / points_interval)` per interval.

use crate::db::models::capture_models::CaptureEvent;
use crate::db::models::game_models::{Game, GameStatus};
use crate::services::ledger::LedgerSnapshot;
use std::collections::HashMap;
use uuid::Uuid;

/// Half-open span `[start, end)` during which `team_id` held a base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipInterval {
    pub team_id: Uuid,
    pub start: i64,
    pub end: i64,
}

impl OwnershipInterval {
    pub fn duration(&self) -> i64 {
        (self.end - self.start).max(0)
    }
}

/// End time closing the last interval of every base.
///
/// Once a game has ended this no longer depends on `now`.
pub fn reference_time(game: &Game, now: i64) -> i64 {
    match (game.status, game.end_time) {
        (GameStatus::Ended, Some(end_time)) => end_time,
        _ => now,
    }
}

/// Intervals of one base, given its events in `(captured_at, seq)` order
pub fn ownership_intervals(history: &[CaptureEvent], reference_time: i64) -> Vec<OwnershipInterval> {
    history
        .iter()
        .enumerate()
        .map(|(i, event)| OwnershipInterval {
            team_id: event.team_id,
            start: event.captured_at,
            end: history
                .get(i + 1)
                .map_or(reference_time, |next| next.captured_at),
        })
        .collect()
}

pub fn points_for(interval: &OwnershipInterval, points_interval_seconds: i32) -> i64 {
    interval.duration() / i64::from(points_interval_seconds.max(1))
}

/// Points per team across every base of the game. Teams that never held a
/// base are absent from the map.
pub fn score_game(game: &Game, ledger: &LedgerSnapshot, now: i64) -> HashMap<Uuid, i64> {
    let reference = reference_time(game, now);
    let mut scores: HashMap<Uuid, i64> = HashMap::new();

    for (_, history) in ledger.bases() {
        for interval in ownership_intervals(history, reference) {
            *scores.entry(interval.team_id).or_insert(0) +=
                points_for(&interval, game.points_interval_seconds);
        }
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ledger::event;
    use chrono::Utc;

    fn game(status: GameStatus, end_time: Option<i64>, points_interval_seconds: i32) -> Game {
        Game {
            id: "brave-falcon".to_string(),
            name: "Test".to_string(),
            host_name: None,
            admin_password_hash: String::new(),
            status,
            start_time: Some(0),
            end_time,
            auto_start_time: None,
            duration_minutes: None,
            capture_radius_meters: 15,
            points_interval_seconds,
            max_teams: 8,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn handover_splits_points() {
        let base = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = LedgerSnapshot::from_events(vec![event(base, a, 0, 1), event(base, b, 20, 2)]);

        let scores = score_game(&game(GameStatus::Active, None, 15), &ledger, 40);

        assert_eq!(scores[&a], 1);
        assert_eq!(scores[&b], 1);
    }

    #[test]
    fn intervals_cover_history_without_gaps() {
        let base = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let history = vec![
            event(base, a, 7, 1),
            event(base, b, 19, 2),
            event(base, c, 19, 3),
            event(base, a, 64, 4),
        ];

        let intervals = ownership_intervals(&history, 200);

        let total: i64 = intervals.iter().map(OwnershipInterval::duration).sum();
        assert_eq!(total, 200 - 7);
        for pair in intervals.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn ended_game_ignores_the_wall_clock() {
        let base = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = LedgerSnapshot::from_events(vec![event(base, a, 0, 1), event(base, b, 100, 2)]);
        let ended = game(GameStatus::Ended, Some(300), 15);

        let early = score_game(&ended, &ledger, 300);
        let late = score_game(&ended, &ledger, 1_000_000);

        assert_eq!(early, late);
        assert_eq!(late[&b], 13);
    }

    #[test]
    fn partial_quanta_are_discarded() {
        let base = Uuid::new_v4();
        let a = Uuid::new_v4();
        let ledger = LedgerSnapshot::from_events(vec![event(base, a, 0, 1)]);

        assert_eq!(score_game(&game(GameStatus::Active, None, 60), &ledger, 59)[&a], 0);
        assert_eq!(score_game(&game(GameStatus::Active, None, 60), &ledger, 179)[&a], 2);
    }

    #[test]
    fn points_sum_across_bases() {
        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ledger = LedgerSnapshot::from_events(vec![
            event(x, a, 0, 1),
            event(y, a, 10, 2),
            event(y, b, 40, 3),
        ]);

        let scores = score_game(&game(GameStatus::Active, None, 10), &ledger, 100);

        // x: a holds 100s; y: a holds 30s, b holds 60s
        assert_eq!(scores[&a], 13);
        assert_eq!(scores[&b], 6);
    }

    #[test]
    fn recapturing_own_base_truncates_the_running_interval() {
        let base = Uuid::new_v4();
        let a = Uuid::new_v4();
        let ledger = LedgerSnapshot::from_events(vec![event(base, a, 0, 1), event(base, a, 14, 2)]);

        // 14s and 16s each floor to zero and one quantum, versus two for an unbroken 30s
        let scores = score_game(&game(GameStatus::Active, None, 15), &ledger, 30);
        assert_eq!(scores[&a], 1);
    }

    #[test]
    fn capture_after_reference_time_scores_nothing() {
        let base = Uuid::new_v4();
        let a = Uuid::new_v4();
        let ledger = LedgerSnapshot::from_events(vec![event(base, a, 500, 1)]);

        let scores = score_game(&game(GameStatus::Ended, Some(300), 15), &ledger, 900);
        assert_eq!(scores[&a], 0);
    }

    #[test]
    fn no_captures_no_scores() {
        let scores = score_game(&game(GameStatus::Active, None, 15), &LedgerSnapshot::default(), 40);
        assert!(scores.is_empty());
    }
}
