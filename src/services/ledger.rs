use crate::db::models::capture_models::CaptureEvent;
use crate::store::GameStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Append-only record of captures, backed by the store
#[derive(Clone)]
pub struct CaptureLedger {
    store: Arc<dyn GameStore>,
}

impl CaptureLedger {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self { store }
    }

    /// Append a capture. Recaptures and out-of-order timestamps are accepted
    /// as-is. Returns `None` when the game is no longer active at the moment
    /// of the append.
    pub async fn record_capture(
        &self,
        game_id: &str,
        base_id: Uuid,
        team_id: Uuid,
        timestamp: i64,
    ) -> Result<Option<CaptureEvent>> {
        self.store
            .append_capture(game_id, base_id, team_id, timestamp)
            .await
    }

    /// Load every capture of a game into an ordered snapshot
    pub async fn snapshot(&self, game_id: &str) -> Result<LedgerSnapshot> {
        let events = self.store.list_captures(game_id).await?;
        Ok(LedgerSnapshot::from_events(events))
    }
}

/// Per-base capture history, each base's events sorted by `(captured_at, seq)`
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    by_base: HashMap<Uuid, Vec<CaptureEvent>>,
}

impl LedgerSnapshot {
    pub fn from_events(events: impl IntoIterator<Item = CaptureEvent>) -> Self {
        let mut by_base: HashMap<Uuid, Vec<CaptureEvent>> = HashMap::new();
        for event in events {
            by_base.entry(event.base_id).or_default().push(event);
        }
        for history in by_base.values_mut() {
            history.sort_by_key(CaptureEvent::order_key);
        }
        Self { by_base }
    }

    pub fn events_for(&self, base_id: &Uuid) -> &[CaptureEvent] {
        self.by_base.get(base_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bases(&self) -> impl Iterator<Item = (&Uuid, &[CaptureEvent])> {
        self.by_base.iter().map(|(id, events)| (id, events.as_slice()))
    }

    /// Team of the latest capture at or before `as_of`, `None` if unowned
    pub fn owner_at(&self, base_id: &Uuid, as_of: i64) -> Option<Uuid> {
        let history = self.events_for(base_id);
        let idx = history.partition_point(|event| event.captured_at <= as_of);
        idx.checked_sub(1).map(|i| history[i].team_id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_base.values().map(Vec::len).sum()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
pub(crate) fn event(base_id: Uuid, team_id: Uuid, captured_at: i64, seq: i64) -> CaptureEvent {
    CaptureEvent {
        id: Uuid::new_v4(),
        seq,
        game_id: "test-game".to_string(),
        base_id,
        team_id,
        captured_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unowned_before_first_capture() {
        let base = Uuid::new_v4();
        let team = Uuid::new_v4();
        let snapshot = LedgerSnapshot::from_events(vec![event(base, team, 100, 1)]);

        assert_eq!(snapshot.owner_at(&base, 99), None);
        assert_eq!(snapshot.owner_at(&base, 100), Some(team));
        assert_eq!(snapshot.owner_at(&Uuid::new_v4(), 100), None);
    }

    #[test]
    fn ownership_switches_at_the_capture_second() {
        let base = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let snapshot = LedgerSnapshot::from_events(vec![event(base, a, 0, 1), event(base, b, 20, 2)]);

        assert_eq!(snapshot.owner_at(&base, 19), Some(a));
        assert_eq!(snapshot.owner_at(&base, 20), Some(b));
        assert_eq!(snapshot.owner_at(&base, 1_000), Some(b));
    }

    #[test]
    fn same_second_ties_go_to_the_later_arrival() {
        let base = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        // handed over out of arrival order on purpose
        let snapshot = LedgerSnapshot::from_events(vec![event(base, b, 50, 8), event(base, a, 50, 7)]);

        assert_eq!(snapshot.owner_at(&base, 50), Some(b));
        assert_eq!(snapshot.events_for(&base)[0].team_id, a);
    }

    #[test]
    fn events_are_grouped_per_base() {
        let (x, y) = (Uuid::new_v4(), Uuid::new_v4());
        let team = Uuid::new_v4();
        let snapshot = LedgerSnapshot::from_events(vec![
            event(x, team, 10, 1),
            event(y, team, 5, 2),
            event(x, team, 30, 3),
        ]);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.events_for(&x).len(), 2);
        assert_eq!(snapshot.events_for(&y).len(), 1);
        assert_eq!(snapshot.bases().count(), 2);
    }
}
