//! Destination selection for units dispatched by a tower.
//!
//! A tower keeps a [`DispatchCursor`] across spawns while the set of live
//! destinations can change between any two spawns. The strategy decides how
//! the cursor is interpreted against the destinations present at spawn time.

use std::fmt;

use tower_siege_core::{DispatchMode, TowerId};

/// Per-tower dispatch bookkeeping carried between spawns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchCursor {
    /// Position to serve next, interpreted modulo the live destination count.
    pub position: usize,
    /// Destination served by the previous dispatch, if any.
    pub last_served: Option<TowerId>,
}

/// Chooses the destination of the next unit a tower dispatches.
pub trait DispatchStrategy: fmt::Debug {
    /// Selects a destination from `live`, which is ordered by tower id and free
    /// of duplicates, and advances `cursor`. Returns `None` when `live` is empty.
    fn next_destination(&self, cursor: &mut DispatchCursor, live: &[TowerId]) -> Option<TowerId>;
}

/// Round-robin over list positions. Adding or removing a destination shifts
/// which tower the stored position refers to.
#[derive(Clone, Copy, Debug, Default)]
pub struct LiveOrder;

impl DispatchStrategy for LiveOrder {
    fn next_destination(&self, cursor: &mut DispatchCursor, live: &[TowerId]) -> Option<TowerId> {
        if live.is_empty() {
            return None;
        }

        let index = cursor.position % live.len();
        let destination = live[index];
        cursor.position = index + 1;
        cursor.last_served = Some(destination);
        Some(destination)
    }
}

/// Round-robin keyed by destination id: serves the smallest id above the last
/// served one, wrapping to the smallest id overall.
#[derive(Clone, Copy, Debug, Default)]
pub struct StableOrder;

impl DispatchStrategy for StableOrder {
    fn next_destination(&self, cursor: &mut DispatchCursor, live: &[TowerId]) -> Option<TowerId> {
        let first = *live.first()?;
        let destination = cursor
            .last_served
            .and_then(|last| live.iter().copied().find(|candidate| *candidate > last))
            .unwrap_or(first);

        cursor.position = live
            .iter()
            .position(|candidate| *candidate == destination)
            .map_or(0, |index| index + 1);
        cursor.last_served = Some(destination);
        Some(destination)
    }
}

/// Builds the strategy selected by the match rules.
#[must_use]
pub fn strategy_for(mode: DispatchMode) -> Box<dyn DispatchStrategy> {
    match mode {
        DispatchMode::LiveOrder => Box::new(LiveOrder),
        DispatchMode::StableOrder => Box::new(StableOrder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u32]) -> Vec<TowerId> {
        values.iter().copied().map(TowerId::new).collect()
    }

    fn serve(strategy: &dyn DispatchStrategy, cursor: &mut DispatchCursor, live: &[TowerId]) -> u32 {
        strategy
            .next_destination(cursor, live)
            .map(|id| id.get())
            .expect("destination available")
    }

    #[test]
    fn live_order_cycles_through_destinations() {
        let live = ids(&[2, 5, 9]);
        let mut cursor = DispatchCursor::default();
        let served: Vec<u32> = (0..4).map(|_| serve(&LiveOrder, &mut cursor, &live)).collect();
        assert_eq!(served, vec![2, 5, 9, 2]);
    }

    #[test]
    fn live_order_drifts_when_destinations_change() {
        let mut cursor = DispatchCursor::default();
        assert_eq!(serve(&LiveOrder, &mut cursor, &ids(&[2, 5])), 2);
        // A new destination with a smaller id shifts every position by one.
        assert_eq!(serve(&LiveOrder, &mut cursor, &ids(&[1, 2, 5])), 2);
        assert_eq!(serve(&LiveOrder, &mut cursor, &ids(&[1, 2, 5])), 5);
    }

    #[test]
    fn stable_order_survives_destination_changes() {
        let mut cursor = DispatchCursor::default();
        assert_eq!(serve(&StableOrder, &mut cursor, &ids(&[2, 5])), 2);
        assert_eq!(serve(&StableOrder, &mut cursor, &ids(&[1, 2, 5])), 5);
        assert_eq!(serve(&StableOrder, &mut cursor, &ids(&[1, 2, 5])), 1);
        assert_eq!(serve(&StableOrder, &mut cursor, &ids(&[1, 5])), 5);
    }

    #[test]
    fn empty_destination_list_yields_nothing() {
        let mut cursor = DispatchCursor::default();
        assert!(LiveOrder.next_destination(&mut cursor, &[]).is_none());
        assert!(StableOrder.next_destination(&mut cursor, &[]).is_none());
        assert_eq!(cursor, DispatchCursor::default());
    }

    #[test]
    fn strategy_follows_rules_mode() {
        assert_eq!(format!("{:?}", strategy_for(DispatchMode::LiveOrder)), "LiveOrder");
        assert_eq!(format!("{:?}", strategy_for(DispatchMode::StableOrder)), "StableOrder");
    }
}
