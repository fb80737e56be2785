//! Authoritative tower state management utilities.

use std::time::Duration;

use tower_siege_core::{
    CapacityTable, PlayerId, Rect, TowerId, TowerSeed, TowerSnapshot, Vec2,
};

use crate::dispatch::DispatchCursor;

/// Upper bound on the intervals a single [`Cadence::advance`] reports.
///
/// Intervals beyond the bound are dropped along with their time, so one long
/// tick can never queue an unbounded number of spawns.
pub(crate) const MAX_INTERVALS_PER_ADVANCE: u32 = 1_024;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Accumulates simulated time toward a fixed interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Cadence {
    accumulated: Duration,
}

impl Cadence {
    /// Adds `dt` and reports how many full intervals elapsed, capped at
    /// [`MAX_INTERVALS_PER_ADVANCE`].
    pub(crate) fn advance(&mut self, dt: Duration, interval: Duration) -> u32 {
        if interval.is_zero() {
            return 0;
        }

        let total = self.accumulated.saturating_add(dt).as_nanos();
        let step = interval.as_nanos();
        let remainder = total % step;
        self.accumulated = Duration::new(
            u64::try_from(remainder / NANOS_PER_SEC).unwrap_or(u64::MAX),
            u32::try_from(remainder % NANOS_PER_SEC).unwrap_or(0),
        );

        u32::try_from(total / step)
            .unwrap_or(u32::MAX)
            .min(MAX_INTERVALS_PER_ADVANCE)
    }

    pub(crate) fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}

/// Mutable state of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) position: Vec2,
    pub(crate) radius: f32,
    pub(crate) owner: Option<PlayerId>,
    pub(crate) life: u32,
    pub(crate) outgoing: u32,
    pub(crate) cursor: DispatchCursor,
    pub(crate) spawn_timer: Cadence,
    pub(crate) growth_timer: Cadence,
}

impl TowerState {
    fn from_seed(id: TowerId, seed: &TowerSeed, max_life: u32) -> Self {
        Self {
            id,
            position: seed.position,
            radius: seed.radius,
            owner: seed.owner,
            life: seed.life.min(max_life),
            outgoing: 0,
            cursor: DispatchCursor::default(),
            spawn_timer: Cadence::default(),
            growth_timer: Cadence::default(),
        }
    }

    pub(crate) fn bounds(&self) -> Rect {
        Rect::from_center_size(self.position, Vec2::splat(self.radius * 2.0))
    }

    pub(crate) fn snapshot(&self, capacity: &CapacityTable) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            position: self.position,
            radius: self.radius,
            owner: self.owner,
            life: self.life,
            outgoing: self.outgoing,
            capacity: capacity.capacity_for(self.life),
        }
    }
}

/// Dense table of towers indexed by [`TowerId`].
#[derive(Debug, Default)]
pub(crate) struct TowerTable {
    entries: Vec<TowerState>,
}

impl TowerTable {
    /// Builds the table from layout seeds; seed order becomes identifier order.
    pub(crate) fn from_seeds(seeds: &[TowerSeed], max_life: u32) -> Self {
        let entries = seeds
            .iter()
            .enumerate()
            .filter_map(|(index, seed)| {
                let id = TowerId::new(u32::try_from(index).ok()?);
                Some(TowerState::from_seed(id, seed, max_life))
            })
            .collect();
        Self { entries }
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&TowerState> {
        let index = usize::try_from(id.get()).ok()?;
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        let index = usize::try_from(id.get()).ok()?;
        self.entries.get_mut(index)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.iter_mut()
    }

    pub(crate) fn count_owned_by(&self, player: PlayerId) -> usize {
        self.entries
            .iter()
            .filter(|tower| tower.owner == Some(player))
            .count()
    }
}
