//! Units travelling along roads.

use tower_siege_core::{PlayerId, Segment, TowerId, UnitId, UnitSnapshot, Vec2};

#[derive(Clone, Debug)]
pub(crate) struct UnitState {
    pub(crate) id: UnitId,
    pub(crate) owner: PlayerId,
    pub(crate) source: TowerId,
    pub(crate) target: TowerId,
    road: Segment,
    progress: f32,
}

impl UnitState {
    pub(crate) fn new(
        id: UnitId,
        owner: PlayerId,
        source: TowerId,
        target: TowerId,
        road: Segment,
    ) -> Self {
        Self {
            id,
            owner,
            source,
            target,
            road,
            progress: 0.0,
        }
    }

    /// Moves the unit `distance` world units along its road.
    pub(crate) fn advance(&mut self, distance: f32) {
        let length = self.road.length();
        if length <= f32::EPSILON {
            self.progress = 1.0;
            return;
        }
        self.progress = (self.progress + distance / length).min(1.0);
    }

    pub(crate) fn has_arrived(&self) -> bool {
        self.progress >= 1.0
    }

    pub(crate) fn position(&self) -> Vec2 {
        self.road.point_at(self.progress)
    }

    /// Reports whether two units of different owners touch.
    pub(crate) fn collides_with(&self, other: &UnitState, radius: f32) -> bool {
        self.owner != other.owner && self.position().distance(other.position()) < radius * 2.0
    }

    pub(crate) fn snapshot(&self, radius: f32) -> UnitSnapshot {
        UnitSnapshot {
            id: self.id,
            owner: self.owner,
            source: self.source,
            target: self.target,
            progress: self.progress,
            position: self.position(),
            radius,
        }
    }
}

/// Pairs up opposing units that touch, scanning in identifier order.
///
/// Each unit is destroyed by at most one collision; the returned pairs name
/// the unit that detected the overlap first.
pub(crate) fn resolve_collisions(units: &[UnitState], radius: f32) -> Vec<(usize, usize)> {
    let mut destroyed = vec![false; units.len()];
    let mut pairs = Vec::new();

    for first in 0..units.len() {
        if destroyed[first] {
            continue;
        }
        for second in (first + 1)..units.len() {
            if destroyed[second] {
                continue;
            }
            if units[first].collides_with(&units[second], radius) {
                destroyed[first] = true;
                destroyed[second] = true;
                pairs.push((first, second));
                break;
            }
        }
    }

    pairs
}
