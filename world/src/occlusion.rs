//! Line-of-sight screening for candidate roads.

use tower_siege_core::{ConnectionError, Obstacle, Rect, Segment, TowerId, Vec2};

/// Anything that can block a road.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Occluder {
    /// Circular footprint of a tower other than the road's endpoints.
    Tower {
        id: TowerId,
        center: Vec2,
        radius: f32,
    },
    /// Rectangular obstacle.
    Obstacle(Rect),
}

impl Occluder {
    pub(crate) fn from_obstacle(obstacle: &Obstacle) -> Self {
        Self::Obstacle(obstacle.bounds())
    }

    pub(crate) fn blocks(&self, road: &Segment) -> bool {
        match self {
            Self::Tower { center, radius, .. } => road.intersects_circle(*center, *radius),
            Self::Obstacle(bounds) => road.intersects_rect(bounds),
        }
    }

    fn as_error(&self) -> ConnectionError {
        match self {
            Self::Tower { id, .. } => ConnectionError::OccludedByTower(*id),
            Self::Obstacle(_) => ConnectionError::OccludedByObstacle,
        }
    }
}

/// Returns the first occluder blocking `road`, as a rejection reason.
pub(crate) fn screen<I>(road: &Segment, occluders: I) -> Result<(), ConnectionError>
where
    I: IntoIterator<Item = Occluder>,
{
    match occluders.into_iter().find(|occluder| occluder.blocks(road)) {
        Some(occluder) => Err(occluder.as_error()),
        None => Ok(()),
    }
}
