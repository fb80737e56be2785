#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tower Siege engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and opponents submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then reports [`Event`] values in
//! the order they happened. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod geometry;
mod rules;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use geometry::{Rect, Segment};
pub use glam::Vec2;
pub use rules::{CapacityTable, CapacityTier, DispatchMode, Rules, RulesError};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Requests a directed connection from one tower to another.
    CreateConnection {
        /// Tower that will dispatch units along the connection.
        from: TowerId,
        /// Tower that receives the dispatched units.
        to: TowerId,
    },
    /// Requests removal of a directed connection.
    RemoveConnection {
        /// Source tower of the connection.
        from: TowerId,
        /// Destination tower of the connection.
        to: TowerId,
    },
    /// Severs the acting player's connections that cross the drawn line.
    Cut {
        /// First point of the cutting gesture in world units.
        start: Vec2,
        /// Last point of the cutting gesture in world units.
        end: Vec2,
        /// Player performing the cut; only their connections are affected.
        player: PlayerId,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A tower dispatched a unit along one of its connections.
    UnitSpawned {
        /// Identifier assigned to the new unit.
        unit: UnitId,
        /// Player owning the unit.
        owner: PlayerId,
        /// Tower the unit departed from.
        source: TowerId,
        /// Tower the unit travels toward.
        target: TowerId,
    },
    /// A unit reached its target tower and applied its effect.
    UnitArrived {
        /// Identifier of the arriving unit.
        unit: UnitId,
        /// Player owning the unit.
        owner: PlayerId,
        /// Tower that received the unit.
        target: TowerId,
    },
    /// Two opposing units met in transit and destroyed each other.
    UnitsCollided {
        /// Unit that detected the collision.
        first: UnitId,
        /// Opposing unit destroyed alongside it.
        second: UnitId,
    },
    /// A tower's life changed through growth, reinforcement, or damage.
    TowerLifeChanged {
        /// Tower whose life changed.
        tower: TowerId,
        /// Life after the change.
        life: u32,
    },
    /// A tower changed hands after its life was exhausted.
    TowerCaptured {
        /// Tower that was captured.
        tower: TowerId,
        /// Owner before the capture; `None` for neutral towers.
        previous_owner: Option<PlayerId>,
        /// Player now owning the tower.
        owner: PlayerId,
    },
    /// Confirms that a connection was created.
    ConnectionCreated {
        /// Source tower of the connection.
        from: TowerId,
        /// Destination tower of the connection.
        to: TowerId,
    },
    /// Reports that a connection request was rejected without mutation.
    ConnectionRejected {
        /// Source tower named in the request.
        from: TowerId,
        /// Destination tower named in the request.
        to: TowerId,
        /// Specific reason the connection is illegal.
        reason: ConnectionError,
    },
    /// Confirms that a connection was removed.
    ConnectionRemoved {
        /// Source tower of the removed connection.
        from: TowerId,
        /// Destination tower of the removed connection.
        to: TowerId,
        /// What caused the removal.
        cause: RemovalCause,
    },
    /// A player lost their last tower.
    PlayerEliminated {
        /// Player that no longer owns any tower.
        player: PlayerId,
    },
    /// Only one player still owns towers. Reported once per match.
    MatchEnded {
        /// Player that outlasted every opponent.
        winner: PlayerId,
    },
}

/// Reasons a connection cannot be created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ConnectionError {
    /// One of the named towers does not exist.
    #[error("unknown tower")]
    UnknownTower,
    /// Source and destination are the same tower.
    #[error("a tower cannot connect to itself")]
    SelfConnection,
    /// The source tower already sustains as many connections as its life allows.
    #[error("source tower has no spare capacity")]
    NoCapacity,
    /// The road would pass through another tower's footprint.
    #[error("road is blocked by tower {0:?}")]
    OccludedByTower(TowerId),
    /// The road would cross an obstacle.
    #[error("road is blocked by an obstacle")]
    OccludedByObstacle,
}

/// Causes reported alongside [`Event::ConnectionRemoved`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalCause {
    /// Removed through [`Command::RemoveConnection`].
    Requested,
    /// Severed by a cutting gesture.
    Cut,
    /// Retracted because the source tower's capacity shrank below its load.
    CapacityLost,
}

/// Unique identifier assigned to a tower. Towers are never destroyed, so the
/// identifier stays valid for the whole match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the player identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Static rectangle that blocks roads but nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    bounds: Rect,
}

impl Obstacle {
    /// Creates an obstacle covering the provided rectangle.
    #[must_use]
    pub const fn new(bounds: Rect) -> Self {
        Self { bounds }
    }

    /// Area blocked by the obstacle.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.bounds
    }
}

/// Initial description of a tower produced by the layout planner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerSeed {
    /// Centre of the tower in world units.
    pub position: Vec2,
    /// Half the tower's edge length; also the radius of its road-blocking footprint.
    pub radius: f32,
    /// Player owning the tower at match start, if any.
    pub owner: Option<PlayerId>,
    /// Life at match start.
    pub life: u32,
}

/// Complete starting arrangement of a match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchLayout {
    /// Side length of the square map.
    pub map_size: f32,
    /// Towers in placement order; the index becomes the [`TowerId`].
    pub towers: Vec<TowerSeed>,
    /// Obstacles in placement order.
    pub obstacles: Vec<Obstacle>,
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower.
    pub id: TowerId,
    /// Centre of the tower in world units.
    pub position: Vec2,
    /// Footprint radius of the tower.
    pub radius: f32,
    /// Current owner; `None` while neutral.
    pub owner: Option<PlayerId>,
    /// Current life.
    pub life: u32,
    /// Number of live outgoing connections.
    pub outgoing: u32,
    /// Outgoing connections the tower may sustain at its current life.
    pub capacity: u32,
}

impl TowerSnapshot {
    /// Reports whether the tower is unowned.
    #[must_use]
    pub const fn is_neutral(&self) -> bool {
        self.owner.is_none()
    }

    /// Number of additional connections the tower could still sustain.
    #[must_use]
    pub const fn spare_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.outgoing)
    }

    /// Square area covered by the tower.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::from_center_size(self.position, Vec2::splat(self.radius * 2.0))
    }
}

/// Read-only snapshot describing all towers on the map.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot captured for `id`.
    #[must_use]
    pub fn get(&self, id: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view captured no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a directed connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionSnapshot {
    /// Source tower of the connection.
    pub from: TowerId,
    /// Destination tower of the connection.
    pub to: TowerId,
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned to the unit.
    pub id: UnitId,
    /// Player owning the unit.
    pub owner: PlayerId,
    /// Tower the unit departed from.
    pub source: TowerId,
    /// Tower the unit travels toward.
    pub target: TowerId,
    /// Fraction of the road already travelled.
    pub progress: f32,
    /// Current position in world units.
    pub position: Vec2,
    /// Collision radius.
    pub radius: f32,
}

/// Read-only snapshot describing all units in flight.
#[derive(Clone, Debug, Default)]
pub struct UnitView {
    snapshots: Vec<UnitSnapshot>,
}

impl UnitView {
    /// Creates a new unit view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<UnitSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured unit snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.snapshots.iter()
    }

    /// Number of units in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no unit is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<UnitSnapshot> {
        self.snapshots
    }
}
