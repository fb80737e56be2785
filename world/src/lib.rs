#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tower Siege.
//!
//! The world owns every tower, obstacle, connection, and unit of a match.
//! Adapters and systems mutate it exclusively through [`apply`], which
//! resolves a [`Command`] to completion and appends the resulting [`Event`]s
//! in the order they happened. Read access goes through the [`query`] module.

mod connections;
mod dispatch;
mod occlusion;
mod towers;
mod units;

use std::time::Duration;

use tower_siege_core::{
    CapacityTable, Command, ConnectionError, Event, MatchLayout, Obstacle, PlayerId,
    RemovalCause, Rules, Segment, TowerId, UnitId, Vec2,
};

use connections::ConnectionSet;
use occlusion::Occluder;
use towers::TowerTable;
use units::UnitState;

pub use dispatch::{strategy_for, DispatchCursor, DispatchStrategy, LiveOrder, StableOrder};

/// Represents the authoritative Tower Siege world state.
#[derive(Debug)]
pub struct World {
    map_size: f32,
    towers: TowerTable,
    obstacles: Vec<Obstacle>,
    connections: ConnectionSet,
    units: Vec<UnitState>,
    next_unit_id: u32,
    dispatch: Box<dyn DispatchStrategy>,
    capacity: CapacityTable,
    unit_interval: Duration,
    growth_interval: Duration,
    unit_speed: f32,
    unit_radius: f32,
    max_life: u32,
    players: Vec<PlayerId>,
    eliminated: Vec<PlayerId>,
    winner: Option<PlayerId>,
    tick_index: u64,
}

impl World {
    /// Creates a world from a planned layout using the dispatch mode named in `rules`.
    #[must_use]
    pub fn new(layout: &MatchLayout, rules: &Rules) -> Self {
        Self::with_dispatch(layout, rules, strategy_for(rules.dispatch))
    }

    /// Creates a world from a planned layout with a caller-provided dispatch strategy.
    #[must_use]
    pub fn with_dispatch(
        layout: &MatchLayout,
        rules: &Rules,
        dispatch: Box<dyn DispatchStrategy>,
    ) -> Self {
        Self {
            map_size: layout.map_size,
            towers: TowerTable::from_seeds(&layout.towers, rules.max_tower_life),
            obstacles: layout.obstacles.clone(),
            connections: ConnectionSet::default(),
            units: Vec::new(),
            next_unit_id: 0,
            dispatch,
            capacity: rules.capacity.clone(),
            unit_interval: rules.unit_generation_delay,
            growth_interval: rules.life_growth_delay,
            unit_speed: rules.unit_speed,
            unit_radius: rules.unit_radius(),
            max_life: rules.max_tower_life,
            players: (0..rules.num_players).map(PlayerId::new).collect(),
            eliminated: Vec::new(),
            winner: None,
            tick_index: 0,
        }
    }

    fn check_connection(&self, from: TowerId, to: TowerId) -> Result<(), ConnectionError> {
        let source = self.towers.get(from).ok_or(ConnectionError::UnknownTower)?;
        let target = self.towers.get(to).ok_or(ConnectionError::UnknownTower)?;
        if from == to {
            return Err(ConnectionError::SelfConnection);
        }
        if source.outgoing >= self.capacity.capacity_for(source.life) {
            return Err(ConnectionError::NoCapacity);
        }

        let road = Segment::new(source.position, target.position);
        let towers = self
            .towers
            .iter()
            .filter(|tower| tower.id != from && tower.id != to)
            .map(|tower| Occluder::Tower {
                id: tower.id,
                center: tower.position,
                radius: tower.radius,
            });
        let obstacles = self.obstacles.iter().map(Occluder::from_obstacle);
        occlusion::screen(&road, towers.chain(obstacles))
    }

    fn create_connection(&mut self, from: TowerId, to: TowerId, out_events: &mut Vec<Event>) {
        if let Err(reason) = self.check_connection(from, to) {
            out_events.push(Event::ConnectionRejected { from, to, reason });
            return;
        }

        self.connections.insert(from, to);
        if let Some(source) = self.towers.get_mut(from) {
            source.outgoing += 1;
        }
        out_events.push(Event::ConnectionCreated { from, to });
    }

    fn remove_connection(&mut self, from: TowerId, to: TowerId, out_events: &mut Vec<Event>) {
        if !self.connections.remove_oldest(from, to) {
            return;
        }
        self.release_capacity(from);
        out_events.push(Event::ConnectionRemoved {
            from,
            to,
            cause: RemovalCause::Requested,
        });
    }

    fn cut(&mut self, start: Vec2, end: Vec2, player: PlayerId, out_events: &mut Vec<Event>) {
        let line = Segment::new(start, end);
        if line.is_degenerate() {
            return;
        }

        let severed: Vec<u64> = self
            .connections
            .iter()
            .filter(|connection| {
                let (Some(source), Some(target)) = (
                    self.towers.get(connection.from),
                    self.towers.get(connection.to),
                ) else {
                    return false;
                };
                source.owner == Some(player)
                    && Segment::new(source.position, target.position).intersects_segment(&line)
            })
            .map(|connection| connection.sequence)
            .collect();

        for sequence in severed {
            if let Some(connection) = self.connections.remove_sequence(sequence) {
                self.release_capacity(connection.from);
                out_events.push(Event::ConnectionRemoved {
                    from: connection.from,
                    to: connection.to,
                    cause: RemovalCause::Cut,
                });
            }
        }
    }

    fn release_capacity(&mut self, tower: TowerId) {
        if let Some(source) = self.towers.get_mut(tower) {
            source.outgoing = source.outgoing.saturating_sub(1);
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if dt.is_zero() {
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        self.run_tower_timers(dt, out_events);
        let arrivals = self.advance_units(dt, out_events);
        for unit in arrivals {
            self.resolve_arrival(&unit, out_events);
        }
    }

    fn run_tower_timers(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut dispatches: Vec<(PlayerId, TowerId, TowerId)> = Vec::new();

        for tower in self.towers.iter_mut() {
            let Some(owner) = tower.owner else {
                continue;
            };

            if tower.outgoing > 0 {
                let due = tower.spawn_timer.advance(dt, self.unit_interval);
                if due == 0 {
                    continue;
                }
                let live = self.connections.destinations_from(tower.id);
                for _ in 0..due {
                    if let Some(target) = self.dispatch.next_destination(&mut tower.cursor, &live)
                    {
                        dispatches.push((owner, tower.id, target));
                    }
                }
            } else {
                let due = tower.growth_timer.advance(dt, self.growth_interval);
                let grown = tower.life.saturating_add(due).min(self.max_life);
                if grown != tower.life {
                    tower.life = grown;
                    out_events.push(Event::TowerLifeChanged {
                        tower: tower.id,
                        life: grown,
                    });
                }
            }
        }

        for (owner, source, target) in dispatches {
            self.spawn_unit(owner, source, target, out_events);
        }
    }

    fn spawn_unit(
        &mut self,
        owner: PlayerId,
        source: TowerId,
        target: TowerId,
        out_events: &mut Vec<Event>,
    ) {
        let road = match (self.towers.get(source), self.towers.get(target)) {
            (Some(from), Some(to)) => Segment::new(from.position, to.position),
            _ => return,
        };

        let unit = UnitId::new(self.next_unit_id);
        self.next_unit_id = self.next_unit_id.wrapping_add(1);
        self.units
            .push(UnitState::new(unit, owner, source, target, road));
        out_events.push(Event::UnitSpawned {
            unit,
            owner,
            source,
            target,
        });
    }

    /// Moves every unit, removes colliding pairs, and returns the arrivals.
    fn advance_units(&mut self, dt: Duration, out_events: &mut Vec<Event>) -> Vec<UnitState> {
        let distance = self.unit_speed * dt.as_secs_f32();
        for unit in &mut self.units {
            unit.advance(distance);
        }

        let (arrived, in_flight): (Vec<UnitState>, Vec<UnitState>) = std::mem::take(&mut self.units)
            .into_iter()
            .partition(UnitState::has_arrived);

        let mut destroyed = vec![false; in_flight.len()];
        for (first, second) in units::resolve_collisions(&in_flight, self.unit_radius) {
            destroyed[first] = true;
            destroyed[second] = true;
            out_events.push(Event::UnitsCollided {
                first: in_flight[first].id,
                second: in_flight[second].id,
            });
        }

        self.units = in_flight
            .into_iter()
            .zip(destroyed)
            .filter_map(|(unit, destroyed)| (!destroyed).then_some(unit))
            .collect();

        arrived
    }

    fn resolve_arrival(&mut self, unit: &UnitState, out_events: &mut Vec<Event>) {
        out_events.push(Event::UnitArrived {
            unit: unit.id,
            owner: unit.owner,
            target: unit.target,
        });

        let max_life = self.max_life;
        let Some(tower) = self.towers.get_mut(unit.target) else {
            return;
        };

        if tower.owner == Some(unit.owner) {
            let reinforced = tower.life.saturating_add(1).min(max_life);
            if reinforced != tower.life {
                tower.life = reinforced;
                out_events.push(Event::TowerLifeChanged {
                    tower: tower.id,
                    life: reinforced,
                });
            }
            return;
        }

        tower.life = tower.life.saturating_sub(1);
        out_events.push(Event::TowerLifeChanged {
            tower: tower.id,
            life: tower.life,
        });

        if tower.life == 0 {
            self.capture(unit.target, unit.owner, out_events);
        } else {
            self.enforce_capacity(unit.target, out_events);
        }
    }

    fn capture(&mut self, id: TowerId, owner: PlayerId, out_events: &mut Vec<Event>) {
        let Some(tower) = self.towers.get_mut(id) else {
            return;
        };

        let previous_owner = tower.owner;
        tower.owner = Some(owner);
        tower.life = 1;
        tower.spawn_timer.reset();
        tower.growth_timer.reset();

        out_events.push(Event::TowerCaptured {
            tower: id,
            previous_owner,
            owner,
        });
        out_events.push(Event::TowerLifeChanged { tower: id, life: 1 });

        self.enforce_capacity(id, out_events);
        self.update_standings(out_events);
    }

    /// Retracts the newest outgoing connections until the tower's load fits its capacity.
    fn enforce_capacity(&mut self, id: TowerId, out_events: &mut Vec<Event>) {
        loop {
            let Some(tower) = self.towers.get_mut(id) else {
                return;
            };
            if tower.outgoing <= self.capacity.capacity_for(tower.life) {
                return;
            }

            let Some(connection) = self.connections.remove_newest_from(id) else {
                tower.outgoing = 0;
                return;
            };
            tower.outgoing -= 1;
            out_events.push(Event::ConnectionRemoved {
                from: connection.from,
                to: connection.to,
                cause: RemovalCause::CapacityLost,
            });
        }
    }

    fn update_standings(&mut self, out_events: &mut Vec<Event>) {
        let mut survivors: Vec<PlayerId> = Vec::new();
        for &player in &self.players {
            if self.towers.count_owned_by(player) > 0 {
                survivors.push(player);
                continue;
            }
            if !self.eliminated.contains(&player) {
                self.eliminated.push(player);
                out_events.push(Event::PlayerEliminated { player });
            }
        }

        if self.winner.is_some() || self.players.len() < 2 {
            return;
        }
        if let &[winner] = survivors.as_slice() {
            self.winner = Some(winner);
            out_events.push(Event::MatchEnded { winner });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::CreateConnection { from, to } => world.create_connection(from, to, out_events),
        Command::RemoveConnection { from, to } => world.remove_connection(from, to, out_events),
        Command::Cut { start, end, player } => world.cut(start, end, player, out_events),
        Command::Tick { dt } => world.tick(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_siege_core::{
        ConnectionError, ConnectionSnapshot, Obstacle, PlayerId, TowerId, TowerSnapshot,
        TowerView, UnitView, Vec2,
    };

    use super::World;

    /// Captures the current state of a single tower.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<TowerSnapshot> {
        world
            .towers
            .get(id)
            .map(|tower| tower.snapshot(&world.capacity))
    }

    /// Finds the tower whose square footprint contains `point`.
    #[must_use]
    pub fn tower_at(world: &World, point: Vec2) -> Option<TowerSnapshot> {
        world
            .towers
            .iter()
            .find(|tower| tower.bounds().contains(point))
            .map(|tower| tower.snapshot(&world.capacity))
    }

    /// Lists the towers currently owned by `player` in identifier order.
    #[must_use]
    pub fn towers_by_owner(world: &World, player: PlayerId) -> Vec<TowerSnapshot> {
        world
            .towers
            .iter()
            .filter(|tower| tower.owner == Some(player))
            .map(|tower| tower.snapshot(&world.capacity))
            .collect()
    }

    /// Captures a read-only view of every tower on the map.
    #[must_use]
    pub fn all_towers(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(&world.capacity))
                .collect(),
        )
    }

    /// Reports whether a connection from `from` to `to` would currently be accepted.
    #[must_use]
    pub fn can_create_connection(world: &World, from: TowerId, to: TowerId) -> bool {
        world.check_connection(from, to).is_ok()
    }

    /// Explains why a connection from `from` to `to` would be rejected, if it would.
    pub fn check_connection(world: &World, from: TowerId, to: TowerId) -> Result<(), ConnectionError> {
        world.check_connection(from, to)
    }

    /// Lists every live connection in creation order.
    #[must_use]
    pub fn connections(world: &World) -> Vec<ConnectionSnapshot> {
        world
            .connections
            .iter()
            .map(|connection| connection.snapshot())
            .collect()
    }

    /// Lists the distinct destinations `from` currently dispatches toward.
    #[must_use]
    pub fn outgoing_destinations(world: &World, from: TowerId) -> Vec<TowerId> {
        world.connections.destinations_from(from)
    }

    /// Captures a read-only view of the units in flight.
    #[must_use]
    pub fn unit_view(world: &World) -> UnitView {
        UnitView::from_snapshots(
            world
                .units
                .iter()
                .map(|unit| unit.snapshot(world.unit_radius))
                .collect(),
        )
    }

    /// Provides read-only access to the map's obstacles.
    #[must_use]
    pub fn obstacles(world: &World) -> &[Obstacle] {
        &world.obstacles
    }

    /// Side length of the square map.
    #[must_use]
    pub fn map_size(world: &World) -> f32 {
        world.map_size
    }

    /// Players taking part in the match.
    #[must_use]
    pub fn players(world: &World) -> &[PlayerId] {
        &world.players
    }

    /// Number of towers currently owned by each player, in player order.
    #[must_use]
    pub fn owned_tower_counts(world: &World) -> Vec<(PlayerId, usize)> {
        world
            .players
            .iter()
            .map(|&player| (player, world.towers.count_owned_by(player)))
            .collect()
    }

    /// Player that won the match, once decided.
    #[must_use]
    pub fn winner(world: &World) -> Option<PlayerId> {
        world.winner
    }

    /// Number of non-empty ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::TowerSeed;

    fn seed(x: f32, y: f32, owner: Option<u32>, life: u32) -> TowerSeed {
        TowerSeed {
            position: Vec2::new(x, y),
            radius: 20.0,
            owner: owner.map(PlayerId::new),
            life,
        }
    }

    fn world_with(towers: Vec<TowerSeed>) -> World {
        let layout = MatchLayout {
            map_size: 1_000.0,
            towers,
            obstacles: Vec::new(),
        };
        World::new(&layout, &Rules::default())
    }

    #[test]
    fn unknown_and_self_connections_are_rejected() {
        let mut world = world_with(vec![seed(100.0, 100.0, Some(0), 5)]);
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::CreateConnection {
                from: TowerId::new(0),
                to: TowerId::new(0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::CreateConnection {
                from: TowerId::new(0),
                to: TowerId::new(7),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::ConnectionRejected {
                    from: TowerId::new(0),
                    to: TowerId::new(0),
                    reason: ConnectionError::SelfConnection,
                },
                Event::ConnectionRejected {
                    from: TowerId::new(0),
                    to: TowerId::new(7),
                    reason: ConnectionError::UnknownTower,
                },
            ]
        );
    }

    #[test]
    fn removing_missing_connection_is_silent() {
        let mut world = world_with(vec![
            seed(100.0, 100.0, Some(0), 5),
            seed(400.0, 100.0, Some(1), 5),
        ]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::RemoveConnection {
                from: TowerId::new(0),
                to: TowerId::new(1),
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn idle_owned_tower_grows_but_neutral_does_not() {
        let mut world = world_with(vec![
            seed(100.0, 100.0, Some(0), 5),
            seed(400.0, 100.0, None, 5),
        ]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(10),
            },
            &mut events,
        );

        assert_eq!(query::tower(&world, TowerId::new(0)).map(|t| t.life), Some(7));
        assert_eq!(query::tower(&world, TowerId::new(1)).map(|t| t.life), Some(5));
    }

    #[test]
    fn growth_stops_at_maximum_life() {
        let mut world = world_with(vec![seed(100.0, 100.0, Some(0), 49)]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(60),
            },
            &mut events,
        );
        assert_eq!(query::tower(&world, TowerId::new(0)).map(|t| t.life), Some(50));
    }

    #[test]
    fn very_long_tick_dispatches_a_bounded_number_of_units() {
        let mut world = world_with(vec![
            seed(100.0, 100.0, Some(0), 5),
            seed(400.0, 100.0, Some(0), 5),
        ]);
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::CreateConnection {
                from: TowerId::new(0),
                to: TowerId::new(1),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_secs(365 * 24 * 60 * 60),
            },
            &mut events,
        );

        let spawned = events
            .iter()
            .filter(|event| matches!(event, Event::UnitSpawned { .. }))
            .count();
        let arrived = events
            .iter()
            .filter(|event| matches!(event, Event::UnitArrived { .. }))
            .count();
        let cap = usize::try_from(crate::towers::MAX_INTERVALS_PER_ADVANCE).expect("fits");
        assert_eq!(spawned, cap);
        assert_eq!(arrived, cap);
        assert!(query::unit_view(&world).is_empty());
        assert_eq!(query::tower(&world, TowerId::new(1)).map(|t| t.life), Some(50));
    }

    #[test]
    fn tower_at_uses_square_footprint() {
        let world = world_with(vec![seed(100.0, 100.0, Some(0), 5)]);
        assert_eq!(
            query::tower_at(&world, Vec2::new(118.0, 82.0)).map(|t| t.id),
            Some(TowerId::new(0))
        );
        assert!(query::tower_at(&world, Vec2::new(125.0, 100.0)).is_none());
        assert!(query::tower_at(&world, Vec2::new(-5_000.0, 100.0)).is_none());
    }
}
