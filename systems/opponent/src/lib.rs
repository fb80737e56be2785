#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Greedy computer opponent that connects owned towers to their nearest prey.

use std::time::Duration;

use tower_siege_core::{Command, ConnectionSnapshot, Event, PlayerId, TowerId, TowerView};

/// Configuration parameters required to construct the opponent system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    decision_interval: Duration,
}

impl Config {
    /// Creates a new configuration using the provided decision cadence.
    #[must_use]
    pub const fn new(decision_interval: Duration) -> Self {
        Self { decision_interval }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Pure system that plays one player by issuing connection commands.
///
/// Every decision visits the player's towers in id order. Each tower with
/// spare capacity requests one connection toward the closest tower the player
/// does not own, provided the world would accept it and the tower does not
/// already dispatch there.
#[derive(Debug)]
pub struct Opponent {
    player: PlayerId,
    decision_interval: Duration,
    accumulator: Duration,
    finished: bool,
}

impl Opponent {
    /// Creates an opponent controlling `player`.
    #[must_use]
    pub fn new(player: PlayerId, config: Config) -> Self {
        Self {
            player,
            decision_interval: config.decision_interval,
            accumulator: Duration::ZERO,
            finished: false,
        }
    }

    /// Player controlled by this opponent.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.player
    }

    /// Consumes world events and snapshots to emit connection commands.
    ///
    /// `can_connect` reports whether the world would currently accept a
    /// connection between two towers.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        towers: &TowerView,
        connections: &[ConnectionSnapshot],
        mut can_connect: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(TowerId, TowerId) -> bool,
    {
        let mut accumulated = Duration::ZERO;
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => accumulated = accumulated.saturating_add(*dt),
                Event::MatchEnded { .. } => self.finished = true,
                _ => {}
            }
        }

        if self.finished || accumulated.is_zero() {
            return;
        }

        self.accumulator = self.accumulator.saturating_add(accumulated);
        if self.resolve_decisions() == 0 {
            return;
        }

        for source in towers.iter() {
            if source.owner != Some(self.player) || source.spare_capacity() == 0 {
                continue;
            }

            let mut best: Option<Candidate> = None;
            for target in towers.iter() {
                if target.id == source.id || target.owner == Some(self.player) {
                    continue;
                }
                let already_connected = connections
                    .iter()
                    .any(|connection| connection.from == source.id && connection.to == target.id);
                if already_connected {
                    continue;
                }

                let current = Candidate {
                    distance_sq: source.position.distance_squared(target.position),
                    tower: target.id,
                };
                if best.is_some_and(|existing| !current.precedes(&existing)) {
                    continue;
                }
                if can_connect(source.id, target.id) {
                    best = Some(current);
                }
            }

            if let Some(target) = best {
                out.push(Command::CreateConnection {
                    from: source.id,
                    to: target.tower,
                });
            }
        }
    }

    fn resolve_decisions(&mut self) -> usize {
        if self.decision_interval.is_zero() {
            self.accumulator = Duration::ZERO;
            return 1;
        }

        let mut decisions = 0;
        while self.accumulator >= self.decision_interval {
            self.accumulator -= self.decision_interval;
            decisions += 1;
        }
        decisions
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    distance_sq: f32,
    tower: TowerId,
}

impl Candidate {
    fn precedes(&self, other: &Self) -> bool {
        if self.distance_sq != other.distance_sq {
            return self.distance_sq < other.distance_sq;
        }
        self.tower < other.tower
    }
}
