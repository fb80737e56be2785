//! Match configuration shared by the layout planner, the world, and adapters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunable parameters recognised by every crate in the workspace.
///
/// The struct deserialises from TOML with every field optional; missing
/// fields fall back to [`Rules::default`]. Durations are written in
/// milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rules {
    /// Side length of the square map measured in world units.
    pub map_size: f32,
    /// Number of competing players; the first towers placed are seeded to them.
    pub num_players: u32,
    /// Smallest number of towers the planner draws.
    pub min_towers: u32,
    /// Largest number of towers the planner draws.
    pub max_towers: u32,
    /// Smallest number of obstacles the planner draws.
    pub min_obstacles: u32,
    /// Largest number of obstacles the planner draws.
    pub max_obstacles: u32,
    /// Tower edge length expressed as a fraction of the map size.
    pub tower_size_ratio: f32,
    /// Obstacle edge length expressed as a fraction of the tower size.
    pub obstacle_size_ratio: f32,
    /// Unit diameter expressed as a fraction of the tower size.
    pub unit_size_ratio: f32,
    /// Minimum separation between sampled placements as a fraction of the map size.
    pub min_distance_ratio: f32,
    /// Candidate attempts the spatial sampler spends per active point.
    pub sampler_attempts: u32,
    /// Number of times the planner relaxes the separation before giving up.
    pub max_relaxation_attempts: u32,
    /// Time an owned, connected tower accumulates before dispatching a unit.
    #[serde(with = "duration_millis", rename = "unit_generation_delay_ms")]
    pub unit_generation_delay: Duration,
    /// Time an owned, idle tower accumulates before gaining one life.
    #[serde(with = "duration_millis", rename = "life_growth_delay_ms")]
    pub life_growth_delay: Duration,
    /// Unit travel speed in world units per second.
    pub unit_speed: f32,
    /// Life assigned to towers seeded to players at match start.
    pub seeded_tower_life: u32,
    /// Life assigned to neutral towers at match start.
    pub neutral_tower_life: u32,
    /// Upper bound on tower life.
    pub max_tower_life: u32,
    /// Mapping from tower life to outgoing connection capacity.
    pub capacity: CapacityTable,
    /// Strategy used to pick the destination of each dispatched unit.
    pub dispatch: DispatchMode,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            map_size: 760.0,
            num_players: 2,
            min_towers: 4,
            max_towers: 8,
            min_obstacles: 2,
            max_obstacles: 5,
            tower_size_ratio: 0.08,
            obstacle_size_ratio: 0.8,
            unit_size_ratio: 0.25,
            min_distance_ratio: 1.0 / 3.0,
            sampler_attempts: 30,
            max_relaxation_attempts: 16,
            unit_generation_delay: Duration::from_millis(1_000),
            life_growth_delay: Duration::from_millis(5_000),
            unit_speed: 50.0,
            seeded_tower_life: 5,
            neutral_tower_life: 5,
            max_tower_life: 50,
            capacity: CapacityTable::default(),
            dispatch: DispatchMode::default(),
        }
    }
}

impl Rules {
    /// Tower edge length in world units.
    #[must_use]
    pub fn tower_size(&self) -> f32 {
        self.map_size * self.tower_size_ratio
    }

    /// Obstacle edge length in world units.
    #[must_use]
    pub fn obstacle_size(&self) -> f32 {
        self.tower_size() * self.obstacle_size_ratio
    }

    /// Collision radius of a unit in world units.
    #[must_use]
    pub fn unit_radius(&self) -> f32 {
        self.tower_size() * self.unit_size_ratio * 0.5
    }

    /// Initial minimum separation handed to the spatial sampler.
    #[must_use]
    pub fn min_distance(&self) -> f32 {
        self.map_size * self.min_distance_ratio
    }

    /// Checks the rules for internally inconsistent values.
    pub fn validate(&self) -> Result<(), RulesError> {
        if !(self.map_size.is_finite() && self.map_size > 0.0) {
            return Err(RulesError::NonPositive { field: "map_size" });
        }
        if !(self.tower_size_ratio > 0.0 && self.tower_size_ratio < 0.5) {
            return Err(RulesError::RatioOutOfRange {
                field: "tower_size_ratio",
            });
        }
        if !(self.min_distance_ratio > 0.0 && self.min_distance_ratio <= 1.0) {
            return Err(RulesError::RatioOutOfRange {
                field: "min_distance_ratio",
            });
        }
        if self.obstacle_size_ratio <= 0.0 {
            return Err(RulesError::NonPositive {
                field: "obstacle_size_ratio",
            });
        }
        if self.unit_size_ratio <= 0.0 {
            return Err(RulesError::NonPositive {
                field: "unit_size_ratio",
            });
        }
        if !(self.unit_speed.is_finite() && self.unit_speed > 0.0) {
            return Err(RulesError::NonPositive { field: "unit_speed" });
        }
        if self.num_players == 0 {
            return Err(RulesError::NoPlayers);
        }
        if self.min_towers > self.max_towers {
            return Err(RulesError::InvertedRange {
                field: "towers",
                min: self.min_towers,
                max: self.max_towers,
            });
        }
        if self.min_obstacles > self.max_obstacles {
            return Err(RulesError::InvertedRange {
                field: "obstacles",
                min: self.min_obstacles,
                max: self.max_obstacles,
            });
        }
        if self.max_towers < self.num_players {
            return Err(RulesError::TooFewTowers {
                players: self.num_players,
                max_towers: self.max_towers,
            });
        }
        if self.unit_generation_delay.is_zero() {
            return Err(RulesError::NonPositive {
                field: "unit_generation_delay_ms",
            });
        }
        if self.life_growth_delay.is_zero() {
            return Err(RulesError::NonPositive {
                field: "life_growth_delay_ms",
            });
        }
        if self.seeded_tower_life == 0 || self.seeded_tower_life > self.max_tower_life {
            return Err(RulesError::LifeOutOfRange {
                field: "seeded_tower_life",
                max: self.max_tower_life,
            });
        }
        if self.neutral_tower_life == 0 || self.neutral_tower_life > self.max_tower_life {
            return Err(RulesError::LifeOutOfRange {
                field: "neutral_tower_life",
                max: self.max_tower_life,
            });
        }
        self.capacity.validate()
    }
}

/// Reasons a [`Rules`] value is rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RulesError {
    /// A quantity that must be strictly positive was zero or negative.
    #[error("`{field}` must be positive")]
    NonPositive {
        /// Name of the offending field.
        field: &'static str,
    },
    /// A ratio fell outside the range the planner can honour.
    #[error("`{field}` is outside its supported range")]
    RatioOutOfRange {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The match was configured without players.
    #[error("at least one player is required")]
    NoPlayers,
    /// A minimum exceeded its maximum.
    #[error("{field} range is inverted: min {min} > max {max}")]
    InvertedRange {
        /// Name of the range.
        field: &'static str,
        /// Configured minimum.
        min: u32,
        /// Configured maximum.
        max: u32,
    },
    /// Not enough towers can be drawn to seed every player.
    #[error("{players} players need at least as many towers, but max_towers is {max_towers}")]
    TooFewTowers {
        /// Configured number of players.
        players: u32,
        /// Configured tower maximum.
        max_towers: u32,
    },
    /// An initial life value fell outside `1..=max_tower_life`.
    #[error("`{field}` must lie within 1..={max}")]
    LifeOutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Configured life ceiling.
        max: u32,
    },
    /// The capacity table was empty or not monotonic.
    #[error("capacity table must list increasing life thresholds with non-decreasing capacity")]
    MalformedCapacityTable,
}

/// Single row of the life to capacity mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityTier {
    /// Highest life (inclusive) covered by this tier.
    pub up_to_life: u32,
    /// Outgoing connections a tower may sustain within this tier.
    pub connections: u32,
}

/// Maps tower life onto the number of outgoing connections it may sustain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapacityTable {
    /// Tiers ordered by ascending `up_to_life`.
    pub tiers: Vec<CapacityTier>,
    /// Capacity applied once life exceeds every tier.
    pub beyond: u32,
}

impl Default for CapacityTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                CapacityTier {
                    up_to_life: 10,
                    connections: 1,
                },
                CapacityTier {
                    up_to_life: 30,
                    connections: 2,
                },
            ],
            beyond: 3,
        }
    }
}

impl CapacityTable {
    /// Capacity granted to a tower at the provided life.
    #[must_use]
    pub fn capacity_for(&self, life: u32) -> u32 {
        self.tiers
            .iter()
            .find(|tier| life <= tier.up_to_life)
            .map_or(self.beyond, |tier| tier.connections)
    }

    fn validate(&self) -> Result<(), RulesError> {
        let mut previous: Option<CapacityTier> = None;
        for tier in &self.tiers {
            if tier.connections == 0 {
                return Err(RulesError::MalformedCapacityTable);
            }
            if let Some(previous) = previous {
                if tier.up_to_life <= previous.up_to_life
                    || tier.connections < previous.connections
                {
                    return Err(RulesError::MalformedCapacityTable);
                }
            }
            previous = Some(*tier);
        }

        let floor = previous.map_or(1, |tier| tier.connections);
        if self.beyond < floor {
            return Err(RulesError::MalformedCapacityTable);
        }
        Ok(())
    }
}

/// Selects how a tower rotates through its outgoing destinations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Cursor indexes the live destination list and wraps by its current length.
    #[default]
    LiveOrder,
    /// Cursor remembers the last served destination and moves to the next id.
    StableOrder,
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_table_matches_thresholds() {
        let table = CapacityTable::default();
        assert_eq!(table.capacity_for(0), 1);
        assert_eq!(table.capacity_for(10), 1);
        assert_eq!(table.capacity_for(11), 2);
        assert_eq!(table.capacity_for(30), 2);
        assert_eq!(table.capacity_for(31), 3);
        assert_eq!(table.capacity_for(50), 3);
    }

    #[test]
    fn default_rules_validate() {
        assert_eq!(Rules::default().validate(), Ok(()));
    }

    #[test]
    fn inverted_tower_range_is_rejected() {
        let rules = Rules {
            min_towers: 9,
            max_towers: 4,
            ..Rules::default()
        };
        assert_eq!(
            rules.validate(),
            Err(RulesError::InvertedRange {
                field: "towers",
                min: 9,
                max: 4,
            })
        );
    }

    #[test]
    fn non_monotonic_capacity_table_is_rejected() {
        let rules = Rules {
            capacity: CapacityTable {
                tiers: vec![
                    CapacityTier {
                        up_to_life: 20,
                        connections: 2,
                    },
                    CapacityTier {
                        up_to_life: 10,
                        connections: 3,
                    },
                ],
                beyond: 3,
            },
            ..Rules::default()
        };
        assert_eq!(rules.validate(), Err(RulesError::MalformedCapacityTable));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let rules: Rules = toml::from_str(
            r#"
            map_size = 500.0
            unit_generation_delay_ms = 250
            dispatch = "stable_order"
            "#,
        )
        .expect("rules parse");

        assert!((rules.map_size - 500.0).abs() < f32::EPSILON);
        assert_eq!(rules.unit_generation_delay, Duration::from_millis(250));
        assert_eq!(rules.dispatch, DispatchMode::StableOrder);
        assert_eq!(rules.life_growth_delay, Duration::from_millis(5_000));
        assert_eq!(rules.capacity, CapacityTable::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: Result<Rules, _> = toml::from_str("tower_count = 3");
        assert!(parsed.is_err());
    }

    #[test]
    fn derived_sizes_follow_ratios() {
        let rules = Rules {
            map_size: 1_000.0,
            ..Rules::default()
        };
        assert!((rules.tower_size() - 80.0).abs() < 1e-3);
        assert!((rules.obstacle_size() - 64.0).abs() < 1e-3);
        assert!((rules.unit_radius() - 10.0).abs() < 1e-3);
    }
}
