//! Headless match loop pitting one computer opponent against another.

use std::{fmt, time::Duration};

use anyhow::{ensure, Result};
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};
use tower_siege_core::{Command, Event, PlayerId};
use tower_siege_system_layout::LayoutPlanner;
use tower_siege_system_opponent::{Config as OpponentConfig, Opponent};
use tower_siege_world::{self as world, query, World};
use tracing::{debug, info, trace};

use crate::config::MatchConfig;

/// Parameters of a single headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RunOptions {
    /// Seed handed to the layout generator.
    pub(crate) seed: u64,
    /// Simulated time advanced by each tick.
    pub(crate) tick: Duration,
    /// Simulated time after which an undecided match is abandoned.
    pub(crate) max_duration: Duration,
}

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct MatchSummary {
    seed: u64,
    towers: usize,
    obstacles: usize,
    layout_warnings: usize,
    elapsed: Duration,
    winner: Option<PlayerId>,
    standings: Vec<(PlayerId, usize)>,
    units_spawned: usize,
    collisions: usize,
    captures: usize,
}

impl MatchSummary {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::UnitSpawned { .. } => self.units_spawned += 1,
                Event::UnitsCollided { .. } => self.collisions += 1,
                Event::TowerCaptured { .. } => self.captures += 1,
                _ => {}
            }
        }
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "seed {}: {} towers, {} obstacles, {} layout warnings",
            self.seed, self.towers, self.obstacles, self.layout_warnings
        )?;
        let seconds = self.elapsed.as_secs_f32();
        match self.winner {
            Some(player) => writeln!(f, "winner: player {} after {seconds:.1}s", player.get())?,
            None => writeln!(f, "no winner after {seconds:.1}s")?,
        }
        for (player, towers) in &self.standings {
            writeln!(f, "player {} holds {towers} towers", player.get())?;
        }
        write!(
            f,
            "{} units spawned, {} collisions, {} captures",
            self.units_spawned, self.collisions, self.captures
        )
    }
}

/// Plans a layout from the seed and plays it out until a winner emerges.
pub(crate) fn run(config: &MatchConfig, options: &RunOptions) -> Result<MatchSummary> {
    ensure!(!options.tick.is_zero(), "tick length must be positive");

    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let plan = LayoutPlanner::new(&config.rules).plan(&mut rng);
    info!(
        seed = options.seed,
        towers = plan.layout.towers.len(),
        obstacles = plan.layout.obstacles.len(),
        "layout ready"
    );

    let mut world = World::new(&plan.layout, &config.rules);
    let opponent_config = OpponentConfig::new(config.opponent.decision_interval());
    let mut opponents: Vec<Opponent> = query::players(&world)
        .iter()
        .map(|&player| Opponent::new(player, opponent_config))
        .collect();

    let mut summary = MatchSummary {
        seed: options.seed,
        towers: plan.layout.towers.len(),
        obstacles: plan.layout.obstacles.len(),
        layout_warnings: plan.warnings.len(),
        elapsed: Duration::ZERO,
        winner: None,
        standings: Vec::new(),
        units_spawned: 0,
        collisions: 0,
        captures: 0,
    };

    while summary.elapsed < options.max_duration && query::winner(&world).is_none() {
        let mut events = Vec::new();
        world::apply(&mut world, Command::Tick { dt: options.tick }, &mut events);
        summary.elapsed = summary.elapsed.saturating_add(options.tick);
        log_events(&events);
        summary.record(&events);

        let generated = play_opponents(&mut world, &mut opponents, &events);
        log_events(&generated);
        summary.record(&generated);
    }

    summary.winner = query::winner(&world);
    summary.standings = query::owned_tower_counts(&world);
    Ok(summary)
}

fn play_opponents(world: &mut World, opponents: &mut [Opponent], events: &[Event]) -> Vec<Event> {
    let towers = query::all_towers(world);
    let connections = query::connections(world);
    let mut commands = Vec::new();
    for opponent in opponents.iter_mut() {
        opponent.handle(
            events,
            &towers,
            &connections,
            |from, to| query::can_create_connection(world, from, to),
            &mut commands,
        );
    }

    let mut generated = Vec::new();
    for command in commands {
        world::apply(world, command, &mut generated);
    }
    generated
}

fn log_events(events: &[Event]) {
    for event in events {
        match event {
            Event::UnitSpawned {
                unit,
                owner,
                source,
                target,
            } => trace!(
                unit = unit.get(),
                owner = owner.get(),
                source = source.get(),
                target = target.get(),
                "unit spawned"
            ),
            Event::ConnectionCreated { from, to } => {
                debug!(from = from.get(), to = to.get(), "connection created");
            }
            Event::ConnectionRejected { from, to, reason } => {
                debug!(from = from.get(), to = to.get(), %reason, "connection rejected");
            }
            Event::ConnectionRemoved { from, to, cause } => {
                debug!(from = from.get(), to = to.get(), ?cause, "connection removed");
            }
            Event::TowerCaptured {
                tower,
                previous_owner,
                owner,
            } => info!(
                tower = tower.get(),
                previous_owner = ?previous_owner.map(|player| player.get()),
                owner = owner.get(),
                "tower captured"
            ),
            Event::PlayerEliminated { player } => {
                info!(player = player.get(), "player eliminated");
            }
            Event::MatchEnded { winner } => info!(winner = winner.get(), "match ended"),
            _ => {}
        }
    }
}
