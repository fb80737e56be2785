//! Match layout planning on top of the spatial sampler.

use rand::Rng;
use tower_siege_core::{MatchLayout, Obstacle, PlayerId, Rect, Rules, TowerSeed, Vec2};
use tracing::{debug, warn};

use crate::sampler::SpatialSampler;

/// Separation multiplier applied on every relaxation step.
const RELAXATION_FACTOR: f32 = 0.9;

/// Kind of entity the planner places.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A capturable tower.
    Tower,
    /// A road-blocking obstacle.
    Obstacle,
}

/// Soft failures recorded while planning a layout.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutWarning {
    /// Fewer positions could be sampled than were requested, even after relaxing.
    Shortfall {
        /// Entities affected by the shortfall.
        kind: EntityKind,
        /// Number of entities requested.
        requested: usize,
        /// Number of entities actually placed.
        placed: usize,
        /// Separation in effect after the final relaxation.
        min_distance: f32,
    },
    /// A replacement position drawn after an overlap still overlaps.
    UnresolvedOverlap {
        /// Entities affected by the overlap.
        kind: EntityKind,
        /// Placement index of the overlapping entity within its kind.
        index: usize,
    },
}

/// Outcome of planning a match layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutPlan {
    /// Towers and obstacles ready to seed a world.
    pub layout: MatchLayout,
    /// Soft failures encountered during planning.
    pub warnings: Vec<LayoutWarning>,
}

/// Places towers and obstacles for a new match.
#[derive(Clone, Debug)]
pub struct LayoutPlanner {
    rules: Rules,
}

impl LayoutPlanner {
    /// Creates a planner that follows the provided rules.
    #[must_use]
    pub fn new(rules: &Rules) -> Self {
        Self {
            rules: rules.clone(),
        }
    }

    /// Draws entity counts from the configured ranges and plans a layout.
    pub fn plan<R>(&self, rng: &mut R) -> LayoutPlan
    where
        R: Rng + ?Sized,
    {
        let obstacles = draw_count(rng, self.rules.min_obstacles, self.rules.max_obstacles);
        let towers = draw_count(rng, self.rules.min_towers, self.rules.max_towers);
        self.plan_with_counts(towers, obstacles, rng)
    }

    /// Plans a layout with exactly the requested counts, space permitting.
    pub fn plan_with_counts<R>(&self, towers: usize, obstacles: usize, rng: &mut R) -> LayoutPlan
    where
        R: Rng + ?Sized,
    {
        let mut warnings = Vec::new();
        let mut footprints: Vec<Rect> = Vec::new();
        let mut layout = MatchLayout {
            map_size: self.rules.map_size,
            towers: Vec::with_capacity(towers),
            obstacles: Vec::with_capacity(obstacles),
        };

        let obstacle_size = Vec2::splat(self.rules.obstacle_size());
        let points = self.sample_positions(EntityKind::Obstacle, obstacles, rng, &mut warnings);
        for (index, point) in points.into_iter().enumerate() {
            let center = self.settle(
                EntityKind::Obstacle,
                index,
                point,
                obstacle_size,
                &footprints,
                rng,
                &mut warnings,
            );
            let bounds = Rect::from_center_size(center, obstacle_size);
            footprints.push(bounds);
            layout.obstacles.push(Obstacle::new(bounds));
        }

        let tower_size = Vec2::splat(self.rules.tower_size());
        let points = self.sample_positions(EntityKind::Tower, towers, rng, &mut warnings);
        for (index, point) in points.into_iter().enumerate() {
            let center = self.settle(
                EntityKind::Tower,
                index,
                point,
                tower_size,
                &footprints,
                rng,
                &mut warnings,
            );
            footprints.push(Rect::from_center_size(center, tower_size));
            layout.towers.push(self.seed_tower(index, center));
        }

        debug!(
            towers = layout.towers.len(),
            obstacles = layout.obstacles.len(),
            warnings = warnings.len(),
            "layout planned"
        );
        LayoutPlan { layout, warnings }
    }

    fn padding(&self) -> f32 {
        self.rules.tower_size() / 2.0
    }

    fn sampler(&self, min_distance: f32) -> SpatialSampler {
        let span = self.rules.map_size - 2.0 * self.padding();
        SpatialSampler::new(span, span, min_distance).with_attempts(self.rules.sampler_attempts)
    }

    /// Samples up to `count` map positions, relaxing the separation on shortfall.
    fn sample_positions<R>(
        &self,
        kind: EntityKind,
        count: usize,
        rng: &mut R,
        warnings: &mut Vec<LayoutWarning>,
    ) -> Vec<Vec2>
    where
        R: Rng + ?Sized,
    {
        if count == 0 {
            return Vec::new();
        }

        let mut sampler = self.sampler(self.rules.min_distance());
        let mut points = sampler.generate(rng);
        let mut relaxations = 0;
        while points.len() < count && relaxations < self.rules.max_relaxation_attempts {
            relaxations += 1;
            let relaxed = sampler.min_distance() * RELAXATION_FACTOR;
            debug!(?kind, min_distance = relaxed, "relaxing minimum separation");
            sampler.set_min_distance(relaxed);
            points = sampler.generate(rng);
        }

        if points.len() < count {
            warn!(
                ?kind,
                requested = count,
                placed = points.len(),
                min_distance = sampler.min_distance(),
                "not enough room for every entity"
            );
            warnings.push(LayoutWarning::Shortfall {
                kind,
                requested: count,
                placed: points.len(),
                min_distance: sampler.min_distance(),
            });
        }

        let padding = Vec2::splat(self.padding());
        points
            .into_iter()
            .take(count)
            .map(|point| point + padding)
            .collect()
    }

    /// Moves a placement off earlier footprints with a single redraw.
    #[allow(clippy::too_many_arguments)]
    fn settle<R>(
        &self,
        kind: EntityKind,
        index: usize,
        center: Vec2,
        size: Vec2,
        placed: &[Rect],
        rng: &mut R,
        warnings: &mut Vec<LayoutWarning>,
    ) -> Vec2
    where
        R: Rng + ?Sized,
    {
        let overlaps = |candidate: Vec2| {
            let footprint = Rect::from_center_size(candidate, size);
            placed.iter().any(|other| footprint.overlaps(other))
        };
        if !overlaps(center) {
            return center;
        }

        let replacement = self
            .sampler(self.rules.min_distance())
            .generate(rng)
            .first()
            .copied()
            .unwrap_or(Vec2::ZERO)
            + Vec2::splat(self.padding());

        if overlaps(replacement) {
            warn!(?kind, index, "placement still overlaps after redraw");
            warnings.push(LayoutWarning::UnresolvedOverlap { kind, index });
        }
        replacement
    }

    fn seed_tower(&self, index: usize, position: Vec2) -> TowerSeed {
        let owner = u32::try_from(index)
            .ok()
            .filter(|player| *player < self.rules.num_players)
            .map(PlayerId::new);
        let life = if owner.is_some() {
            self.rules.seeded_tower_life
        } else {
            self.rules.neutral_tower_life
        };

        TowerSeed {
            position,
            radius: self.rules.tower_size() / 2.0,
            owner,
            life,
        }
    }
}

fn draw_count<R>(rng: &mut R, min: u32, max: u32) -> usize
where
    R: Rng + ?Sized,
{
    let count = if min >= max {
        min
    } else {
        rng.gen_range(min..=max)
    };
    usize::try_from(count).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

    fn plan(seed: u64) -> LayoutPlan {
        LayoutPlanner::new(&Rules::default()).plan(&mut ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn counts_stay_within_configured_ranges() {
        let rules = Rules::default();
        for seed in 0..16 {
            let plan = plan(seed);
            let towers = plan.layout.towers.len() as u32;
            let obstacles = plan.layout.obstacles.len() as u32;
            let short = plan
                .warnings
                .iter()
                .any(|warning| matches!(warning, LayoutWarning::Shortfall { .. }));
            assert!(towers <= rules.max_towers);
            assert!(obstacles <= rules.max_obstacles);
            assert!(short || (towers >= rules.min_towers && obstacles >= rules.min_obstacles));
        }
    }

    #[test]
    fn first_towers_are_seeded_to_players_in_order() {
        let rules = Rules::default();
        let plan = plan(21);
        let owners: Vec<Option<u32>> = plan
            .layout
            .towers
            .iter()
            .map(|tower| tower.owner.map(|player| player.get()))
            .collect();

        assert_eq!(owners[0], Some(0));
        assert_eq!(owners[1], Some(1));
        assert!(owners[2..].iter().all(Option::is_none));
        for tower in &plan.layout.towers {
            assert_eq!(tower.life, 5);
            assert!((tower.radius - rules.tower_size() / 2.0).abs() < 1e-4);
        }
    }

    #[test]
    fn entities_lie_inside_padded_map() {
        let rules = Rules::default();
        let padding = rules.tower_size() / 2.0;
        let plan = plan(8);
        let centres = plan
            .layout
            .towers
            .iter()
            .map(|tower| tower.position)
            .chain(plan.layout.obstacles.iter().map(|obstacle| obstacle.bounds().center()));
        for centre in centres {
            assert!(centre.x >= padding && centre.x <= rules.map_size - padding);
            assert!(centre.y >= padding && centre.y <= rules.map_size - padding);
        }
    }

    #[test]
    fn planning_replays_for_identical_seeds() {
        assert_eq!(plan(99), plan(99));
    }

    #[test]
    fn crowded_map_reports_shortfall() {
        let rules = Rules {
            map_size: 100.0,
            max_relaxation_attempts: 2,
            ..Rules::default()
        };
        let plan = LayoutPlanner::new(&rules)
            .plan_with_counts(500, 0, &mut ChaCha8Rng::seed_from_u64(4));

        assert!(plan.layout.towers.len() < 500);
        assert!(plan.layout.obstacles.is_empty());
        match plan.warnings.first() {
            Some(LayoutWarning::Shortfall {
                kind,
                requested,
                placed,
                ..
            }) => {
                assert_eq!(*kind, EntityKind::Tower);
                assert_eq!(*requested, 500);
                assert_eq!(*placed, plan.layout.towers.len());
            }
            other => panic!("expected shortfall, got {other:?}"),
        }
    }
}
