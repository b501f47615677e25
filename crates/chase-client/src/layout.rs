//! The island's fixed obstacle layout.

use std::f64::consts::{PI, TAU};

use crate::{Obstacle, World, WorldConfig};

/// Rock rings as `(radius, count)`, evenly spaced starting on the +x axis.
const ROCK_RINGS: [(f64, usize); 3] = [(120.0, 10), (80.0, 8), (40.0, 3)];
const ROCK_RADIUS: f64 = 2.0;

const TREE_COUNT: usize = 100;
const TREE_INNER_RADIUS: f64 = 20.0;
const TREE_OUTER_RADIUS: f64 = 100.0;
const TREE_RADIUS: f64 = 1.0;
/// Radius weights cycled through by tree index; the last entry is the
/// normalizer.
const TREE_WEIGHTS: [f64; 14] = [
    2.0, 11.0, 17.0, 22.0, 36.0, 22.0, 27.0, 33.0, 30.0, 13.0, 19.0, 16.0, 23.0, 29.0,
];

/// Rocks on three concentric rings.
pub fn rocks() -> impl Iterator<Item = Obstacle> {
    ROCK_RINGS.into_iter().flat_map(|(radius, count)| {
        let step = TAU / count as f64;
        (0..count).map(move |i| {
            let angle = i as f64 * step;
            Obstacle::new(angle.cos() * radius, angle.sin() * radius, ROCK_RADIUS)
        })
    })
}

/// Trees on a golden-angle spiral between the inner and outer radius.
pub fn trees() -> impl Iterator<Item = Obstacle> {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let normalizer = TREE_WEIGHTS[TREE_WEIGHTS.len() - 1];
    (0..TREE_COUNT).map(move |i| {
        let angle = i as f64 * golden_angle;
        let factor = TREE_WEIGHTS[i % TREE_WEIGHTS.len()] / normalizer;
        let radius = TREE_INNER_RADIUS + (TREE_OUTER_RADIUS - TREE_INNER_RADIUS) * factor;
        Obstacle::new(angle.cos() * radius, angle.sin() * radius, TREE_RADIUS)
    })
}

impl World {
    /// The standard island: rock rings plus the tree spiral.
    pub fn island(config: &WorldConfig) -> Self {
        World::open(config).with_obstacles(rocks().chain(trees()))
    }
}

#[cfg(test)]
mod tests {
    use chase_protocol::Position;

    use super::*;

    #[test]
    fn test_island_has_every_obstacle() {
        assert_eq!(rocks().count(), 21);
        assert_eq!(trees().count(), 100);
        assert_eq!(World::island(&WorldConfig::default()).obstacles.len(), 121);
    }

    #[test]
    fn test_first_rock_of_each_ring_sits_on_x_axis() {
        let first: Vec<Obstacle> = rocks().filter(|r| r.z.abs() < 1e-4 && r.x > 0.0).collect();
        let xs: Vec<f64> = first.iter().map(|r| r.x).collect();
        assert_eq!(xs, vec![120.0, 80.0, 40.0]);
    }

    #[test]
    fn test_rock_blocks_and_open_ground_is_free() {
        let world = World::island(&WorldConfig::default());
        assert!(!world.is_position_free(&Position::new(119.0, 2.4, 0.0)));
        assert!(world.is_position_free(&Position::new(0.0, 2.4, 0.0)));
    }

    #[test]
    fn test_trees_stay_between_inner_and_outer_radius() {
        for tree in trees() {
            let r = (tree.x * tree.x + tree.z * tree.z).sqrt();
            assert!((TREE_INNER_RADIUS - 1e-3..=TREE_OUTER_RADIUS + 1e-3).contains(&r), "r = {r}");
            assert_eq!(tree.collision_radius, Some(1.0));
        }
    }
}
