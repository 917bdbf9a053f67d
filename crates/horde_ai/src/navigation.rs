//! Goal-directed movement over the navigation service

use horde_core::SpatialQuery;
use horde_math::Vec3;
use rand::Rng;

/// Result of one movement step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveStep {
    /// Moved to the new location
    Moved(Vec3),
    /// Within the stop distance of the goal
    Arrived,
    /// No navigable point along the way
    Blocked,
}

/// Advance toward `goal` by `speed * delta`, stopping `stop_distance` short.
///
/// The candidate point is projected onto the navigation mesh, so the step
/// fails instead of entering blocked space.
pub fn step_towards(
    world: &dyn SpatialQuery,
    from: Vec3,
    goal: Vec3,
    stop_distance: f32,
    speed: f32,
    delta: f32,
    nav_extent: Vec3,
) -> MoveStep {
    let offset = Vec3::new(goal.x - from.x, goal.y - from.y, 0.0);
    let distance = offset.length();
    if distance <= stop_distance {
        return MoveStep::Arrived;
    }

    let travel = (speed * delta).min(distance - stop_distance);
    if travel <= 0.0 {
        return MoveStep::Blocked;
    }

    let candidate = from + offset.normalize_or_zero() * travel;
    match world.project_to_nav(candidate, nav_extent) {
        Some(point) => MoveStep::Moved(point),
        None => MoveStep::Blocked,
    }
}

/// Random reachable point within `radius` of `center`
pub fn random_reachable_point<R: Rng + ?Sized>(
    world: &dyn SpatialQuery,
    center: Vec3,
    radius: f32,
    nav_extent: Vec3,
    attempts: u32,
    rng: &mut R,
) -> Option<Vec3> {
    if radius <= 0.0 {
        return world.project_to_nav(center, nav_extent);
    }
    (0..attempts).find_map(|_| {
        let candidate = Vec3::new(
            center.x + rng.random_range(-radius..=radius),
            center.y + rng.random_range(-radius..=radius),
            center.z,
        );
        world.project_to_nav(candidate, nav_extent)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_core::BoxWorld;
    use horde_math::Aabb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EXTENT: Vec3 = Vec3::new(100.0, 100.0, 200.0);

    #[test]
    fn test_step_moves_and_arrives() {
        let world = BoxWorld::new(5000.0);
        let goal = Vec3::new(300.0, 0.0, 0.0);

        match step_towards(&world, Vec3::ZERO, goal, 100.0, 500.0, 0.1, EXTENT) {
            MoveStep::Moved(p) => assert!((p.x - 50.0).abs() < 1e-3),
            other => panic!("unexpected {:?}", other),
        }

        // Never steps inside the stop distance
        match step_towards(&world, Vec3::new(150.0, 0.0, 0.0), goal, 100.0, 500.0, 1.0, EXTENT) {
            MoveStep::Moved(p) => assert!((p.x - 200.0).abs() < 1e-3),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(
            step_towards(&world, Vec3::new(250.0, 0.0, 0.0), goal, 100.0, 500.0, 0.1, EXTENT),
            MoveStep::Arrived
        );
    }

    #[test]
    fn test_step_blocked_by_obstacle() {
        let world = BoxWorld::new(5000.0)
            .with_obstacle(Aabb::new(Vec3::new(40.0, -100.0, 0.0), Vec3::new(80.0, 100.0, 300.0)));

        let step = step_towards(&world, Vec3::ZERO, Vec3::new(500.0, 0.0, 0.0), 0.0, 500.0, 0.1, EXTENT);
        assert_eq!(step, MoveStep::Blocked);
    }

    #[test]
    fn test_random_point_stays_in_radius() {
        let world = BoxWorld::new(5000.0);
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..20 {
            let point = random_reachable_point(&world, Vec3::ZERO, 300.0, EXTENT, 5, &mut rng).unwrap();
            assert!(point.x.abs() <= 300.0 && point.y.abs() <= 300.0);
        }
    }
}
