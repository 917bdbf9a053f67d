//! Box-obstacle world geometry
//!
//! A flat navigable floor with axis-aligned blockers. Used by the headless
//! session and as the spatial fixture in tests.

use crate::services::{SpatialQuery, TraceHit};
use horde_math::{segment_aabb, Aabb, Segment, Vec3};

/// Flat floor plus box obstacles
#[derive(Debug, Clone)]
pub struct BoxWorld {
    /// Walkable area (XY), floor at `floor_z`
    nav_bounds: Aabb,
    /// Height of the walkable floor
    floor_z: f32,
    /// Blocking boxes
    obstacles: Vec<Aabb>,
}

impl BoxWorld {
    /// Create a world whose floor spans `half_size` around the origin
    pub fn new(half_size: f32) -> Self {
        Self {
            nav_bounds: Aabb::new(
                Vec3::new(-half_size, -half_size, 0.0),
                Vec3::new(half_size, half_size, 0.0),
            ),
            floor_z: 0.0,
            obstacles: Vec::new(),
        }
    }

    /// Add a blocking box
    pub fn with_obstacle(mut self, obstacle: Aabb) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    /// Add a blocking box in place
    pub fn add_obstacle(&mut self, obstacle: Aabb) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Aabb] {
        &self.obstacles
    }

    fn blocked_at(&self, point: Vec3) -> bool {
        self.obstacles.iter().any(|o| o.contains_point(point))
    }
}

impl SpatialQuery for BoxWorld {
    fn trace_line(&self, start: Vec3, end: Vec3) -> Option<TraceHit> {
        let segment = Segment::new(start, end);
        let ray = segment.ray();
        self.obstacles
            .iter()
            .filter_map(|o| segment_aabb(&segment, o))
            .min_by(|a, b| a.total_cmp(b))
            .map(|distance| TraceHit {
                location: ray.at(distance),
                distance,
            })
    }

    fn project_to_nav(&self, point: Vec3, extent: Vec3) -> Option<Vec3> {
        if (point.z - self.floor_z).abs() > extent.z {
            return None;
        }
        let clamped = Vec3::new(
            point.x.clamp(self.nav_bounds.min.x, self.nav_bounds.max.x),
            point.y.clamp(self.nav_bounds.min.y, self.nav_bounds.max.y),
            self.floor_z,
        );
        if (clamped.x - point.x).abs() > extent.x || (clamped.y - point.y).abs() > extent.y {
            return None;
        }
        if self.blocked_at(clamped) {
            return None;
        }
        Some(clamped)
    }

    fn overlaps_capsule(&self, center: Vec3, radius: f32, half_height: f32) -> bool {
        let bounds = Aabb::from_center_half_extents(
            center,
            Vec3::new(radius, radius, half_height + radius),
        );
        self.obstacles.iter().any(|o| o.intersects(&bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> Aabb {
        Aabb::new(Vec3::new(400.0, -500.0, 0.0), Vec3::new(450.0, 500.0, 300.0))
    }

    #[test]
    fn test_trace_blocked_by_wall() {
        let world = BoxWorld::new(5000.0).with_obstacle(wall());
        let hit = world
            .trace_line(Vec3::new(0.0, 0.0, 50.0), Vec3::new(1000.0, 0.0, 50.0))
            .unwrap();
        assert!((hit.distance - 400.0).abs() < 1e-3);
        assert!(!world.has_clear_line(Vec3::new(0.0, 0.0, 50.0), Vec3::new(1000.0, 0.0, 50.0)));
    }

    #[test]
    fn test_trace_clear_over_wall() {
        let world = BoxWorld::new(5000.0).with_obstacle(wall());
        assert!(world.has_clear_line(Vec3::new(0.0, 0.0, 400.0), Vec3::new(1000.0, 0.0, 400.0)));
        assert!(world.has_clear_line(Vec3::new(0.0, 0.0, 50.0), Vec3::new(300.0, 0.0, 50.0)));
    }

    #[test]
    fn test_project_to_nav() {
        let world = BoxWorld::new(1000.0).with_obstacle(wall());
        let extent = Vec3::new(100.0, 100.0, 200.0);

        assert_eq!(
            world.project_to_nav(Vec3::new(10.0, 20.0, 50.0), extent),
            Some(Vec3::new(10.0, 20.0, 0.0))
        );
        assert_eq!(
            world.project_to_nav(Vec3::new(1050.0, 0.0, 0.0), extent),
            Some(Vec3::new(1000.0, 0.0, 0.0))
        );
        assert!(world.project_to_nav(Vec3::new(1500.0, 0.0, 0.0), extent).is_none());
        assert!(world.project_to_nav(Vec3::new(420.0, 0.0, 0.0), extent).is_none());
    }

    #[test]
    fn test_capsule_overlap() {
        let world = BoxWorld::new(1000.0).with_obstacle(wall());
        assert!(world.overlaps_capsule(Vec3::new(380.0, 0.0, 88.0), 34.0, 88.0));
        assert!(!world.overlaps_capsule(Vec3::new(0.0, 0.0, 88.0), 34.0, 88.0));
    }
}
