//! Intersection tests used by visibility and sweep queries

use crate::bounds::Aabb;
use crate::ray::{Ray, Segment};

/// Ray-box intersection using the slab method
///
/// Returns the distance along the ray to the intersection point,
/// or None if the ray doesn't intersect the box.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.inverse_direction();

    let t1 = (aabb.min.x - ray.origin.x) * inv_dir.x;
    let t2 = (aabb.max.x - ray.origin.x) * inv_dir.x;
    let t3 = (aabb.min.y - ray.origin.y) * inv_dir.y;
    let t4 = (aabb.max.y - ray.origin.y) * inv_dir.y;
    let t5 = (aabb.min.z - ray.origin.z) * inv_dir.z;
    let t6 = (aabb.max.z - ray.origin.z) * inv_dir.z;

    let tmin = t1.min(t2).max(t3.min(t4)).max(t5.min(t6));
    let tmax = t1.max(t2).min(t3.max(t4)).min(t5.max(t6));

    if tmax < 0.0 || tmin > tmax {
        None
    } else {
        Some(if tmin < 0.0 { 0.0 } else { tmin })
    }
}

/// Segment-box intersection, distance from the segment start
pub fn segment_aabb(segment: &Segment, aabb: &Aabb) -> Option<f32> {
    let t = ray_aabb(&segment.ray(), aabb)?;
    if t <= segment.length() {
        Some(t)
    } else {
        None
    }
}

/// Swept sphere against a point target of the given radius
pub fn sweep_sphere_point(segment: &Segment, sweep_radius: f32, target: crate::Vec3, target_radius: f32) -> bool {
    segment.distance_to_point(target) <= sweep_radius + target_radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        let t = ray_aabb(&ray, &unit_box()).unwrap();
        assert!((t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let ray = Ray::new(Vec3::new(-5.0, 5.0, 0.0), Vec3::X);
        assert!(ray_aabb(&ray, &unit_box()).is_none());
    }

    #[test]
    fn test_segment_stops_short() {
        let short = Segment::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(-3.0, 0.0, 0.0));
        assert!(segment_aabb(&short, &unit_box()).is_none());

        let long = Segment::new(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));
        assert!(segment_aabb(&long, &unit_box()).is_some());
    }

    #[test]
    fn test_sweep_sphere_point() {
        let seg = Segment::new(Vec3::ZERO, Vec3::new(150.0, 0.0, 0.0));
        assert!(sweep_sphere_point(&seg, 16.0, Vec3::new(100.0, 40.0, 0.0), 34.0));
        assert!(!sweep_sphere_point(&seg, 16.0, Vec3::new(100.0, 60.0, 0.0), 34.0));
    }
}
