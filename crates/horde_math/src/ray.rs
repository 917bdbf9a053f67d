//! Rays and line segments

use crate::vector::Vec3;

/// 3D ray for visibility and sweep tests
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with normalized direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Create a ray from two points
    #[inline]
    pub fn from_points(start: Vec3, end: Vec3) -> Self {
        Self::new(start, end - start)
    }

    /// Get a point at distance t along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Component-wise reciprocal of the direction
    #[inline]
    pub fn inverse_direction(&self) -> Vec3 {
        Vec3::new(
            1.0 / self.direction.x,
            1.0 / self.direction.y,
            1.0 / self.direction.z,
        )
    }

    /// Get the closest point on the ray to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let t = (point - self.origin).dot(self.direction);
        if t <= 0.0 {
            self.origin
        } else {
            self.at(t)
        }
    }
}

/// Finite segment between two points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    #[inline]
    pub const fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Ray along this segment
    #[inline]
    pub fn ray(&self) -> Ray {
        Ray::from_points(self.start, self.end)
    }

    /// Closest point on the segment to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let ab = self.end - self.start;
        let len_sq = ab.length_squared();
        if len_sq <= 1e-10 {
            return self.start;
        }
        let t = ((point - self.start).dot(ab) / len_sq).clamp(0.0, 1.0);
        self.start + ab * t
    }

    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        point.distance(self.closest_point(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::from_points(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(ray.direction, Vec3::X);
        assert_eq!(ray.at(5.0), Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_segment_closest_point() {
        let seg = Segment::new(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0));
        assert_eq!(seg.closest_point(Vec3::new(50.0, 20.0, 0.0)), Vec3::new(50.0, 0.0, 0.0));
        assert_eq!(seg.closest_point(Vec3::new(-50.0, 0.0, 0.0)), Vec3::ZERO);
        assert_eq!(seg.distance_to_point(Vec3::new(150.0, 0.0, 0.0)), 50.0);
    }
}
