//! Geometry helpers for collision checks.
//!
//! All collision classes in the game reduce to two tests: circle overlap
//! (players, zombies, projectiles, pickups) and point-in-square (walls).

use glam::Vec2;

/// Straight-line distance between two points.
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Whether two circle-shaped entities overlap, given the sum of their radii.
#[inline]
pub fn circles_overlap(a: Vec2, b: Vec2, combined_radius: f32) -> bool {
    distance(a, b) < combined_radius
}

/// Whether a point lies inside an axis-aligned square of side `size`
/// centered at `center`. The boundary itself does not block.
#[inline]
pub fn point_in_square(point: Vec2, center: Vec2, size: f32) -> bool {
    let half = size / 2.0;
    (point.x - center.x).abs() < half && (point.y - center.y).abs() < half
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        assert_eq!(distance(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0)), 5.0);
        assert_eq!(distance(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_circle_overlap() {
        // Player (r=20) and projectile (r=4): overlap below 24.
        assert!(circles_overlap(Vec2::new(0.0, 0.0), Vec2::new(23.0, 0.0), 24.0));
        assert!(!circles_overlap(Vec2::new(0.0, 0.0), Vec2::new(24.0, 0.0), 24.0));
    }

    #[test]
    fn test_point_in_square() {
        let center = Vec2::new(500.0, 500.0);
        // Size 32 blocks x and y in the open interval (484, 516).
        assert!(point_in_square(Vec2::new(500.0, 500.0), center, 32.0));
        assert!(point_in_square(Vec2::new(484.1, 515.9), center, 32.0));
        assert!(!point_in_square(Vec2::new(484.0, 500.0), center, 32.0));
        assert!(!point_in_square(Vec2::new(516.0, 500.0), center, 32.0));
        assert!(!point_in_square(Vec2::new(500.0, 483.9), center, 32.0));
    }
}
