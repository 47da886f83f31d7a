//! Static walls.

use crate::geometry::point_in_square;
use glam::Vec2;
use uuid::Uuid;

/// An immovable axis-aligned square obstacle, fixed at world initialization.
///
/// Walls block zombie movement per axis and destroy projectiles on entry.
#[derive(Debug, Clone)]
pub struct Wall {
    pub id: String,
    /// Center of the square.
    pub position: Vec2,
    /// Side length.
    pub size: f32,
}

impl Wall {
    pub fn new(position: Vec2, size: f32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            position,
            size,
        }
    }

    /// Whether a point lies inside this wall.
    #[inline]
    pub fn contains(&self, point: Vec2) -> bool {
        point_in_square(point, self.position, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_uses_center_and_size() {
        let wall = Wall::new(Vec2::new(500.0, 500.0), 32.0);
        assert!(wall.contains(Vec2::new(510.0, 490.0)));
        assert!(!wall.contains(Vec2::new(516.5, 500.0)));
    }
}
