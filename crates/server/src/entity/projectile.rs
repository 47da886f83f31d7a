//! In-flight projectiles.

use glam::Vec2;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// One in-flight shot.
///
/// Projectiles are advanced and expired lazily by the tick engine; there is
/// no per-projectile timer. Removal happens at most once, on the first
/// matching condition (wall, player, zombie, or TTL).
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: String,
    /// Session ID of the owner; a projectile never collides with its owner.
    pub from: String,
    pub position: Vec2,
    /// Direction of travel in radians.
    pub angle: f32,
    /// Speed in units per second.
    pub speed: f32,
    /// Time-to-live.
    pub lifetime: Duration,
    pub created_at: Instant,
    pub weapon_type: String,
}

impl Projectile {
    pub fn new(
        from: String,
        position: Vec2,
        angle: f32,
        speed: f32,
        lifetime: Duration,
        weapon_type: String,
    ) -> Self {
        Self {
            id: format!("p-{}", Uuid::new_v4()),
            from,
            position,
            angle,
            speed,
            lifetime,
            created_at: Instant::now(),
            weapon_type,
        }
    }

    /// Integrate position over one tick.
    pub fn advance(&mut self, tick_rate: f32) {
        let step = self.speed / tick_rate;
        self.position.x += self.angle.cos() * step;
        self.position.y += self.angle.sin() * step;
    }

    /// Whether the TTL has elapsed.
    pub fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) > self.lifetime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_integrates_one_tick() {
        let mut proj = Projectile::new(
            "owner".to_string(),
            Vec2::ZERO,
            0.0,
            800.0,
            Duration::from_millis(1500),
            "gun".to_string(),
        );
        proj.advance(60.0);
        assert!((proj.position.x - 800.0 / 60.0).abs() < 1e-4);
        assert_eq!(proj.position.y, 0.0);
    }

    #[test]
    fn expiry_is_lazy() {
        let mut proj = Projectile::new(
            "owner".to_string(),
            Vec2::ZERO,
            0.0,
            800.0,
            Duration::from_millis(1500),
            "gun".to_string(),
        );
        assert!(!proj.expired(proj.created_at + Duration::from_millis(1500)));
        proj.created_at = Instant::now() - Duration::from_millis(1501);
        assert!(proj.expired(Instant::now()));
    }
}
