//! Player session state.

use glam::Vec2;
use protocol::Color;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A connected player session.
///
/// The session exists from the moment the socket is accepted, but only
/// becomes *active* (visible to combat, collisions and zombie targeting)
/// once a pseudo has been registered.
#[derive(Debug, Clone)]
pub struct Player {
    /// Unique session ID.
    pub id: String,
    /// Remote address.
    pub addr: SocketAddr,
    /// Assigned color.
    pub color: Color,
    /// Display name; `None` until registration.
    pub pseudo: Option<String>,
    /// Current position.
    pub position: Vec2,
    /// Aim angle in radians, as last reported by the client.
    pub aim_angle: f32,
    /// Equipped weapon type.
    pub weapon: String,
    /// When the last shot was fired; `None` permits an immediate shot.
    pub last_shot_at: Option<Instant>,
}

impl Player {
    /// Create a new session with a freshly minted ID.
    pub fn new(addr: SocketAddr, color: Color, position: Vec2, weapon: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            addr,
            color,
            pseudo: None,
            position,
            aim_angle: 0.0,
            weapon,
            last_shot_at: None,
        }
    }

    /// Whether this session has completed registration.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.pseudo.is_some()
    }

    /// Whether the fire-rate cooldown has elapsed.
    pub fn can_fire(&self, now: Instant, fire_rate: Duration) -> bool {
        match self.last_shot_at {
            Some(last) => now.duration_since(last) >= fire_rate,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_player() -> Player {
        Player::new(
            "127.0.0.1:4000".parse().unwrap(),
            Color::new(10, 20, 30),
            Vec2::new(100.0, 100.0),
            "gun".to_string(),
        )
    }

    #[test]
    fn starts_inactive() {
        let player = test_player();
        assert!(!player.is_active());
        assert!(player.pseudo.is_none());
    }

    #[test]
    fn cooldown_gating() {
        let mut player = test_player();
        let now = Instant::now();
        let rate = Duration::from_millis(400);

        assert!(player.can_fire(now, rate), "no previous shot");
        player.last_shot_at = Some(now);
        assert!(!player.can_fire(now + Duration::from_millis(100), rate));
        assert!(player.can_fire(now + Duration::from_millis(400), rate));
    }
}
