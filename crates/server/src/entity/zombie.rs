//! Hostile NPCs.

use glam::Vec2;
use uuid::Uuid;

/// An autonomous zombie pursuing the nearest active player.
#[derive(Debug, Clone)]
pub struct Zombie {
    pub id: String,
    pub position: Vec2,
    /// Session ID the zombie is chasing; replaced only when it no longer
    /// names an active session.
    pub target_id: Option<String>,
}

impl Zombie {
    pub fn new(position: Vec2) -> Self {
        Self {
            id: format!("z-{}", Uuid::new_v4()),
            position,
            target_id: None,
        }
    }
}
