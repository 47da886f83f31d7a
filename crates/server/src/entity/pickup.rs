//! Weapon pickups lying on the map.

use glam::Vec2;
use uuid::Uuid;

/// A weapon waiting to be claimed on contact.
#[derive(Debug, Clone)]
pub struct Pickup {
    pub id: String,
    pub position: Vec2,
    pub weapon_type: String,
}

impl Pickup {
    pub fn new(position: Vec2, weapon_type: String) -> Self {
        Self {
            id: format!("w-{}", Uuid::new_v4()),
            position,
            weapon_type,
        }
    }
}
