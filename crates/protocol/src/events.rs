//! Server → client events.

use crate::{Color, ProtocolError};
use serde::{Deserialize, Serialize};

/// A leaderboard entry: top players sorted by combined kill count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPlayer {
    pub pseudo: String,
    pub zombies_killed: u32,
    pub players_killed: u32,
}

/// An event emitted by the server.
///
/// Every variant maps to one wire tag; field names are camelCase on the
/// wire (`aimAngle`, `weaponType`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Identity assignment, sent directly on connect.
    Init { id: String, color: Color },
    /// Registration acknowledgment (unicast).
    Confirm { pseudo: String },
    /// A player was placed at a new position.
    Respawn { id: String, x: f32, y: f32 },
    Chat {
        pseudo: String,
        color: Color,
        message: String,
    },
    Move {
        id: String,
        x: f32,
        y: f32,
        color: Color,
        aim_angle: f32,
    },
    ZombieSpawn { id: String, x: f32, y: f32 },
    ZombieMove { id: String, x: f32, y: f32 },
    ZombieRemove { id: String },
    Projectile {
        id: String,
        from: String,
        x: f32,
        y: f32,
        angle: f32,
        speed: f32,
        /// Time-to-live in milliseconds.
        lifetime: u64,
        weapon_type: String,
    },
    WeaponSpawn {
        id: String,
        x: f32,
        y: f32,
        weapon_type: String,
    },
    WeaponRemove { id: String },
    /// Equip confirmation (unicast to the picking player).
    WeaponEquipped {
        weapon_type: String,
        previous_weapon: Option<String>,
    },
    /// Remote weapon visual sync (broadcast).
    PlayerWeapon {
        player_id: String,
        weapon_type: String,
    },
    WallSpawn { id: String, x: f32, y: f32 },
    ScoreUpdate {
        player_id: String,
        zombies_killed: u32,
        players_killed: u32,
        top_players: Vec<TopPlayer>,
    },
}

impl ServerEvent {
    /// Encode the event as a JSON text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn as_value(event: &ServerEvent) -> Value {
        serde_json::from_str(&event.to_json().unwrap()).unwrap()
    }

    #[test]
    fn init_wire_shape() {
        let v = as_value(&ServerEvent::Init {
            id: "abc".into(),
            color: Color::new(255, 0, 0),
        });
        assert_eq!(v["type"], "init");
        assert_eq!(v["id"], "abc");
        assert_eq!(v["color"], "#ff0000");
    }

    #[test]
    fn move_uses_camel_case_aim_angle() {
        let v = as_value(&ServerEvent::Move {
            id: "abc".into(),
            x: 1.0,
            y: 2.0,
            color: Color::default(),
            aim_angle: 0.75,
        });
        assert_eq!(v["type"], "move");
        assert_eq!(v["aimAngle"], 0.75);
        assert!(v.get("aim_angle").is_none());
    }

    #[test]
    fn projectile_wire_shape() {
        let v = as_value(&ServerEvent::Projectile {
            id: "p-1".into(),
            from: "abc".into(),
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            speed: 800.0,
            lifetime: 1500,
            weapon_type: "gun".into(),
        });
        assert_eq!(v["type"], "projectile");
        assert_eq!(v["from"], "abc");
        assert_eq!(v["lifetime"], 1500);
        assert_eq!(v["weaponType"], "gun");
    }

    #[test]
    fn score_update_wire_shape() {
        let v = as_value(&ServerEvent::ScoreUpdate {
            player_id: "abc".into(),
            zombies_killed: 3,
            players_killed: 1,
            top_players: vec![TopPlayer {
                pseudo: "ada".into(),
                zombies_killed: 3,
                players_killed: 1,
            }],
        });
        assert_eq!(v["type"], "score_update");
        assert_eq!(v["playerId"], "abc");
        assert_eq!(v["zombiesKilled"], 3);
        assert_eq!(v["topPlayers"][0]["pseudo"], "ada");
        assert_eq!(v["topPlayers"][0]["playersKilled"], 1);
    }

    #[test]
    fn weapon_equipped_carries_previous_weapon() {
        let v = as_value(&ServerEvent::WeaponEquipped {
            weapon_type: "shotgun".into(),
            previous_weapon: Some("gun".into()),
        });
        assert_eq!(v["type"], "weapon_equipped");
        assert_eq!(v["weaponType"], "shotgun");
        assert_eq!(v["previousWeapon"], "gun");
    }

    #[test]
    fn zombie_tags() {
        assert_eq!(
            as_value(&ServerEvent::ZombieSpawn { id: "z-1".into(), x: 0.0, y: 0.0 })["type"],
            "zombie_spawn"
        );
        assert_eq!(
            as_value(&ServerEvent::ZombieMove { id: "z-1".into(), x: 0.0, y: 0.0 })["type"],
            "zombie_move"
        );
        assert_eq!(
            as_value(&ServerEvent::ZombieRemove { id: "z-1".into() })["type"],
            "zombie_remove"
        );
        assert_eq!(
            as_value(&ServerEvent::WallSpawn { id: "w".into(), x: 5.0, y: 6.0 })["type"],
            "wall_spawn"
        );
    }
}
