//! Server configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub projectile: ProjectileConfig,
    #[serde(default)]
    pub zombie: ZombieConfig,
    #[serde(default)]
    pub weapons: WeaponsConfig,
}

impl Config {
    /// Load configuration from `config.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            info!("No config.toml found, creating default config");
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    /// Duration of one simulation tick.
    pub fn tick_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.server.tick_rate))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            map: MapConfig::default(),
            player: PlayerConfig::default(),
            projectile: ProjectileConfig::default(),
            zombie: ZombieConfig::default(),
            weapons: WeaponsConfig::default(),
        }
    }
}

/// Server networking and general settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Connections per IP limit.
    #[serde(default = "default_ip_limit")]
    pub ip_limit: usize,
    /// Simulation ticks per second.
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Whether sessions that have not registered a pseudo yet still receive
    /// world broadcast traffic.
    #[serde(default = "default_broadcast_to_unregistered")]
    pub broadcast_to_unregistered: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            ip_limit: default_ip_limit(),
            tick_rate: default_tick_rate(),
            broadcast_to_unregistered: default_broadcast_to_unregistered(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_ip_limit() -> usize {
    16
}
fn default_tick_rate() -> u32 {
    60
}
fn default_broadcast_to_unregistered() -> bool {
    true
}

/// Map dimensions and static wall layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    #[serde(default = "default_map_size")]
    pub width: f32,
    #[serde(default = "default_map_size")]
    pub height: f32,
    /// Number of walls generated at world initialization.
    #[serde(default = "default_wall_count")]
    pub wall_count: usize,
    /// Side length of each (square) wall.
    #[serde(default = "default_wall_size")]
    pub wall_size: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_map_size(),
            height: default_map_size(),
            wall_count: default_wall_count(),
            wall_size: default_wall_size(),
        }
    }
}

fn default_map_size() -> f32 {
    2000.0
}
fn default_wall_count() -> usize {
    16
}
fn default_wall_size() -> f32 {
    32.0
}

/// Player collision settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_radius")]
    pub radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: default_player_radius(),
        }
    }
}

fn default_player_radius() -> f32 {
    20.0
}

/// Projectile collision settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProjectileConfig {
    #[serde(default = "default_projectile_radius")]
    pub radius: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            radius: default_projectile_radius(),
        }
    }
}

fn default_projectile_radius() -> f32 {
    4.0
}

/// Zombie behavior settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZombieConfig {
    /// Movement speed in units per second.
    #[serde(default = "default_zombie_speed")]
    pub speed: f32,
    /// Seconds between zombie spawns.
    #[serde(default = "default_zombie_spawn_interval")]
    pub spawn_interval: u64,
    #[serde(default = "default_zombie_radius")]
    pub radius: f32,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            speed: default_zombie_speed(),
            spawn_interval: default_zombie_spawn_interval(),
            radius: default_zombie_radius(),
        }
    }
}

fn default_zombie_speed() -> f32 {
    80.0
}
fn default_zombie_spawn_interval() -> u64 {
    5
}
fn default_zombie_radius() -> f32 {
    18.0
}

/// Weapon catalog and pickup spawner settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeaponsConfig {
    /// Seconds between pickup spawns.
    #[serde(default = "default_weapon_spawn_interval")]
    pub spawn_interval: u64,
    /// Maximum concurrent pickups on the map.
    #[serde(default = "default_max_weapons_on_map")]
    pub max_on_map: usize,
    /// Radius within which a player claims a pickup.
    #[serde(default = "default_pickup_radius")]
    pub pickup_radius: f32,
    /// Weapon equipped at registration (and cooldown fallback).
    #[serde(default = "default_weapon_name")]
    pub default_weapon: String,
    /// One definition per weapon type, keyed by name.
    #[serde(default = "default_weapon_defs")]
    pub defs: BTreeMap<String, WeaponDef>,
}

impl WeaponsConfig {
    /// Look up a weapon definition, falling back to the default weapon.
    pub fn lookup(&self, name: &str) -> Option<&WeaponDef> {
        self.defs.get(name).or_else(|| self.defs.get(&self.default_weapon))
    }
}

impl Default for WeaponsConfig {
    fn default() -> Self {
        Self {
            spawn_interval: default_weapon_spawn_interval(),
            max_on_map: default_max_weapons_on_map(),
            pickup_radius: default_pickup_radius(),
            default_weapon: default_weapon_name(),
            defs: default_weapon_defs(),
        }
    }
}

fn default_weapon_spawn_interval() -> u64 {
    8
}
fn default_max_weapons_on_map() -> usize {
    12
}
fn default_pickup_radius() -> f32 {
    24.0
}
fn default_weapon_name() -> String {
    "gun".to_string()
}

/// Static definition of one weapon type.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WeaponDef {
    /// Minimum milliseconds between shots.
    pub fire_rate: u64,
    /// Projectile speed in units per second.
    pub projectile_speed: f32,
    /// Projectile time-to-live in milliseconds.
    pub projectile_lifetime: u64,
    /// Angular spread in radians; each bullet gets an independent offset
    /// drawn uniformly from [-spread, +spread].
    pub spread: f32,
    pub bullets_per_shot: u32,
}

impl WeaponDef {
    pub fn fire_rate_duration(&self) -> Duration {
        Duration::from_millis(self.fire_rate)
    }

    pub fn lifetime_duration(&self) -> Duration {
        Duration::from_millis(self.projectile_lifetime)
    }
}

fn default_weapon_defs() -> BTreeMap<String, WeaponDef> {
    let mut defs = BTreeMap::new();
    defs.insert(
        "gun".to_string(),
        WeaponDef {
            fire_rate: 400,
            projectile_speed: 800.0,
            projectile_lifetime: 1500,
            spread: 0.05,
            bullets_per_shot: 1,
        },
    );
    defs.insert(
        "rifle".to_string(),
        WeaponDef {
            fire_rate: 150,
            projectile_speed: 1200.0,
            projectile_lifetime: 2200,
            spread: 0.02,
            bullets_per_shot: 1,
        },
    );
    defs.insert(
        "shotgun".to_string(),
        WeaponDef {
            fire_rate: 900,
            projectile_speed: 650.0,
            projectile_lifetime: 700,
            spread: 0.15,
            bullets_per_shot: 6,
        },
    );
    defs.insert(
        "sniper".to_string(),
        WeaponDef {
            fire_rate: 1200,
            projectile_speed: 2200.0,
            projectile_lifetime: 3000,
            spread: 0.0,
            bullets_per_shot: 1,
        },
    );
    defs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_four_weapons() {
        let config = Config::default();
        let names: Vec<&String> = config.weapons.defs.keys().collect();
        assert_eq!(names, ["gun", "rifle", "shotgun", "sniper"]);

        let gun = &config.weapons.defs["gun"];
        assert_eq!(gun.fire_rate, 400);
        assert_eq!(gun.projectile_speed, 800.0);
        assert_eq!(gun.projectile_lifetime, 1500);
        assert_eq!(gun.bullets_per_shot, 1);

        let shotgun = &config.weapons.defs["shotgun"];
        assert_eq!(shotgun.bullets_per_shot, 6);
    }

    #[test]
    fn lookup_falls_back_to_default_weapon() {
        let config = Config::default();
        let def = config.weapons.lookup("plasma-cannon").unwrap();
        assert_eq!(def.fire_rate, 400); // the gun
        assert!(config.weapons.lookup("sniper").unwrap().spread == 0.0);
    }

    #[test]
    fn tick_period_is_sixty_hertz() {
        let config = Config::default();
        assert_eq!(config.server.tick_rate, 60);
        assert_eq!(config.tick_period(), Duration::from_micros(16_666));
    }

    #[test]
    fn defaults_match_expected_world_scale() {
        let config = Config::default();
        assert_eq!(config.map.width, 2000.0);
        assert_eq!(config.map.height, 2000.0);
        assert_eq!(config.player.radius, 20.0);
        assert_eq!(config.projectile.radius, 4.0);
        assert_eq!(config.zombie.speed, 80.0);
        assert_eq!(config.zombie.spawn_interval, 5);
        assert_eq!(config.zombie.radius, 18.0);
        assert_eq!(config.weapons.spawn_interval, 8);
        assert_eq!(config.weapons.max_on_map, 12);
    }
}
