//! World state management.
//!
//! The `World` is the single source of truth for all live entities. It is
//! only ever mutated from one logical execution context (the game-state
//! write lock), so it needs no interior locking of its own.

use crate::config::MapConfig;
use crate::entity::{Pickup, Player, Projectile, Wall, Zombie};
use glam::Vec2;
use protocol::{Color, TopPlayer};
use rand::Rng;
use std::collections::HashMap;

/// An id-keyed entity collection that preserves insertion order.
///
/// Iteration order matters: nearest-target ties and first-claim pickup
/// scans resolve in insertion order, and that order must stay stable.
/// Mirrors the id-map-plus-ordered-id-list layout of the world store,
/// without the O(1) swap removal (which would shuffle the order).
#[derive(Debug)]
pub struct Registry<T> {
    entries: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Insert an entity under its id. Replacing an existing id keeps its
    /// original position in the order.
    pub fn insert(&mut self, id: String, value: T) {
        if self.entries.insert(id.clone(), value).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        self.entries.get_mut(id)
    }

    /// Remove an entity. Removing a missing id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let removed = self.entries.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Snapshot of all ids in insertion order. Used by the tick engine to
    /// iterate safely while mutating the collection.
    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|value| (id, value)))
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, value)| value)
    }
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-player kill counters. Keyed by session id, created at registration,
/// never removed (survives respawns and disconnects).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub zombies_killed: u32,
    pub players_killed: u32,
}

impl Score {
    pub fn combined(&self) -> u32 {
        self.zombies_killed + self.players_killed
    }
}

/// Map bounds. Positions are in [0, width] × [0, height].
#[derive(Debug, Clone, Copy)]
pub struct WorldBorder {
    pub width: f32,
    pub height: f32,
}

impl WorldBorder {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Get a uniformly random position within the border.
    #[inline]
    pub fn random_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        Vec2::new(
            rng.random_range(0.0..self.width),
            rng.random_range(0.0..self.height),
        )
    }

    /// Clamp a position into the border.
    #[inline]
    pub fn clamp(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            position.x.clamp(0.0, self.width),
            position.y.clamp(0.0, self.height),
        )
    }
}

/// The game world containing all live entities.
#[derive(Debug)]
pub struct World {
    pub border: WorldBorder,
    pub players: Registry<Player>,
    pub projectiles: Registry<Projectile>,
    pub zombies: Registry<Zombie>,
    pub pickups: Registry<Pickup>,
    pub walls: Registry<Wall>,
    pub scores: HashMap<String, Score>,
}

impl World {
    /// Create a new world with the configured bounds and a randomly placed
    /// static wall layout.
    pub fn new(map: &MapConfig) -> Self {
        let border = WorldBorder::new(map.width, map.height);
        let mut walls = Registry::new();
        for _ in 0..map.wall_count {
            let wall = Wall::new(border.random_position(), map.wall_size);
            walls.insert(wall.id.clone(), wall);
        }
        Self {
            border,
            players: Registry::new(),
            projectiles: Registry::new(),
            zombies: Registry::new(),
            pickups: Registry::new(),
            walls,
            scores: HashMap::new(),
        }
    }

    /// Generate a random color for a new session.
    #[inline]
    pub fn random_color() -> Color {
        let mut rng = rand::rng();
        Color::new(rng.random(), rng.random(), rng.random())
    }

    /// Random in-bounds position that does not fall inside any wall.
    ///
    /// Bounded rejection sampling; with a sane wall layout the first sample
    /// almost always succeeds, and on exhaustion the last sample is
    /// returned rather than looping forever.
    pub fn random_open_position(&self) -> Vec2 {
        let mut position = self.border.random_position();
        for _ in 0..64 {
            if !self.walls.values().any(|wall| wall.contains(position)) {
                break;
            }
            position = self.border.random_position();
        }
        position
    }

    /// Get the mutable score record for a player, creating a zeroed one if
    /// missing.
    pub fn score_mut(&mut self, player_id: &str) -> &mut Score {
        self.scores.entry(player_id.to_string()).or_default()
    }

    /// Top 3 players by combined kill count, descending. The pseudo falls
    /// back to the raw session id when the player is gone or unregistered.
    pub fn top_players(&self) -> Vec<TopPlayer> {
        let mut ranked: Vec<(String, Score)> = self
            .scores
            .iter()
            .map(|(id, score)| (id.clone(), *score))
            .collect();
        // Descending by combined kills; id ascending keeps ties stable.
        ranked.sort_by(|a, b| b.1.combined().cmp(&a.1.combined()).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(3)
            .map(|(id, score)| TopPlayer {
                pseudo: self
                    .players
                    .get(&id)
                    .and_then(|player| player.pseudo.clone())
                    .unwrap_or_else(|| id.clone()),
                zombies_killed: score.zombies_killed,
                players_killed: score.players_killed,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn open_map() -> MapConfig {
        MapConfig {
            wall_count: 0,
            ..MapConfig::default()
        }
    }

    #[test]
    fn registry_preserves_insertion_order_across_removal() {
        let mut registry: Registry<u32> = Registry::new();
        for (id, value) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
            registry.insert(id.to_string(), value);
        }
        registry.remove("b");
        let ids: Vec<&String> = registry.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, ["a", "c", "d"]);

        // Removing again is a no-op.
        assert!(registry.remove("b").is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn registry_reinsert_keeps_position() {
        let mut registry: Registry<u32> = Registry::new();
        registry.insert("a".to_string(), 1);
        registry.insert("b".to_string(), 2);
        registry.insert("a".to_string(), 10);
        let entries: Vec<(&String, &u32)> = registry.iter().collect();
        assert_eq!(entries[0], (&"a".to_string(), &10));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn world_generates_configured_walls() {
        let map = MapConfig {
            wall_count: 5,
            ..MapConfig::default()
        };
        let world = World::new(&map);
        assert_eq!(world.walls.len(), 5);
        for wall in world.walls.values() {
            assert_eq!(wall.size, 32.0);
            assert!(wall.position.x >= 0.0 && wall.position.x <= map.width);
        }
    }

    #[test]
    fn open_position_avoids_walls() {
        // One giant wall covering most of the map forces rejection sampling
        // to do some work.
        let mut world = World::new(&open_map());
        let wall = Wall::new(Vec2::new(1000.0, 1000.0), 1800.0);
        world.walls.insert(wall.id.clone(), wall);
        for _ in 0..32 {
            let position = world.random_open_position();
            assert!(!world.walls.values().any(|w| w.contains(position)));
        }
    }

    #[test]
    fn top_players_sorted_by_combined_kills() {
        let mut world = World::new(&open_map());
        world.score_mut("low").zombies_killed = 1;
        world.score_mut("high").zombies_killed = 4;
        world.score_mut("high").players_killed = 2;
        world.score_mut("mid").players_killed = 3;
        world.score_mut("zero");

        let top = world.top_players();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].pseudo, "high");
        assert_eq!(top[0].zombies_killed, 4);
        assert_eq!(top[1].pseudo, "mid");
        assert_eq!(top[2].pseudo, "low");
    }

    #[test]
    fn border_clamp() {
        let border = WorldBorder::new(2000.0, 2000.0);
        let clamped = border.clamp(Vec2::new(-5.0, 9999.0));
        assert_eq!(clamped, Vec2::new(0.0, 2000.0));
    }
}
