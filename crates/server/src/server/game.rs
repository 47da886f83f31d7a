//! Game state and main loop.

use crate::config::Config;
use crate::entity::{Pickup, Player, Projectile, Zombie};
use crate::geometry::{circles_overlap, distance};
use futures_util::FutureExt;
use glam::Vec2;
use protocol::{ClientCommand, ServerEvent};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tracing::{debug, info, warn};

use super::TargetedEvent;
use crate::world::World;

/// Events produced by a tick, sent after the game state lock is released.
///
/// Ordering matters: every event here describes post-tick state, so nothing
/// may reach a socket while the tick is still mutating the world.
#[derive(Debug, Default)]
pub struct PendingEvents {
    pub broadcasts: Vec<ServerEvent>,
    pub targeted: Vec<TargetedEvent>,
}

/// Main game state.
///
/// One instance behind an `Arc<RwLock<_>>`; the tick loop takes the write
/// lock once per tick, connection handlers take it per command.
pub struct GameState {
    pub config: Config,
    pub world: World,
    pub tick_count: u64,
    pub start_time: std::time::Instant,

    // World broadcast channel
    broadcast_tx: broadcast::Sender<ServerEvent>,

    // Per-session event channel
    targeted_tx: broadcast::Sender<TargetedEvent>,

    // Average tick duration in milliseconds (exponential moving average).
    pub update_time_avg: f64,
}

impl GameState {
    /// Create a new game state.
    pub fn new(
        config: &Config,
        broadcast_tx: broadcast::Sender<ServerEvent>,
        targeted_tx: broadcast::Sender<TargetedEvent>,
    ) -> Self {
        Self {
            config: config.clone(),
            world: World::new(&config.map),
            tick_count: 0,
            start_time: std::time::Instant::now(),
            broadcast_tx,
            targeted_tx,
            update_time_avg: 0.0,
        }
    }

    /// Add a new session. Returns the session id and the `init` event the
    /// connection handler must deliver before anything else.
    pub fn add_player(&mut self, addr: SocketAddr) -> (String, ServerEvent) {
        let color = World::random_color();
        let position = self.world.random_open_position();
        let weapon = self.config.weapons.default_weapon.clone();
        let player = Player::new(addr, color, position, weapon);
        let id = player.id.clone();
        self.world.players.insert(id.clone(), player);
        info!("Session {} connected from {}", id, addr);
        (id.clone(), ServerEvent::Init { id, color })
    }

    /// Remove a session. Scores and in-flight projectiles survive; zombies
    /// chasing this player retarget on the next tick.
    pub fn remove_player(&mut self, id: &str) {
        if let Some(player) = self.world.players.remove(id) {
            info!("Session {} ({}) disconnected", id, player.addr);
        }
    }

    /// Handle a command from a session. Events caused by commands go out
    /// immediately over the channels rather than waiting for the next tick.
    pub fn handle_command(&mut self, player_id: &str, command: ClientCommand) {
        match command {
            ClientCommand::Pseudo { pseudo } => self.handle_pseudo(player_id, pseudo),
            ClientCommand::Chat { message } => self.handle_chat(player_id, message),
            ClientCommand::Move { x, y, aim_angle } => self.handle_move(player_id, x, y, aim_angle),
            ClientCommand::Shoot { x, y, angle } => self.handle_shoot(player_id, x, y, angle),
        }
    }

    /// Registration: set the pseudo and activate the session.
    fn handle_pseudo(&mut self, player_id: &str, pseudo: String) {
        let (id, x, y, weapon) = {
            let Some(player) = self.world.players.get_mut(player_id) else {
                return;
            };
            if player.is_active() {
                debug!("Session {} sent a duplicate registration", player_id);
                return;
            }
            player.pseudo = Some(pseudo.clone());
            player.weapon = self.config.weapons.default_weapon.clone();
            player.last_shot_at = None;
            (
                player.id.clone(),
                player.position.x,
                player.position.y,
                player.weapon.clone(),
            )
        };
        self.world.score_mut(&id);

        info!("Session {} registered as '{}'", id, pseudo);

        // Registration replies are unicast: the new player gets its spawn
        // point, starting weapon and the full wall layout.
        self.unicast(&id, ServerEvent::Confirm { pseudo });
        self.unicast(&id, ServerEvent::Respawn { id: id.clone(), x, y });
        self.unicast(
            &id,
            ServerEvent::WeaponEquipped {
                weapon_type: weapon,
                previous_weapon: None,
            },
        );
        for (wall_id, wall) in self.world.walls.iter() {
            self.unicast(
                &id,
                ServerEvent::WallSpawn {
                    id: wall_id.clone(),
                    x: wall.position.x,
                    y: wall.position.y,
                },
            );
        }
    }

    /// Relay a chat message from an active session.
    fn handle_chat(&mut self, player_id: &str, message: String) {
        let Some(player) = self.world.players.get(player_id) else {
            return;
        };
        let Some(pseudo) = player.pseudo.clone() else {
            return;
        };
        let color = player.color;

        info!("[Chat] {}: {}", pseudo, message);
        self.broadcast(ServerEvent::Chat {
            pseudo,
            color,
            message,
        });
    }

    /// Position update from an active session. The reported position is
    /// trusted but clamped to the map bounds.
    fn handle_move(&mut self, player_id: &str, x: f32, y: f32, aim_angle: f32) {
        let clamped = self.world.border.clamp(Vec2::new(x, y));
        let (id, color) = {
            let Some(player) = self.world.players.get_mut(player_id) else {
                return;
            };
            if !player.is_active() {
                return;
            }
            player.position = clamped;
            player.aim_angle = aim_angle;
            (player.id.clone(), player.color)
        };
        self.broadcast(ServerEvent::Move {
            id,
            x: clamped.x,
            y: clamped.y,
            color,
            aim_angle,
        });
    }

    /// Fire request. Silently dropped while the fire-rate cooldown runs.
    fn handle_shoot(&mut self, player_id: &str, x: f32, y: f32, angle: f32) {
        let (def, weapon_type) = {
            let Some(player) = self.world.players.get(player_id) else {
                return;
            };
            if !player.is_active() {
                return;
            }
            match self.config.weapons.lookup(&player.weapon) {
                Some(def) => (def.clone(), player.weapon.clone()),
                None => return,
            }
        };

        let now = std::time::Instant::now();
        let owner = {
            let Some(player) = self.world.players.get_mut(player_id) else {
                return;
            };
            if !player.can_fire(now, def.fire_rate_duration()) {
                return;
            }
            player.last_shot_at = Some(now);
            player.id.clone()
        };

        let mut rng = rand::rng();
        for _ in 0..def.bullets_per_shot {
            let offset = if def.spread > 0.0 {
                rng.random_range(-def.spread..=def.spread)
            } else {
                0.0
            };
            let projectile = Projectile::new(
                owner.clone(),
                Vec2::new(x, y),
                angle + offset,
                def.projectile_speed,
                def.lifetime_duration(),
                weapon_type.clone(),
            );
            self.broadcast(ServerEvent::Projectile {
                id: projectile.id.clone(),
                from: owner.clone(),
                x,
                y,
                angle: projectile.angle,
                speed: def.projectile_speed,
                lifetime: def.projectile_lifetime,
                weapon_type: weapon_type.clone(),
            });
            self.world
                .projectiles
                .insert(projectile.id.clone(), projectile);
        }
    }

    /// Send an event to every connected session.
    fn broadcast(&self, event: ServerEvent) {
        let _ = self.broadcast_tx.send(event);
    }

    /// Send an event to a single session.
    fn unicast(&self, player_id: &str, event: ServerEvent) {
        let _ = self.targeted_tx.send(TargetedEvent {
            player_id: player_id.to_string(),
            event,
        });
    }

    /// Run a single simulation tick and return the events it produced.
    pub fn tick(&mut self) -> PendingEvents {
        let now = std::time::Instant::now();
        self.tick_count += 1;

        let mut pending = PendingEvents::default();
        self.run_spawners(&mut pending);
        self.advance_projectiles(now, &mut pending);
        self.advance_zombies(&mut pending);
        self.resolve_pickups(&mut pending);
        pending
    }

    /// Interval spawners for zombies and weapon pickups, scheduled on the
    /// tick counter.
    fn run_spawners(&mut self, pending: &mut PendingEvents) {
        let tick_rate = u64::from(self.config.server.tick_rate);

        let zombie_every = self.config.zombie.spawn_interval * tick_rate;
        if zombie_every > 0 && self.tick_count % zombie_every == 0 {
            let zombie = Zombie::new(self.world.random_open_position());
            pending.broadcasts.push(ServerEvent::ZombieSpawn {
                id: zombie.id.clone(),
                x: zombie.position.x,
                y: zombie.position.y,
            });
            self.world.zombies.insert(zombie.id.clone(), zombie);
        }

        let weapon_every = self.config.weapons.spawn_interval * tick_rate;
        if weapon_every > 0
            && self.tick_count % weapon_every == 0
            && self.world.pickups.len() < self.config.weapons.max_on_map
        {
            let pickup = Pickup::new(self.world.random_open_position(), self.random_weapon_type());
            pending.broadcasts.push(ServerEvent::WeaponSpawn {
                id: pickup.id.clone(),
                x: pickup.position.x,
                y: pickup.position.y,
                weapon_type: pickup.weapon_type.clone(),
            });
            self.world.pickups.insert(pickup.id.clone(), pickup);
        }
    }

    /// Pick a uniformly random weapon type from the catalog.
    fn random_weapon_type(&self) -> String {
        let names: Vec<&String> = self.config.weapons.defs.keys().collect();
        if names.is_empty() {
            return self.config.weapons.default_weapon.clone();
        }
        let mut rng = rand::rng();
        names[rng.random_range(0..names.len())].clone()
    }

    /// Advance every projectile one step and resolve its collisions.
    ///
    /// Checks run in a fixed order, first match wins: wall, then active
    /// player (never the owner), then zombie, then TTL expiry.
    fn advance_projectiles(&mut self, now: std::time::Instant, pending: &mut PendingEvents) {
        let tick_rate = self.config.server.tick_rate as f32;
        let player_hit = self.config.projectile.radius + self.config.player.radius;
        let zombie_hit = self.config.projectile.radius + self.config.zombie.radius;

        for id in self.world.projectiles.ids() {
            let (position, owner) = match self.world.projectiles.get_mut(&id) {
                Some(projectile) => {
                    projectile.advance(tick_rate);
                    (projectile.position, projectile.from.clone())
                }
                None => continue,
            };

            if self.world.walls.values().any(|wall| wall.contains(position)) {
                self.world.projectiles.remove(&id);
                continue;
            }

            let victim = self
                .world
                .players
                .iter()
                .find(|(pid, player)| {
                    player.is_active()
                        && pid.as_str() != owner
                        && circles_overlap(position, player.position, player_hit)
                })
                .map(|(pid, _)| pid.clone());
            if let Some(victim_id) = victim {
                self.world.projectiles.remove(&id);
                self.world.score_mut(&owner).players_killed += 1;
                self.respawn_player(&victim_id, pending);
                self.push_score_update(&owner, pending);
                continue;
            }

            let hit = self
                .world
                .zombies
                .iter()
                .find(|(_, zombie)| circles_overlap(position, zombie.position, zombie_hit))
                .map(|(zid, _)| zid.clone());
            if let Some(zombie_id) = hit {
                self.world.projectiles.remove(&id);
                self.world.zombies.remove(&zombie_id);
                pending
                    .broadcasts
                    .push(ServerEvent::ZombieRemove { id: zombie_id });
                self.world.score_mut(&owner).zombies_killed += 1;
                self.push_score_update(&owner, pending);
                continue;
            }

            if self
                .world
                .projectiles
                .get(&id)
                .is_some_and(|projectile| projectile.expired(now))
            {
                self.world.projectiles.remove(&id);
            }
        }
    }

    /// Move every zombie toward its target.
    ///
    /// A zombie keeps its target as long as it names an active session;
    /// only when the target is missing, inactive or disconnected does it
    /// lock onto the nearest active player. Movement is resolved per axis
    /// so a wall vetoes only the blocked component and the zombie slides
    /// along it. A `zombie_move` goes out every tick whether or not the
    /// zombie actually moved.
    fn advance_zombies(&mut self, pending: &mut PendingEvents) {
        let step = self.config.zombie.speed / self.config.server.tick_rate as f32;
        let contact = self.config.zombie.radius + self.config.player.radius;

        for id in self.world.zombies.ids() {
            let (current, current_target) = match self.world.zombies.get(&id) {
                Some(zombie) => (zombie.position, zombie.target_id.clone()),
                None => continue,
            };

            let retained = match current_target {
                Some(tid) => self
                    .world
                    .players
                    .get(&tid)
                    .filter(|player| player.is_active())
                    .map(|player| (tid, player.position)),
                None => None,
            };
            let target = retained.or_else(|| {
                self.world
                    .players
                    .iter()
                    .filter(|(_, player)| player.is_active())
                    .min_by(|a, b| {
                        distance(a.1.position, current).total_cmp(&distance(b.1.position, current))
                    })
                    .map(|(pid, player)| (pid.clone(), player.position))
            });

            let mut next = current;
            if let Some((_, target_position)) = &target {
                let delta = *target_position - current;
                if delta.length_squared() > f32::EPSILON {
                    let dir = delta.normalize();
                    let cand_x = Vec2::new(next.x + dir.x * step, next.y);
                    if !self.wall_blocked(cand_x) {
                        next.x = cand_x.x;
                    }
                    let cand_y = Vec2::new(next.x, next.y + dir.y * step);
                    if !self.wall_blocked(cand_y) {
                        next.y = cand_y.y;
                    }
                    next = self.world.border.clamp(next);
                }
            }

            if let Some(zombie) = self.world.zombies.get_mut(&id) {
                zombie.position = next;
                zombie.target_id = target.as_ref().map(|(pid, _)| pid.clone());
            }
            pending.broadcasts.push(ServerEvent::ZombieMove {
                id: id.clone(),
                x: next.x,
                y: next.y,
            });

            // Hostile contact sends the player back to a fresh spawn point.
            // No score changes; zombies are not killed by touch.
            let victims: Vec<String> = self
                .world
                .players
                .iter()
                .filter(|(_, player)| {
                    player.is_active() && circles_overlap(next, player.position, contact)
                })
                .map(|(pid, _)| pid.clone())
                .collect();
            for victim_id in victims {
                self.respawn_player(&victim_id, pending);
            }
        }
    }

    /// Resolve weapon pickups: the first active player in range claims the
    /// weapon, swapping out whatever was equipped.
    fn resolve_pickups(&mut self, pending: &mut PendingEvents) {
        let reach = self.config.weapons.pickup_radius;

        for id in self.world.pickups.ids() {
            let (position, weapon_type) = match self.world.pickups.get(&id) {
                Some(pickup) => (pickup.position, pickup.weapon_type.clone()),
                None => continue,
            };

            let claimant = self
                .world
                .players
                .iter()
                .find(|(_, player)| {
                    player.is_active() && circles_overlap(player.position, position, reach)
                })
                .map(|(pid, _)| pid.clone());
            let Some(claimant) = claimant else {
                continue;
            };

            self.world.pickups.remove(&id);
            if let Some(player) = self.world.players.get_mut(&claimant) {
                let previous = std::mem::replace(&mut player.weapon, weapon_type.clone());
                // Swapping weapons also clears the cooldown.
                player.last_shot_at = None;

                pending
                    .broadcasts
                    .push(ServerEvent::WeaponRemove { id: id.clone() });
                pending.broadcasts.push(ServerEvent::PlayerWeapon {
                    player_id: claimant.clone(),
                    weapon_type: weapon_type.clone(),
                });
                pending.targeted.push(TargetedEvent {
                    player_id: claimant,
                    event: ServerEvent::WeaponEquipped {
                        weapon_type,
                        previous_weapon: Some(previous),
                    },
                });
            }
        }
    }

    /// Drop projectiles whose TTL has elapsed.
    ///
    /// The tick sweep already does this; the loop calls it while
    /// hibernating so leftover shots from a fully disconnected map do not
    /// outlive their lifetime in the store.
    pub fn sweep_expired_projectiles(&mut self, now: std::time::Instant) {
        for id in self.world.projectiles.ids() {
            if self
                .world
                .projectiles
                .get(&id)
                .is_some_and(|projectile| projectile.expired(now))
            {
                self.world.projectiles.remove(&id);
            }
        }
    }

    /// Whether a point is inside any wall.
    fn wall_blocked(&self, point: Vec2) -> bool {
        self.world.walls.values().any(|wall| wall.contains(point))
    }

    /// Place a player at a fresh open spawn point and announce it.
    fn respawn_player(&mut self, player_id: &str, pending: &mut PendingEvents) {
        let position = self.world.random_open_position();
        if let Some(player) = self.world.players.get_mut(player_id) {
            player.position = position;
            pending.broadcasts.push(ServerEvent::Respawn {
                id: player.id.clone(),
                x: position.x,
                y: position.y,
            });
        }
    }

    /// Announce a player's score together with the refreshed leaderboard.
    fn push_score_update(&self, player_id: &str, pending: &mut PendingEvents) {
        let score = self
            .world
            .scores
            .get(player_id)
            .copied()
            .unwrap_or_default();
        pending.broadcasts.push(ServerEvent::ScoreUpdate {
            player_id: player_id.to_string(),
            zombies_killed: score.zombies_killed,
            players_killed: score.players_killed,
            top_players: self.world.top_players(),
        });
    }
}

/// Run the fixed-rate game loop until the process exits.
pub async fn run_game_loop(state: Arc<RwLock<GameState>>, tick_period: Duration) {
    let start = Instant::now() + tick_period;
    let mut ticker = interval_at(start, tick_period);
    // Use Skip to catch up on missed ticks - ensures consistent game speed.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    {
        let game = state.read().await;
        info!(
            "World initialized: {}x{}, {} walls",
            game.config.map.width,
            game.config.map.height,
            game.world.walls.len()
        );
    }

    loop {
        let scheduled = ticker.tick().await;

        // Hibernate when no sessions are connected to reduce CPU usage.
        // Projectile TTLs keep running on the wall clock, so expire them
        // here where the tick sweep is not doing it.
        {
            let mut game = state.write().await;
            if game.world.players.is_empty() {
                game.sweep_expired_projectiles(std::time::Instant::now());
                drop(game);
                sleep((tick_period * 4).max(Duration::from_millis(100))).await;
                continue;
            }
        }

        // Drain any backlog of tick events so we always process the most recent tick.
        // This keeps player inputs up-to-date when the server falls behind.
        let mut skipped = 0u32;
        while ticker.tick().now_or_never().is_some() {
            skipped += 1;
        }
        if skipped > 0 {
            debug!(
                "Skipped {} ticks to stay current (lag: {:?})",
                skipped,
                Instant::now().saturating_duration_since(scheduled)
            );
        }

        // Run tick and extract pending events
        let pending = {
            let mut game = state.write().await;
            let tick_start = std::time::Instant::now();
            let pending = game.tick();
            let tick_ms = tick_start.elapsed().as_secs_f64() * 1000.0;

            // Exponential moving average (weight 0.5, matches typical server stat smoothing)
            game.update_time_avg = game.update_time_avg * 0.5 + tick_ms * 0.5;

            let tick_budget = tick_period.as_secs_f64() * 1000.0 * 0.9;
            if tick_ms > tick_budget {
                warn!(
                    "Slow tick #{}: {:.3}ms (budget: {:.1}ms) - {} players, {} projectiles, {} zombies",
                    game.tick_count,
                    tick_ms,
                    tick_budget,
                    game.world.players.len(),
                    game.world.projectiles.len(),
                    game.world.zombies.len()
                );
            }

            pending
        }; // Write lock released here

        // Clone channel senders once with a single read lock
        let (broadcast_tx, targeted_tx) = {
            let game = state.read().await;
            (game.broadcast_tx.clone(), game.targeted_tx.clone())
        }; // Read lock released here

        // Dispatch with no locks held
        for event in pending.broadcasts {
            let _ = broadcast_tx.send(event);
        }
        for targeted in pending.targeted {
            let _ = targeted_tx.send(targeted);
        }
    }
}
