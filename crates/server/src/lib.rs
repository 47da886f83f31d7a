//! Authoritative zombie arena game server library.

pub mod config;
pub mod entity;
pub mod geometry;
pub mod server;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{GameState, PendingEvents, TargetedEvent, run, run_game_loop};
pub use world::World;
