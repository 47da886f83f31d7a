//! Game entities.
//!
//! This module defines every live entity kind owned by the world store.

mod pickup;
mod player;
mod projectile;
mod wall;
mod zombie;

pub use pickup::Pickup;
pub use player::Player;
pub use projectile::Projectile;
pub use wall::Wall;
pub use zombie::Zombie;
