//! Simulation module
//!
//! All gameplay logic lives here. This module must stay free of rendering and
//! platform dependencies:
//! - Wall-clock time comes in as a parameter, never read directly
//! - Seeded RNG only
//! - Each collection is mutated by exactly one subsystem

pub mod collision;
pub mod enemy;
pub mod state;
pub mod tick;
pub mod timer;
pub mod weapon;

pub use collision::{Hit, circles_overlap, player_vs_enemies, projectiles_vs_enemies};
pub use enemy::{Enemy, EnemySubsystem};
pub use state::{GameEvent, GamePhase, GameStats, Player, TickContext, Viewport};
pub use tick::Game;
pub use timer::IntervalTimer;
pub use weapon::{Projectile, WeaponDrop, WeaponKind, WeaponSubsystem, nearest_enemy_angle};
