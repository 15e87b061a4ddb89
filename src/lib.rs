//! Pew Pew Heroes - a top-down survival arcade game
//!
//! Core modules:
//! - `sim`: Simulation (enemies, weapons, collisions, game loop)
//! - `input`: Joystick input adapter
//! - `session`: Session-scoped result storage and avatar lookup
//! - `tuning`: Data-driven game balance
//! - `error`: Error types for the fallible boundaries

pub mod error;
pub mod input;
pub mod session;
pub mod sim;
pub mod tuning;

pub use error::{SessionError, TuningError};
pub use input::{Joystick, JoystickDirection};
pub use session::{GameResults, MemoryStore, ScoreRating, SessionStore};
pub use tuning::Tuning;

use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Minimum elapsed real time between ticks (~60 Hz)
    pub const TICK_THRESHOLD_MS: f64 = 16.0;

    /// Player collision radius
    pub const PLAYER_RADIUS: f32 = 25.0;
    /// Player movement per tick at full joystick deflection
    pub const PLAYER_SPEED: f32 = 3.0;
    /// Player can't get closer than this to a viewport edge
    pub const PLAYER_EDGE_MARGIN: f32 = 30.0;

    /// Enemies spawn this far outside the visible bounds
    pub const SPAWN_OFFSET: f32 = 50.0;
    /// Enemies closer than this to the player hold position
    pub const ENEMY_HOLD_EPSILON: f32 = 5.0;

    /// Time-alive bookkeeping period
    pub const CLOCK_PERIOD_MS: f64 = 1000.0;
}

/// Uniform sample in `[min, max)`; returns `min` for an empty or inverted range
#[inline]
pub fn sample_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.random::<f32>() * (max - min)
}
