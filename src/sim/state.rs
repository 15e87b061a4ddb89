//! Game state and core simulation types
//!
//! Everything the orchestrator owns directly (player, stats, phase) plus the
//! per-tick context handed to each subsystem.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::weapon::WeaponKind;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No run in progress; timers stopped, collections empty
    #[default]
    Idle,
    /// Timers armed, frame loop ticking
    Running,
    /// Player was caught; nothing ticks until teardown
    GameOver,
}

/// Visible drawing area in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Inclusive bounds check
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Clamp a point to stay `margin` away from every edge.
    ///
    /// Never panics: on a viewport narrower than `2 * margin` the point pins
    /// to the low margin.
    pub fn clamp_inset(&self, p: Vec2, margin: f32) -> Vec2 {
        Vec2::new(
            p.x.min(self.width - margin).max(margin),
            p.y.min(self.height - margin).max(margin),
        )
    }
}

/// The player's avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub weapon: WeaponKind,
    /// When the equipped power-up reverts to the base weapon
    pub weapon_expiry_ms: Option<f64>,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            radius: PLAYER_RADIUS,
            weapon: WeaponKind::Pistol,
            weapon_expiry_ms: None,
        }
    }

    /// Move along a joystick vector, staying inside the viewport margin
    pub fn steer(&mut self, direction: Vec2, viewport: &Viewport) {
        let next = self.pos + direction * PLAYER_SPEED;
        self.pos = viewport.clamp_inset(next, PLAYER_EDGE_MARGIN);
    }
}

/// Running score board
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u64,
    pub enemies_killed: u32,
    pub time_alive_secs: u32,
    pub current_weapon: WeaponKind,
}

/// Notable things that happened during a frame, for HUD/renderer/audio hooks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    EnemiesSpawned { count: usize },
    EnemyKilled { id: u32, reward: u64 },
    ProjectileFired { id: u32, weapon: WeaponKind },
    DropSpawned { id: u32, kind: WeaponKind },
    WeaponPickedUp { kind: WeaponKind },
    WeaponExpired { previous: WeaponKind },
    GameOver { killer_id: u32 },
    TornDown,
}

/// Fresh per-tick view of the world handed to each subsystem
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    /// Live player position (never a cached copy)
    pub player: Vec2,
    pub viewport: Viewport,
    pub now_ms: f64,
    pub tuning: &'a Tuning,
}
