//! Joystick input adapter
//!
//! Turns a pointer drag relative to the stick's center into a normalized
//! direction. Knows nothing about the game.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default drag radius in pixels for full deflection
pub const DEFAULT_MAX_DISTANCE: f32 = 50.0;

/// Normalized stick output
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JoystickDirection {
    /// Horizontal deflection in `[-1, 1]`
    pub x: f32,
    /// Vertical deflection in `[-1, 1]` (screen space, down is positive)
    pub y: f32,
    /// Deflection magnitude in `[0, 1]`
    pub distance: f32,
    /// Radians
    pub angle: f32,
}

impl JoystickDirection {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        distance: 0.0,
        angle: 0.0,
    };

    pub fn vector(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn is_active(&self) -> bool {
        self.distance > 0.0
    }

    /// Normalize a raw drag offset against the stick radius
    pub fn from_offset(offset: Vec2, max_distance: f32) -> Self {
        if max_distance <= 0.0 {
            return Self::ZERO;
        }
        let angle = offset.y.atan2(offset.x);
        let clamped = offset.length().min(max_distance);
        let knob = Vec2::from_angle(angle) * clamped;
        Self {
            x: knob.x / max_distance,
            y: knob.y / max_distance,
            distance: clamped / max_distance,
            angle,
        }
    }
}

/// Virtual thumbstick state
#[derive(Debug, Clone)]
pub struct Joystick {
    max_distance: f32,
    center: Vec2,
    dragging: bool,
    knob: Vec2,
}

impl Default for Joystick {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE)
    }
}

impl Joystick {
    pub fn new(max_distance: f32) -> Self {
        Self {
            max_distance,
            center: Vec2::ZERO,
            dragging: false,
            knob: Vec2::ZERO,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Knob offset from center, for drawing
    pub fn knob(&self) -> Vec2 {
        self.knob
    }

    /// Pointer went down; `center` is the stick's on-screen center
    pub fn press(&mut self, center: Vec2) {
        self.center = center;
        self.dragging = true;
    }

    /// Pointer moved. Returns `None` when no drag is in progress.
    pub fn drag_to(&mut self, pointer: Vec2) -> Option<JoystickDirection> {
        if !self.dragging {
            return None;
        }
        let dir = JoystickDirection::from_offset(pointer - self.center, self.max_distance);
        self.knob = dir.vector() * self.max_distance;
        Some(dir)
    }

    /// Pointer released: knob recenters, output zeroes
    pub fn release(&mut self) -> JoystickDirection {
        self.dragging = false;
        self.knob = Vec2::ZERO;
        JoystickDirection::ZERO
    }
}
