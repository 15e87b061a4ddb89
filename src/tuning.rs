//! Data-driven game balance
//!
//! Every number that was tuned by feel lives here rather than inline, so a
//! partial JSON document can override just the values under test.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;
use crate::sim::WeaponKind;

/// Closed float range `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

impl Range {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate range that always samples `value`
    pub const fn fixed(value: f32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A named enemy variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub name: String,
    /// Render color, also the type key shown to the player
    pub color: String,
    pub health: f32,
    /// Pixels per tick
    pub speed: Range,
    /// Collision radius
    pub size: Range,
    /// Score awarded on kill
    pub reward: u64,
}

impl Archetype {
    fn new(name: &str, color: &str, health: f32, speed: Range, size: Range, reward: u64) -> Self {
        Self {
            name: name.to_string(),
            color: color.to_string(),
            health,
            speed,
            size,
            reward,
        }
    }
}

/// Per-weapon projectile profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Minimum wall-clock time between shots
    pub fire_interval_ms: f64,
    pub damage: f32,
    /// Projectile collision radius
    pub size: f32,
    pub color: String,
}

/// Profiles for every weapon kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfiles {
    pub pistol: WeaponProfile,
    pub flamethrower: WeaponProfile,
    pub missile: WeaponProfile,
}

impl WeaponProfiles {
    pub fn get(&self, kind: WeaponKind) -> &WeaponProfile {
        match kind {
            WeaponKind::Pistol => &self.pistol,
            WeaponKind::Flamethrower => &self.flamethrower,
            WeaponKind::Missile => &self.missile,
        }
    }
}

impl Default for WeaponProfiles {
    fn default() -> Self {
        Self {
            pistol: WeaponProfile {
                fire_interval_ms: 300.0,
                damage: 25.0,
                size: 3.0,
                color: "#ffeb3b".to_string(),
            },
            // Rapid and light
            flamethrower: WeaponProfile {
                fire_interval_ms: 100.0,
                damage: 15.0,
                size: 5.0,
                color: "#ff5722".to_string(),
            },
            // Slow and heavy
            missile: WeaponProfile {
                fire_interval_ms: 800.0,
                damage: 100.0,
                size: 8.0,
                color: "#f44336".to_string(),
            },
        }
    }
}

/// Complete balance table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Enemies ===
    pub archetypes: Vec<Archetype>,
    /// Population cap
    pub max_enemies: usize,
    /// Enemies added per spawn trigger
    pub enemies_per_spawn: usize,
    pub enemy_spawn_interval_ms: f64,
    /// Delay before the first spawn after spawning starts
    pub first_spawn_delay_ms: f64,
    /// Cosmetic spin, radians per tick (sampled in ±this)
    pub max_rotation_speed: f32,

    // === Weapons ===
    pub weapons: WeaponProfiles,
    /// Pixels per tick
    pub projectile_speed: f32,
    /// Maximum travel distance
    pub projectile_range: f32,

    // === Drops ===
    pub drop_spawn_interval_ms: f64,
    pub max_drops: usize,
    /// Drops spawn at least this far inside the viewport
    pub drop_inset: f32,
    pub pickup_radius: f32,
    /// How long a picked-up weapon stays equipped
    pub weapon_duration_ms: f64,
    /// Uncollected drops vanish after this long (never, if unset)
    pub drop_lifetime_ms: Option<f64>,

    // === Scoring ===
    pub pickup_bonus: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            archetypes: vec![
                Archetype::new("Fast", "#8B0000", 50.0, Range::new(1.0, 1.5), Range::new(15.0, 20.0), 50),
                Archetype::new("Normal", "#A0522D", 100.0, Range::new(0.7, 1.0), Range::new(20.0, 28.0), 100),
                Archetype::new("Strong", "#556B2F", 150.0, Range::new(0.4, 0.7), Range::new(25.0, 35.0), 200),
                Archetype::new("Tank", "#2F4F4F", 250.0, Range::new(0.3, 0.5), Range::new(30.0, 45.0), 350),
                Archetype::new("Elite", "#8B4513", 200.0, Range::new(0.6, 1.0), Range::new(28.0, 40.0), 300),
            ],
            max_enemies: 30,
            enemies_per_spawn: 2,
            enemy_spawn_interval_ms: 2000.0,
            first_spawn_delay_ms: 1000.0,
            max_rotation_speed: 0.01,

            weapons: WeaponProfiles::default(),
            projectile_speed: 8.0,
            projectile_range: 400.0,

            drop_spawn_interval_ms: 10_000.0,
            max_drops: 3,
            drop_inset: 50.0,
            pickup_radius: 40.0,
            weapon_duration_ms: 7000.0,
            drop_lifetime_ms: None,

            pickup_bonus: 50,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject tables that would make the game unplayable
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.archetypes.is_empty() {
            return Err(TuningError::NoArchetypes);
        }
        for a in &self.archetypes {
            for (field, range) in [("speed", a.speed), ("size", a.size)] {
                let name = format!("{}.{}", a.name, field);
                if range.min > range.max {
                    return Err(TuningError::InvertedRange {
                        name,
                        min: range.min,
                        max: range.max,
                    });
                }
                non_negative(name, range.min as f64)?;
            }
            positive("archetype.health", a.health as f64)?;
        }

        positive("enemy_spawn_interval_ms", self.enemy_spawn_interval_ms)?;
        positive("drop_spawn_interval_ms", self.drop_spawn_interval_ms)?;
        positive("projectile_speed", self.projectile_speed as f64)?;
        positive("projectile_range", self.projectile_range as f64)?;
        positive("max_enemies", self.max_enemies as f64)?;
        positive("enemies_per_spawn", self.enemies_per_spawn as f64)?;
        non_negative("first_spawn_delay_ms", self.first_spawn_delay_ms)?;
        positive("weapon_duration_ms", self.weapon_duration_ms)?;
        if let Some(lifetime) = self.drop_lifetime_ms {
            positive("drop_lifetime_ms", lifetime)?;
        }
        non_negative("pickup_radius", self.pickup_radius as f64)?;
        for kind in WeaponKind::ALL {
            positive("fire_interval_ms", self.weapons.get(kind).fire_interval_ms)?;
        }
        Ok(())
    }

    /// Profile for the given weapon
    pub fn weapon(&self, kind: WeaponKind) -> &WeaponProfile {
        self.weapons.get(kind)
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), TuningError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(TuningError::NotPositive { name, value })
    }
}

fn non_negative(name: impl Into<String>, value: f64) -> Result<(), TuningError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(TuningError::Negative {
            name: name.into(),
            value,
        })
    }
}
