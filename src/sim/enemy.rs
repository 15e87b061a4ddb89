//! Enemy population: spawning, pursuit, damage and removal
//!
//! The subsystem exclusively owns the enemy collection. Deaths are marked
//! during the tick and compacted once afterwards, so nothing is removed while
//! the collection is being iterated.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::state::{TickContext, Viewport};
use super::timer::IntervalTimer;
use crate::consts::{ENEMY_HOLD_EPSILON, SPAWN_OFFSET};
use crate::sample_range;
use crate::tuning::{Archetype, Tuning};

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: u32,
    pub pos: Vec2,
    /// Where the enemy was heading as of the last update
    pub target: Vec2,
    pub health: f32,
    pub max_health: f32,
    /// Pixels per tick
    pub speed: f32,
    /// Cosmetic facing
    pub angle: f32,
    pub rotation_speed: f32,
    /// Collision radius
    pub size: f32,
    pub color: String,
    /// Index into the archetype table
    pub archetype: usize,
    pub reward: u64,
    /// Killed this tick, waiting for compaction
    #[serde(default)]
    dying: bool,
}

impl Enemy {
    fn from_archetype<R: Rng>(
        id: u32,
        archetype: usize,
        a: &Archetype,
        pos: Vec2,
        target: Vec2,
        max_spin: f32,
        rng: &mut R,
    ) -> Self {
        Self {
            id,
            pos,
            target,
            health: a.health,
            max_health: a.health,
            speed: sample_range(rng, a.speed.min, a.speed.max),
            angle: rng.random::<f32>() * TAU,
            rotation_speed: sample_range(rng, -max_spin, max_spin),
            size: sample_range(rng, a.size.min, a.size.max),
            color: a.color.clone(),
            archetype,
            reward: a.reward,
            dying: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.dying
    }

    /// Health bar fill, 0..=1
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            self.health / self.max_health
        }
    }

    /// Step toward `target` unless already within the hold distance
    fn pursue(&mut self, target: Vec2) {
        self.target = target;
        let to_target = target - self.pos;
        let dist = to_target.length();
        if dist > ENEMY_HOLD_EPSILON {
            self.pos += to_target / dist * self.speed;
        }
        self.angle = (self.angle + self.rotation_speed).rem_euclid(TAU);
    }

    #[cfg(test)]
    pub(crate) fn test_dummy(id: u32, pos: Vec2, size: f32, health: f32) -> Self {
        Self {
            id,
            pos,
            target: pos,
            health,
            max_health: health,
            speed: 1.0,
            angle: 0.0,
            rotation_speed: 0.0,
            size,
            color: "#A0522D".to_string(),
            archetype: 1,
            reward: 100,
            dying: false,
        }
    }
}

/// Screen edge an enemy enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

    /// Uniform point along this edge, pushed `SPAWN_OFFSET` outside the viewport
    pub fn spawn_point<R: Rng>(self, viewport: &Viewport, rng: &mut R) -> Vec2 {
        let along_x = rng.random::<f32>() * viewport.width;
        let along_y = rng.random::<f32>() * viewport.height;
        match self {
            Edge::Top => Vec2::new(along_x, -SPAWN_OFFSET),
            Edge::Right => Vec2::new(viewport.width + SPAWN_OFFSET, along_y),
            Edge::Bottom => Vec2::new(along_x, viewport.height + SPAWN_OFFSET),
            Edge::Left => Vec2::new(-SPAWN_OFFSET, along_y),
        }
    }
}

/// Owner of the enemy collection
#[derive(Debug, Clone)]
pub struct EnemySubsystem {
    enemies: Vec<Enemy>,
    next_id: u32,
    spawning: bool,
    spawn_timer: IntervalTimer,
    rng: Pcg32,
}

impl EnemySubsystem {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            enemies: Vec::new(),
            next_id: 1,
            spawning: false,
            spawn_timer: IntervalTimer::with_first_delay(
                tuning.enemy_spawn_interval_ms,
                tuning.first_spawn_delay_ms,
            ),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Read-only snapshot, in spawn order
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn len(&self) -> usize {
        self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enemies.is_empty()
    }

    pub fn get(&self, id: u32) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Enable spawning and arm the spawn timer. Calling it again while
    /// already spawning keeps the existing schedule.
    pub fn start_spawning(&mut self, now_ms: f64) {
        if self.spawning {
            return;
        }
        self.spawning = true;
        self.spawn_timer.start(now_ms);
        log::debug!("Enemy spawning started");
    }

    /// Disable spawning and disarm the timer (idempotent)
    pub fn stop_spawning(&mut self) {
        if self.spawning {
            log::debug!("Enemy spawning stopped");
        }
        self.spawning = false;
        self.spawn_timer.stop();
    }

    /// Spawn if the timer is due. Returns how many enemies were added.
    pub fn poll_spawn(&mut self, ctx: &TickContext) -> usize {
        if self.spawn_timer.poll(ctx.now_ms) {
            self.spawn(ctx)
        } else {
            0
        }
    }

    /// Add up to `enemies_per_spawn` enemies without exceeding the cap.
    /// Returns how many were added.
    pub fn spawn(&mut self, ctx: &TickContext) -> usize {
        if !self.spawning {
            return 0;
        }
        let tuning = ctx.tuning;
        if self.enemies.len() >= tuning.max_enemies {
            return 0;
        }
        if tuning.archetypes.is_empty() {
            log::warn!("No enemy archetypes configured, nothing to spawn");
            return 0;
        }

        let count = tuning
            .enemies_per_spawn
            .min(tuning.max_enemies - self.enemies.len());
        for _ in 0..count {
            let edge = Edge::ALL[self.rng.random_range(0..Edge::ALL.len())];
            let pos = edge.spawn_point(&ctx.viewport, &mut self.rng);
            let archetype = self.rng.random_range(0..tuning.archetypes.len());
            let id = self.next_id;
            self.next_id += 1;

            let enemy = Enemy::from_archetype(
                id,
                archetype,
                &tuning.archetypes[archetype],
                pos,
                ctx.player,
                tuning.max_rotation_speed,
                &mut self.rng,
            );
            log::debug!(
                "Spawned {} #{} at ({:.0}, {:.0}) from {:?}",
                tuning.archetypes[archetype].name,
                id,
                pos.x,
                pos.y,
                edge
            );
            self.enemies.push(enemy);
        }
        count
    }

    /// Move every enemy one step toward the live player position
    pub fn update(&mut self, ctx: &TickContext) {
        for enemy in &mut self.enemies {
            enemy.pursue(ctx.player);
        }
    }

    /// Apply damage. Health stays within `0..=max_health`; a lethal hit marks
    /// the enemy for removal at the next [`compact`](Self::compact).
    ///
    /// Returns true only for the hit that kills. Unknown or already-dying ids
    /// are ignored.
    pub fn damage(&mut self, id: u32, amount: f32) -> bool {
        let Some(enemy) = self.enemies.iter_mut().find(|e| e.id == id && !e.dying) else {
            return false;
        };
        enemy.health = (enemy.health - amount).clamp(0.0, enemy.max_health);
        if enemy.health <= 0.0 {
            enemy.dying = true;
            return true;
        }
        false
    }

    /// Drop every enemy marked as dying, reporting each kill exactly once
    pub fn compact(&mut self, mut on_kill: impl FnMut(&Enemy)) -> usize {
        let before = self.enemies.len();
        self.enemies.retain(|e| {
            if e.dying {
                on_kill(e);
                false
            } else {
                true
            }
        });
        before - self.enemies.len()
    }

    /// Remove an enemy immediately, reporting the kill. No-op for stale ids.
    pub fn remove(&mut self, id: u32, on_kill: impl FnOnce(&Enemy)) -> bool {
        let Some(index) = self.enemies.iter().position(|e| e.id == id) else {
            return false;
        };
        let enemy = self.enemies.remove(index);
        on_kill(&enemy);
        true
    }

    /// Drop the whole population without reporting kills (teardown)
    pub fn clear(&mut self) {
        self.enemies.clear();
    }

    #[cfg(test)]
    pub(crate) fn insert(&mut self, enemy: Enemy) {
        self.enemies.push(enemy);
    }
}
