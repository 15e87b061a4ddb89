//! Circle collision over entity snapshots
//!
//! Everything here is a pure function: no state, no mutation. The orchestrator
//! decides what to do with the results.

use glam::Vec2;

use super::enemy::Enemy;
use super::weapon::Projectile;

/// Euclidean distance between two points
#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    (a - b).length()
}

/// Angle (radians, screen space) of the vector from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// True iff the circles overlap. Exact tangency is not a hit.
#[inline]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    distance(a, b) < radius_a + radius_b
}

/// First enemy, in collection order, touching the player
pub fn player_vs_enemies(player: Vec2, player_radius: f32, enemies: &[Enemy]) -> Option<&Enemy> {
    enemies
        .iter()
        .find(|e| circles_overlap(player, player_radius, e.pos, e.size))
}

/// One projectile/enemy overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub projectile_id: u32,
    pub enemy_id: u32,
    pub damage: f32,
}

/// Every overlapping (projectile, enemy) pair.
///
/// A projectile can appear in several pairs and so can an enemy; callers that
/// consume projectiles must dedupe by `projectile_id`.
pub fn projectiles_vs_enemies(projectiles: &[Projectile], enemies: &[Enemy]) -> Vec<Hit> {
    let mut hits = Vec::new();
    for p in projectiles {
        for e in enemies {
            if circles_overlap(p.pos, p.size, e.pos, e.size) {
                hits.push(Hit {
                    projectile_id: p.id,
                    enemy_id: e.id,
                    damage: p.damage,
                });
            }
        }
    }
    hits
}
