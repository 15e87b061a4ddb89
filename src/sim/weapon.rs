//! Weapons: auto-aim, projectiles, power-up drops and pickup
//!
//! The subsystem exclusively owns the projectile and drop collections. It
//! reads the enemy snapshot for targeting but never touches it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::collision::{angle_between, distance};
use super::enemy::Enemy;
use super::state::{TickContext, Viewport};
use super::timer::IntervalTimer;
use crate::sample_range;
use crate::tuning::Tuning;

/// Weapon types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    /// Base weapon, never dropped
    #[default]
    Pistol,
    /// Rapid, light shots
    Flamethrower,
    /// Slow, heavy shots
    Missile,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [
        WeaponKind::Pistol,
        WeaponKind::Flamethrower,
        WeaponKind::Missile,
    ];

    /// Kinds that can appear as drops
    pub const POWER_UPS: [WeaponKind; 2] = [WeaponKind::Flamethrower, WeaponKind::Missile];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "pistol",
            WeaponKind::Flamethrower => "flamethrower",
            WeaponKind::Missile => "missile",
        }
    }

    pub fn is_base(&self) -> bool {
        *self == WeaponKind::Pistol
    }
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    /// Pixels per tick
    pub vel: Vec2,
    pub damage: f32,
    /// Collision radius
    pub size: f32,
    pub color: String,
    /// Maximum travel distance
    pub range: f32,
    pub distance_traveled: f32,
    pub weapon: WeaponKind,
}

impl Projectile {
    fn advance(&mut self) {
        self.pos += self.vel;
        self.distance_traveled += self.vel.length();
    }

    fn is_live(&self, viewport: &Viewport) -> bool {
        viewport.contains(self.pos) && self.distance_traveled < self.range
    }
}

/// A power-up lying on the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponDrop {
    pub id: u32,
    pub pos: Vec2,
    pub kind: WeaponKind,
    pub spawn_time_ms: f64,
}

/// Angle from `from` to the closest enemy, or `None` with nothing to shoot.
///
/// Ties go to the first enemy found with the strictly smallest distance.
pub fn nearest_enemy_angle(from: Vec2, enemies: &[Enemy]) -> Option<f32> {
    let mut nearest: Option<(&Enemy, f32)> = None;
    for enemy in enemies.iter().filter(|e| e.is_alive()) {
        let d = distance(from, enemy.pos);
        if nearest.is_none_or(|(_, best)| d < best) {
            nearest = Some((enemy, d));
        }
    }
    nearest.map(|(enemy, _)| angle_between(from, enemy.pos))
}

/// Owner of projectiles and drops
#[derive(Debug, Clone)]
pub struct WeaponSubsystem {
    projectiles: Vec<Projectile>,
    drops: Vec<WeaponDrop>,
    next_projectile_id: u32,
    next_drop_id: u32,
    last_fired_ms: Option<f64>,
    drop_timer: IntervalTimer,
    rng: Pcg32,
}

impl WeaponSubsystem {
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            projectiles: Vec::new(),
            drops: Vec::new(),
            next_projectile_id: 1,
            next_drop_id: 1,
            last_fired_ms: None,
            drop_timer: IntervalTimer::new(tuning.drop_spawn_interval_ms),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn drops(&self) -> &[WeaponDrop] {
        &self.drops
    }

    /// Fire at the nearest enemy if the equipped weapon's interval has
    /// elapsed since the last shot. Returns the new projectile's id.
    pub fn auto_fire(
        &mut self,
        ctx: &TickContext,
        weapon: WeaponKind,
        enemies: &[Enemy],
    ) -> Option<u32> {
        let interval = ctx.tuning.weapon(weapon).fire_interval_ms;
        if self.last_fired_ms.is_some_and(|last| ctx.now_ms - last <= interval) {
            return None;
        }
        let angle = nearest_enemy_angle(ctx.player, enemies)?;
        let id = self.fire(ctx, weapon, angle);
        self.last_fired_ms = Some(ctx.now_ms);
        Some(id)
    }

    /// Spawn a projectile at the player heading along `angle`
    pub fn fire(&mut self, ctx: &TickContext, weapon: WeaponKind, angle: f32) -> u32 {
        let profile = ctx.tuning.weapon(weapon);
        let id = self.next_projectile_id;
        self.next_projectile_id += 1;
        self.projectiles.push(Projectile {
            id,
            pos: ctx.player,
            vel: Vec2::from_angle(angle) * ctx.tuning.projectile_speed,
            damage: profile.damage,
            size: profile.size,
            color: profile.color.clone(),
            range: ctx.tuning.projectile_range,
            distance_traveled: 0.0,
            weapon,
        });
        id
    }

    /// Advance projectiles one tick; drop the ones off-screen or out of range
    pub fn update_projectiles(&mut self, viewport: &Viewport) {
        for p in &mut self.projectiles {
            p.advance();
        }
        self.projectiles.retain(|p| p.is_live(viewport));
    }

    /// Remove consumed projectiles. Ids may repeat; each is removed once.
    pub fn remove_projectiles(&mut self, ids: &[u32]) -> usize {
        let consumed: HashSet<u32> = ids.iter().copied().collect();
        let before = self.projectiles.len();
        self.projectiles.retain(|p| !consumed.contains(&p.id));
        before - self.projectiles.len()
    }

    pub fn start_drop_spawning(&mut self, now_ms: f64) {
        if self.drop_timer.start(now_ms) {
            log::debug!("Drop spawning started");
        }
    }

    pub fn stop_drop_spawning(&mut self) {
        self.drop_timer.stop();
    }

    /// Spawn a drop if the timer is due
    pub fn poll_drops(&mut self, ctx: &TickContext) -> Option<&WeaponDrop> {
        if self.drop_timer.poll(ctx.now_ms) {
            self.spawn_drop(ctx)
        } else {
            None
        }
    }

    /// Place a random power-up inside the viewport, unless the field is full
    pub fn spawn_drop(&mut self, ctx: &TickContext) -> Option<&WeaponDrop> {
        if self.drops.len() >= ctx.tuning.max_drops {
            return None;
        }
        let inset = ctx.tuning.drop_inset;
        let vp = ctx.viewport;
        let pos = Vec2::new(
            sample_range(&mut self.rng, inset, vp.width - inset),
            sample_range(&mut self.rng, inset, vp.height - inset),
        );
        let kind = WeaponKind::POWER_UPS[self.rng.random_range(0..WeaponKind::POWER_UPS.len())];
        let id = self.next_drop_id;
        self.next_drop_id += 1;

        log::debug!("Dropped {} #{} at ({:.0}, {:.0})", kind.as_str(), id, pos.x, pos.y);
        self.drops.push(WeaponDrop {
            id,
            pos,
            kind,
            spawn_time_ms: ctx.now_ms,
        });
        self.drops.last()
    }

    /// Remove drops older than `lifetime_ms`
    pub fn expire_drops(&mut self, now_ms: f64, lifetime_ms: f64) -> usize {
        let before = self.drops.len();
        self.drops.retain(|d| now_ms - d.spawn_time_ms < lifetime_ms);
        before - self.drops.len()
    }

    /// Consume every drop within `radius` of the player, calling `on_equip`
    /// once per drop in collection order. Returns how many were consumed.
    pub fn check_pickup(
        &mut self,
        player: Vec2,
        radius: f32,
        mut on_equip: impl FnMut(&WeaponDrop),
    ) -> usize {
        let before = self.drops.len();
        self.drops.retain(|d| {
            if distance(d.pos, player) < radius {
                on_equip(d);
                false
            } else {
                true
            }
        });
        before - self.drops.len()
    }

    /// Call `on_expire` if a power-up expiry time has passed
    pub fn check_expiry(
        &self,
        expiry_ms: Option<f64>,
        now_ms: f64,
        on_expire: impl FnOnce(),
    ) -> bool {
        match expiry_ms {
            Some(expiry) if now_ms > expiry => {
                on_expire();
                true
            }
            _ => false,
        }
    }

    /// Drop all projectiles and drops and reset the fire cooldown (teardown)
    pub fn clear(&mut self) {
        self.projectiles.clear();
        self.drops.clear();
        self.last_fired_ms = None;
    }

    #[cfg(test)]
    pub(crate) fn insert_drop(&mut self, drop: WeaponDrop) {
        self.drops.push(drop);
    }

    #[cfg(test)]
    pub(crate) fn insert_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ctx(tuning: &Tuning, player: Vec2, now_ms: f64) -> TickContext<'_> {
        TickContext {
            player,
            viewport: Viewport::new(1000.0, 800.0),
            now_ms,
            tuning,
        }
    }

    fn dummy(id: u32, x: f32, y: f32) -> Enemy {
        Enemy::test_dummy(id, Vec2::new(x, y), 20.0, 100.0)
    }

    fn drop_at(id: u32, pos: Vec2, kind: WeaponKind) -> WeaponDrop {
        WeaponDrop {
            id,
            pos,
            kind,
            spawn_time_ms: 0.0,
        }
    }

    #[test]
    fn test_nearest_enemy_angle() {
        let from = Vec2::new(100.0, 100.0);
        assert_eq!(nearest_enemy_angle(from, &[]), None);

        let enemies = vec![dummy(1, 400.0, 100.0), dummy(2, 100.0, 150.0), dummy(3, 0.0, 0.0)];
        let angle = nearest_enemy_angle(from, &enemies).unwrap();
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_nearest_enemy_tie_goes_to_first() {
        let from = Vec2::ZERO;
        let enemies = vec![dummy(1, 10.0, 0.0), dummy(2, -10.0, 0.0)];
        let angle = nearest_enemy_angle(from, &enemies).unwrap();
        assert!(angle.abs() < 1e-6);
    }

    #[test]
    fn test_auto_fire_needs_target() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        assert_eq!(weapons.auto_fire(&ctx(&tuning, Vec2::ZERO, 0.0), WeaponKind::Pistol, &[]), None);
        assert!(weapons.projectiles().is_empty());
        // Not firing doesn't consume the cooldown
        let enemies = vec![dummy(1, 50.0, 0.0)];
        assert!(weapons.auto_fire(&ctx(&tuning, Vec2::ZERO, 1.0), WeaponKind::Pistol, &enemies).is_some());
    }

    #[test]
    fn test_auto_fire_rate_limited_per_weapon() {
        let tuning = Tuning::default();
        let enemies = vec![dummy(1, 500.0, 400.0)];
        let player = Vec2::new(100.0, 100.0);

        for (kind, interval) in [
            (WeaponKind::Pistol, 300.0),
            (WeaponKind::Flamethrower, 100.0),
            (WeaponKind::Missile, 800.0),
        ] {
            let mut weapons = WeaponSubsystem::new(1, &tuning);
            assert!(weapons.auto_fire(&ctx(&tuning, player, 1000.0), kind, &enemies).is_some());
            // Exactly one interval later is still too soon
            assert!(weapons.auto_fire(&ctx(&tuning, player, 1000.0 + interval), kind, &enemies).is_none());
            assert!(weapons.auto_fire(&ctx(&tuning, player, 1001.0 + interval), kind, &enemies).is_some());
            assert_eq!(weapons.projectiles().len(), 2);
        }
    }

    #[test]
    fn test_projectile_profile_matches_weapon() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        let player = Vec2::new(200.0, 200.0);
        weapons.fire(&ctx(&tuning, player, 0.0), WeaponKind::Missile, 0.0);
        let p = &weapons.projectiles()[0];
        assert_eq!(p.pos, player);
        assert!((p.vel - Vec2::new(8.0, 0.0)).length() < 1e-5);
        assert_eq!(p.damage, 100.0);
        assert_eq!(p.size, 8.0);
        assert_eq!(p.color, "#f44336");
        assert_eq!(p.range, 400.0);
        assert_eq!(p.weapon, WeaponKind::Missile);
    }

    #[test]
    fn test_projectile_expires_at_range() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        let c = ctx(&tuning, Vec2::ZERO, 0.0);
        weapons.fire(&c, WeaponKind::Pistol, 0.0);

        for _ in 0..49 {
            weapons.update_projectiles(&c.viewport);
        }
        assert_eq!(weapons.projectiles().len(), 1);
        assert_eq!(weapons.projectiles()[0].distance_traveled, 392.0);

        // 50 ticks: 400 traveled, at range
        weapons.update_projectiles(&c.viewport);
        assert!(weapons.projectiles().is_empty());

        // Still gone by 51
        weapons.update_projectiles(&c.viewport);
        assert!(weapons.projectiles().is_empty());
    }

    #[test]
    fn test_projectile_expires_off_screen() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        let c = ctx(&tuning, Vec2::new(995.0, 400.0), 0.0);
        weapons.fire(&c, WeaponKind::Pistol, 0.0);
        weapons.update_projectiles(&c.viewport);
        assert!(weapons.projectiles().is_empty());
    }

    #[test]
    fn test_remove_projectiles_dedupes() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        let c = ctx(&tuning, Vec2::new(500.0, 400.0), 0.0);
        let a = weapons.fire(&c, WeaponKind::Pistol, 0.0);
        let b = weapons.fire(&c, WeaponKind::Pistol, 1.0);
        assert_eq!(weapons.remove_projectiles(&[a, a, a, 999]), 1);
        assert_eq!(weapons.projectiles().len(), 1);
        assert_eq!(weapons.projectiles()[0].id, b);
    }

    #[test]
    fn test_drop_spawn_capped_and_inset() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(9, &tuning);
        let c = ctx(&tuning, Vec2::ZERO, 0.0);
        for _ in 0..5 {
            weapons.spawn_drop(&c);
        }
        assert_eq!(weapons.drops().len(), 3);
        for d in weapons.drops() {
            assert!(!d.kind.is_base());
            assert!(d.pos.x >= 50.0 && d.pos.x <= 950.0);
            assert!(d.pos.y >= 50.0 && d.pos.y <= 750.0);
        }
    }

    #[test]
    fn test_drop_timer() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(9, &tuning);
        weapons.start_drop_spawning(0.0);
        assert!(weapons.poll_drops(&ctx(&tuning, Vec2::ZERO, 9_999.0)).is_none());
        assert!(weapons.poll_drops(&ctx(&tuning, Vec2::ZERO, 10_000.0)).is_some());
        weapons.stop_drop_spawning();
        assert!(weapons.poll_drops(&ctx(&tuning, Vec2::ZERO, 20_000.0)).is_none());
    }

    #[test]
    fn test_two_pickups_same_tick() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        let player = Vec2::new(300.0, 300.0);
        weapons.drops.push(drop_at(1, Vec2::new(310.0, 300.0), WeaponKind::Flamethrower));
        weapons.drops.push(drop_at(2, Vec2::new(600.0, 600.0), WeaponKind::Missile));
        weapons.drops.push(drop_at(3, Vec2::new(300.0, 330.0), WeaponKind::Missile));

        let mut current = WeaponKind::Pistol;
        let mut equips = 0;
        let consumed = weapons.check_pickup(player, tuning.pickup_radius, |d| {
            equips += 1;
            current = d.kind;
        });
        assert_eq!(consumed, 2);
        assert_eq!(equips, 2);
        // Last call wins
        assert_eq!(current, WeaponKind::Missile);
        assert_eq!(weapons.drops().len(), 1);
        assert_eq!(weapons.drops()[0].id, 2);
    }

    #[test]
    fn test_pickup_radius_is_strict() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        weapons.drops.push(drop_at(1, Vec2::new(40.0, 0.0), WeaponKind::Missile));
        assert_eq!(weapons.check_pickup(Vec2::ZERO, 40.0, |_| {}), 0);
    }

    #[test]
    fn test_check_expiry() {
        let tuning = Tuning::default();
        let weapons = WeaponSubsystem::new(1, &tuning);
        let mut reverted = 0;
        assert!(!weapons.check_expiry(None, 1e9, || reverted += 1));
        assert!(!weapons.check_expiry(Some(7000.0), 7000.0, || reverted += 1));
        assert!(weapons.check_expiry(Some(7000.0), 7001.0, || reverted += 1));
        assert_eq!(reverted, 1);
    }

    #[test]
    fn test_expire_drops() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        weapons.drops.push(drop_at(1, Vec2::ZERO, WeaponKind::Missile));
        weapons.drops.push(WeaponDrop {
            spawn_time_ms: 5_000.0,
            ..drop_at(2, Vec2::ZERO, WeaponKind::Flamethrower)
        });
        assert_eq!(weapons.expire_drops(8_000.0, 5_000.0), 1);
        assert_eq!(weapons.drops()[0].id, 2);
    }

    #[test]
    fn test_clear() {
        let tuning = Tuning::default();
        let mut weapons = WeaponSubsystem::new(1, &tuning);
        let c = ctx(&tuning, Vec2::new(500.0, 400.0), 0.0);
        weapons.fire(&c, WeaponKind::Pistol, 0.0);
        weapons.spawn_drop(&c);
        weapons.clear();
        assert!(weapons.projectiles().is_empty());
        assert!(weapons.drops().is_empty());
    }

    proptest! {
        #[test]
        fn prop_distance_is_ticks_times_speed(angle in 0.0f32..std::f32::consts::TAU, ticks in 0usize..40) {
            let tuning = Tuning::default();
            let mut weapons = WeaponSubsystem::new(1, &tuning);
            // Center of a big field: never leaves the screen before range
            let c = TickContext {
                player: Vec2::new(1000.0, 1000.0),
                viewport: Viewport::new(2000.0, 2000.0),
                now_ms: 0.0,
                tuning: &tuning,
            };
            weapons.fire(&c, WeaponKind::Pistol, angle);
            for _ in 0..ticks {
                weapons.update_projectiles(&c.viewport);
            }
            let p = &weapons.projectiles()[0];
            prop_assert!((p.distance_traveled - ticks as f32 * 8.0).abs() < 1e-2);
        }
    }
}
