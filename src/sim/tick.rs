//! Game orchestrator and per-tick update
//!
//! `Game::frame` is called once per display frame. It polls the wall-clock
//! timers, then runs at most one tick if at least `TICK_THRESHOLD_MS` passed
//! since the previous one. Slow frames therefore skip ticks instead of
//! catching up in bursts, so game speed follows the display rate a little.

use super::collision::{player_vs_enemies, projectiles_vs_enemies};
use super::enemy::{Enemy, EnemySubsystem};
use super::state::{GameEvent, GamePhase, GameStats, Player, TickContext, Viewport};
use super::timer::IntervalTimer;
use super::weapon::{Projectile, WeaponDrop, WeaponKind, WeaponSubsystem};
use crate::consts::*;
use crate::input::JoystickDirection;
use crate::session::{GameResults, MemoryStore, SessionStore};
use crate::tuning::Tuning;

/// One play session: Idle -> Running -> GameOver, back to Idle on teardown
pub struct Game<S: SessionStore = MemoryStore> {
    tuning: Tuning,
    phase: GamePhase,
    viewport: Viewport,
    player: Player,
    stats: GameStats,
    enemies: EnemySubsystem,
    weapons: WeaponSubsystem,
    /// Time-alive bookkeeping
    clock: IntervalTimer,
    started_ms: f64,
    last_tick_ms: Option<f64>,
    ticks: u64,
    input: JoystickDirection,
    /// Unbounded until drained; the frame loop drains it every frame
    events: Vec<GameEvent>,
    results: Option<GameResults>,
    store: S,
}

impl<S: SessionStore> Game<S> {
    pub fn new(seed: u64, tuning: Tuning, viewport: Viewport, store: S) -> Self {
        let enemies = EnemySubsystem::new(seed, &tuning);
        let weapons = WeaponSubsystem::new(seed.wrapping_add(0x9E37_79B9_7F4A_7C15), &tuning);
        Self {
            phase: GamePhase::Idle,
            viewport,
            player: Player::new(viewport.center()),
            stats: GameStats::default(),
            enemies,
            weapons,
            clock: IntervalTimer::new(CLOCK_PERIOD_MS),
            started_ms: 0.0,
            last_tick_ms: None,
            ticks: 0,
            input: JoystickDirection::ZERO,
            events: Vec::new(),
            results: None,
            store,
            tuning,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn enemies(&self) -> &[Enemy] {
        self.enemies.enemies()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        self.weapons.projectiles()
    }

    pub fn drops(&self) -> &[WeaponDrop] {
        self.weapons.drops()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Stats recorded when the run ended
    pub fn results(&self) -> Option<&GameResults> {
        self.results.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Latest joystick state; held until the next change
    pub fn set_input(&mut self, input: JoystickDirection) {
        self.input = input;
    }

    /// Viewport changed; the player is recentered
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.player.pos = viewport.center();
    }

    /// Events since the last drain, oldest first.
    ///
    /// Callers should drain once per frame. Undrained events from a previous
    /// run are discarded by [`start`](Self::start).
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Idle -> Running: arm timers and reset the board.
    /// Returns false (and changes nothing) from any other phase.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.phase != GamePhase::Idle {
            return false;
        }
        self.phase = GamePhase::Running;
        self.stats = GameStats::default();
        self.player = Player::new(self.viewport.center());
        self.results = None;
        self.started_ms = now_ms;
        self.last_tick_ms = None;
        self.ticks = 0;
        self.events.clear();

        self.enemies.start_spawning(now_ms);
        self.weapons.start_drop_spawning(now_ms);
        self.clock.start(now_ms);

        self.events.push(GameEvent::Started);
        log::info!(
            "Game started ({}x{})",
            self.viewport.width,
            self.viewport.height
        );
        true
    }

    /// Drive one display frame. Returns whether a tick ran.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.poll_timers(now_ms);

        let due = self
            .last_tick_ms
            .is_none_or(|last| now_ms - last >= TICK_THRESHOLD_MS);
        if !due {
            return false;
        }
        self.last_tick_ms = Some(now_ms);
        self.tick(now_ms);
        true
    }

    fn poll_timers(&mut self, now_ms: f64) {
        let ctx = TickContext {
            player: self.player.pos,
            viewport: self.viewport,
            now_ms,
            tuning: &self.tuning,
        };

        let spawned = self.enemies.poll_spawn(&ctx);
        if spawned > 0 {
            self.events.push(GameEvent::EnemiesSpawned { count: spawned });
        }
        if let Some(drop) = self.weapons.poll_drops(&ctx) {
            self.events.push(GameEvent::DropSpawned {
                id: drop.id,
                kind: drop.kind,
            });
        }
        if self.clock.poll(now_ms) {
            self.stats.time_alive_secs = self.elapsed_secs(now_ms);
        }
    }

    fn elapsed_secs(&self, now_ms: f64) -> u32 {
        ((now_ms - self.started_ms) / 1000.0).floor().max(0.0) as u32
    }

    /// One simulation step. Order matters: player, enemies, weapons,
    /// pickups, hits, expiry, then the player collision check.
    pub fn tick(&mut self, now_ms: f64) {
        if self.phase != GamePhase::Running {
            return;
        }
        self.ticks += 1;

        // Player
        if self.input.is_active() {
            self.player.steer(self.input.vector(), &self.viewport);
        }

        let ctx = TickContext {
            player: self.player.pos,
            viewport: self.viewport,
            now_ms,
            tuning: &self.tuning,
        };

        // Enemies
        self.enemies.update(&ctx);

        // Weapons
        if let Some(id) = self
            .weapons
            .auto_fire(&ctx, self.player.weapon, self.enemies.enemies())
        {
            self.events.push(GameEvent::ProjectileFired {
                id,
                weapon: self.player.weapon,
            });
        }
        self.weapons.update_projectiles(&self.viewport);

        // Pickups
        let player = &mut self.player;
        let stats = &mut self.stats;
        let events = &mut self.events;
        let duration = self.tuning.weapon_duration_ms;
        let bonus = self.tuning.pickup_bonus;
        self.weapons
            .check_pickup(player.pos, self.tuning.pickup_radius, |drop| {
                player.weapon = drop.kind;
                player.weapon_expiry_ms = Some(now_ms + duration);
                stats.current_weapon = drop.kind;
                stats.score += bonus;
                events.push(GameEvent::WeaponPickedUp { kind: drop.kind });
                log::info!("Picked up {}", drop.kind.as_str());
            });
        if let Some(lifetime) = self.tuning.drop_lifetime_ms {
            self.weapons.expire_drops(now_ms, lifetime);
        }

        // Projectile hits
        let hits = projectiles_vs_enemies(self.weapons.projectiles(), self.enemies.enemies());
        if !hits.is_empty() {
            for hit in &hits {
                self.enemies.damage(hit.enemy_id, hit.damage);
            }
            let consumed: Vec<u32> = hits.iter().map(|h| h.projectile_id).collect();
            self.weapons.remove_projectiles(&consumed);
        }
        let stats = &mut self.stats;
        let events = &mut self.events;
        self.enemies.compact(|enemy| {
            stats.enemies_killed += 1;
            stats.score += enemy.reward;
            events.push(GameEvent::EnemyKilled {
                id: enemy.id,
                reward: enemy.reward,
            });
        });

        // Power-up expiry
        let player = &mut self.player;
        let stats = &mut self.stats;
        let events = &mut self.events;
        self.weapons
            .check_expiry(player.weapon_expiry_ms, now_ms, || {
                let previous = player.weapon;
                player.weapon = WeaponKind::Pistol;
                player.weapon_expiry_ms = None;
                stats.current_weapon = WeaponKind::Pistol;
                events.push(GameEvent::WeaponExpired { previous });
                log::info!("{} expired", previous.as_str());
            });

        // Caught?
        let killer = player_vs_enemies(self.player.pos, self.player.radius, self.enemies.enemies())
            .map(|e| e.id);
        if let Some(killer_id) = killer {
            self.game_over(now_ms, killer_id);
        }
    }

    /// Running -> GameOver: freeze, record and stop every timer
    fn game_over(&mut self, now_ms: f64, killer_id: u32) {
        self.phase = GamePhase::GameOver;
        self.stats.time_alive_secs = self.elapsed_secs(now_ms);
        self.stop_timers();

        let results = GameResults::from(&self.stats);
        if let Err(e) = self.store.save_results(&results) {
            log::warn!("Failed to persist results: {}", e);
        }
        log::info!(
            "Game over: score {}, {} kills, {}s (caught by #{})",
            results.score,
            results.enemies_killed,
            results.time_alive_seconds,
            killer_id
        );
        self.results = Some(results);
        self.events.push(GameEvent::GameOver { killer_id });
    }

    fn stop_timers(&mut self) {
        self.enemies.stop_spawning();
        self.weapons.stop_drop_spawning();
        self.clock.stop();
    }

    /// Leave the session: cancel every timer and empty every collection in
    /// one step, so nothing scheduled earlier can touch the next run.
    pub fn teardown(&mut self) {
        if self.phase == GamePhase::Idle {
            return;
        }
        self.stop_timers();
        self.enemies.clear();
        self.weapons.clear();
        self.phase = GamePhase::Idle;
        self.last_tick_ms = None;
        self.input = JoystickDirection::ZERO;
        self.events.push(GameEvent::TornDown);
        log::info!("Session torn down after {} ticks", self.ticks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Range;
    use glam::Vec2;

    fn game() -> Game {
        Game::new(12345, Tuning::default(), Viewport::new(800.0, 600.0), MemoryStore::new())
    }

    /// Spawned enemies stand still
    fn still_game() -> Game {
        let mut tuning = Tuning::default();
        for a in &mut tuning.archetypes {
            a.speed = Range::fixed(0.0);
        }
        Game::new(1, tuning, Viewport::new(800.0, 600.0), MemoryStore::new())
    }

    fn parked(id: u32, x: f32, y: f32, health: f32) -> Enemy {
        let mut enemy = Enemy::test_dummy(id, Vec2::new(x, y), 20.0, health);
        enemy.speed = 0.0;
        enemy
    }

    /// Frames every 16ms from `from` to `to` inclusive
    fn run(game: &mut Game, from: f64, to: f64) {
        let mut t = from;
        while t <= to {
            game.frame(t);
            t += 16.0;
        }
    }

    #[test]
    fn test_idle_does_not_tick() {
        let mut g = game();
        assert_eq!(g.phase(), GamePhase::Idle);
        assert!(!g.frame(100.0));
        assert_eq!(g.ticks(), 0);
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut g = game();
        assert!(g.start(0.0));
        assert!(!g.start(10.0));
        assert_eq!(g.phase(), GamePhase::Running);
        assert_eq!(g.drain_events(), vec![GameEvent::Started]);
    }

    #[test]
    fn test_frame_gate_skips_fast_frames() {
        let mut g = game();
        g.start(0.0);
        assert!(g.frame(0.0));
        assert!(!g.frame(10.0));
        assert!(g.frame(16.0));
        // A long stall yields one tick, not a burst
        assert!(g.frame(500.0));
        assert!(!g.frame(510.0));
        assert_eq!(g.ticks(), 3);
    }

    #[test]
    fn test_player_moves_and_clamps() {
        let mut g = game();
        g.start(0.0);
        g.set_input(JoystickDirection::from_offset(Vec2::new(50.0, 0.0), 50.0));
        g.tick(0.0);
        assert!((g.player().pos - Vec2::new(403.0, 300.0)).length() < 1e-4);

        for i in 0..500 {
            g.tick(i as f64);
        }
        assert!((g.player().pos.x - 770.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_input_holds_player() {
        let mut g = game();
        g.start(0.0);
        g.set_input(JoystickDirection::ZERO);
        g.tick(0.0);
        assert_eq!(g.player().pos, Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_first_spawn_after_delay() {
        let mut g = game();
        g.start(0.0);
        g.frame(999.0);
        assert!(g.enemies().is_empty());
        g.frame(1000.0);
        assert_eq!(g.enemies().len(), 2);
        assert!(g
            .drain_events()
            .contains(&GameEvent::EnemiesSpawned { count: 2 }));
    }

    #[test]
    fn test_shoots_down_enemy() {
        let mut g = still_game();
        g.start(0.0);
        g.enemies.insert(parked(500, 500.0, 300.0, 50.0));

        // Next spawn is due at 1000
        run(&mut g, 0.0, 990.0);
        assert!(g.enemies().is_empty());
        assert_eq!(g.stats().enemies_killed, 1);
        assert_eq!(g.stats().score, 100);
        let kills = g
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::EnemyKilled { id: 500, reward: 100 }))
            .count();
        assert_eq!(kills, 1);
    }

    #[test]
    fn test_kill_resolves_before_caught_check() {
        let mut g = game();
        g.start(0.0);
        g.drain_events();
        let pos = g.player().pos + Vec2::new(10.0, 0.0);
        g.enemies.insert(Enemy::test_dummy(9, pos, 20.0, 1.0));

        g.tick(0.0);
        // Overlapping the player, but shot down first
        assert_eq!(g.phase(), GamePhase::Running);
        assert_eq!(g.stats().enemies_killed, 1);
        assert!(g.enemies().is_empty());
        assert!(g.results().is_none());
    }

    #[test]
    fn test_shot_fired_and_lands_same_tick() {
        let mut g = still_game();
        g.start(0.0);
        g.drain_events();
        let pos = g.player().pos + Vec2::new(20.0, 0.0);
        g.enemies.insert(parked(3, pos.x, pos.y, 25.0));
        assert!(g.projectiles().is_empty());

        g.tick(0.0);
        assert_eq!(g.phase(), GamePhase::Running);
        assert_eq!(g.stats().enemies_killed, 1);
        // The new projectile moved, hit and was consumed within the tick
        assert!(g.projectiles().is_empty());
        let events = g.drain_events();
        let fired = events
            .iter()
            .position(|e| matches!(e, GameEvent::ProjectileFired { .. }));
        let killed = events
            .iter()
            .position(|e| matches!(e, GameEvent::EnemyKilled { id: 3, .. }));
        assert!(fired.is_some() && killed.is_some());
        assert!(fired < killed);
    }

    #[test]
    fn test_start_discards_stale_events() {
        let mut g = game();
        g.start(0.0);
        run(&mut g, 0.0, 2_000.0);
        g.teardown();
        // Never drained; the next run starts with a clean queue
        g.start(5_000.0);
        assert_eq!(g.drain_events(), vec![GameEvent::Started]);
    }

    #[test]
    fn test_one_projectile_hits_two_enemies() {
        let mut g = still_game();
        g.start(0.0);
        g.enemies.insert(parked(1, 500.0, 300.0, 100.0));
        g.enemies.insert(parked(2, 510.0, 300.0, 100.0));
        g.weapons.insert_projectile(Projectile {
            id: 999,
            pos: Vec2::new(497.0, 300.0),
            vel: Vec2::new(8.0, 0.0),
            damage: 100.0,
            size: 8.0,
            color: "#f44336".to_string(),
            range: 400.0,
            distance_traveled: 0.0,
            weapon: WeaponKind::Missile,
        });

        g.tick(0.0);
        assert_eq!(g.stats().enemies_killed, 2);
        assert_eq!(g.stats().score, 200);
        assert!(g.enemies().is_empty());
        assert!(g.projectiles().iter().all(|p| p.id != 999));
    }

    #[test]
    fn test_pickup_equips_and_expires() {
        let mut g = game();
        g.start(0.0);
        let center = g.player().pos;
        g.weapons.insert_drop(WeaponDrop {
            id: 1,
            pos: center + Vec2::new(10.0, 0.0),
            kind: WeaponKind::Missile,
            spawn_time_ms: 0.0,
        });

        g.tick(100.0);
        assert_eq!(g.player().weapon, WeaponKind::Missile);
        assert_eq!(g.player().weapon_expiry_ms, Some(7100.0));
        assert_eq!(g.stats().current_weapon, WeaponKind::Missile);
        assert_eq!(g.stats().score, 50);
        assert!(g.drops().is_empty());

        g.tick(7100.0);
        assert_eq!(g.player().weapon, WeaponKind::Missile);
        g.tick(7101.0);
        assert_eq!(g.player().weapon, WeaponKind::Pistol);
        assert_eq!(g.player().weapon_expiry_ms, None);
        assert_eq!(g.stats().current_weapon, WeaponKind::Pistol);
        assert!(g.drain_events().contains(&GameEvent::WeaponExpired {
            previous: WeaponKind::Missile
        }));
    }

    #[test]
    fn test_two_pickups_last_wins() {
        let mut g = game();
        g.start(0.0);
        let center = g.player().pos;
        for (id, kind) in [(1, WeaponKind::Flamethrower), (2, WeaponKind::Missile)] {
            g.weapons.insert_drop(WeaponDrop {
                id,
                pos: center + Vec2::new(id as f32 * 5.0, 0.0),
                kind,
                spawn_time_ms: 0.0,
            });
        }
        g.tick(0.0);
        assert!(g.drops().is_empty());
        assert_eq!(g.player().weapon, WeaponKind::Missile);
        assert_eq!(g.stats().score, 100);
    }

    #[test]
    fn test_caught_ends_game_and_persists() {
        let mut g = game();
        g.start(0.0);
        g.stats.score = 1234;
        let pos = g.player().pos + Vec2::new(10.0, 0.0);
        g.enemies.insert(Enemy::test_dummy(77, pos, 20.0, 10_000.0));

        assert!(g.frame(5_500.0));
        assert_eq!(g.phase(), GamePhase::GameOver);
        assert!(g.drain_events().contains(&GameEvent::GameOver { killer_id: 77 }));

        let saved = g.store().load_results().unwrap().unwrap();
        assert_eq!(saved.score, 1234);
        assert_eq!(saved.time_alive_seconds, 5);
        assert_eq!(g.results(), Some(&saved));

        // Terminal: nothing ticks or spawns afterwards
        let ticks = g.ticks();
        let population = g.enemies().len();
        assert!(!g.frame(6_000.0));
        assert!(!g.frame(60_000.0));
        assert_eq!(g.ticks(), ticks);
        assert_eq!(g.enemies().len(), population);
        assert!(!g.start(61_000.0));
    }

    #[test]
    fn test_time_alive_clock() {
        let mut g = game();
        g.start(1_000.0);
        g.frame(1_999.0);
        assert_eq!(g.stats().time_alive_secs, 0);
        g.frame(2_000.0);
        assert_eq!(g.stats().time_alive_secs, 1);
        g.frame(4_100.0);
        assert_eq!(g.stats().time_alive_secs, 3);
    }

    #[test]
    fn test_teardown_cancels_everything() {
        let mut g = game();
        g.start(0.0);
        run(&mut g, 0.0, 1_100.0);
        assert_eq!(g.enemies().len(), 2);

        g.teardown();
        assert_eq!(g.phase(), GamePhase::Idle);
        assert!(g.enemies().is_empty());
        assert!(g.projectiles().is_empty());
        assert!(g.drops().is_empty());
        assert!(!g.enemies.is_spawning());
        assert_eq!(g.drain_events().last(), Some(&GameEvent::TornDown));

        // Late frames change nothing
        assert!(!g.frame(20_000.0));
        assert!(g.enemies().is_empty());

        // A fresh run starts clean
        assert!(g.start(30_000.0));
        assert_eq!(g.stats(), &GameStats::default());
        g.frame(30_500.0);
        assert!(g.enemies().is_empty());
        g.frame(31_000.0);
        assert_eq!(g.enemies().len(), 2);
    }

    #[test]
    fn test_resize_recenters_player() {
        let mut g = game();
        g.resize(Viewport::new(1000.0, 1000.0));
        assert_eq!(g.player().pos, Vec2::new(500.0, 500.0));
        assert_eq!(g.viewport(), Viewport::new(1000.0, 1000.0));
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut g1 = game();
        let mut g2 = game();
        g1.start(0.0);
        g2.start(0.0);
        let input = JoystickDirection::from_offset(Vec2::new(10.0, -20.0), 50.0);
        g1.set_input(input);
        g2.set_input(input);
        run(&mut g1, 0.0, 8_000.0);
        run(&mut g2, 0.0, 8_000.0);

        assert_eq!(g1.ticks(), g2.ticks());
        assert_eq!(g1.stats(), g2.stats());
        assert_eq!(g1.enemies().len(), g2.enemies().len());
        for (a, b) in g1.enemies().iter().zip(g2.enemies()) {
            assert_eq!(a.pos, b.pos);
        }
    }
}
