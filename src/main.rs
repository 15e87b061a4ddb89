//! Pew Pew Heroes entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, HtmlImageElement, PointerEvent};

    use pew_pew_heroes::session::WebStore;
    use pew_pew_heroes::sim::{Game, GameEvent, GamePhase, Viewport, WeaponKind};
    use pew_pew_heroes::{Joystick, SessionError, SessionStore, Tuning};

    const SETUP_URL: &str = "/setup";
    const RESULT_URL: &str = "/result";
    const BACKGROUND: &str = "#1a1a1a";
    const PLAYER_COLOR: &str = "#4ecdc4";
    const DROP_RADIUS: f64 = 20.0;

    /// Page-level state shared with the event closures
    struct App {
        game: Game<WebStore>,
        joystick: Joystick,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        avatar: HtmlImageElement,
        /// Pending requestAnimationFrame handle
        raf: Option<i32>,
    }

    impl App {
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let w = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0);
            let h = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0);
            self.canvas.set_width(w as u32);
            self.canvas.set_height(h as u32);
            self.game.resize(Viewport::new(w as f32, h as f32));
        }

        /// Drain events; returns true once the run has ended
        fn handle_events(&mut self) -> bool {
            let mut over = false;
            for event in self.game.drain_events() {
                match event {
                    GameEvent::GameOver { killer_id } => {
                        log::info!("Caught by enemy #{}", killer_id);
                        over = true;
                    }
                    GameEvent::WeaponPickedUp { kind } => {
                        log::debug!("Equipped {}", kind.as_str());
                    }
                    _ => {}
                }
            }
            over
        }

        fn render(&self, now_ms: f64) -> Result<(), JsValue> {
            let ctx = &self.ctx;
            let vp = self.game.viewport();
            let (w, h) = (vp.width as f64, vp.height as f64);

            ctx.clear_rect(0.0, 0.0, w, h);
            ctx.set_fill_style_str(BACKGROUND);
            ctx.fill_rect(0.0, 0.0, w, h);

            // Drops pulse with age
            for drop in self.game.drops() {
                let age = now_ms - drop.spawn_time_ms;
                ctx.save();
                ctx.set_global_alpha((age / 200.0).sin() * 0.3 + 0.7);
                ctx.set_fill_style_str(&self.game.tuning().weapon(drop.kind).color);
                circle(ctx, drop.pos, DROP_RADIUS)?;
                ctx.fill();
                ctx.set_stroke_style_str("#fff");
                ctx.set_line_width(3.0);
                ctx.stroke();
                ctx.restore();
            }

            let glow = self.game.player().weapon == WeaponKind::Flamethrower;
            for p in self.game.projectiles() {
                ctx.set_fill_style_str(&p.color);
                circle(ctx, p.pos, p.size as f64)?;
                ctx.fill();
                if glow {
                    ctx.set_shadow_blur(10.0);
                    ctx.set_shadow_color(&p.color);
                    ctx.fill();
                    ctx.set_shadow_blur(0.0);
                }
            }

            for e in self.game.enemies() {
                let size = e.size as f64;
                ctx.save();
                ctx.set_fill_style_str(&e.color);
                circle(ctx, e.pos, size)?;
                ctx.fill();
                ctx.set_stroke_style_str("#333");
                ctx.set_line_width(2.0);
                ctx.stroke();

                // Health bar
                let bar_w = size * 2.0;
                let x = e.pos.x as f64 - size;
                let y = e.pos.y as f64 - size - 10.0;
                let frac = e.health_fraction() as f64;
                ctx.set_fill_style_str("#333");
                ctx.fill_rect(x, y, bar_w, 4.0);
                ctx.set_fill_style_str(if frac > 0.5 { "#4caf50" } else { "#f44336" });
                ctx.fill_rect(x, y, bar_w * frac, 4.0);
                ctx.restore();
            }

            // Player: avatar clipped to a circle
            let player = self.game.player();
            let r = player.radius as f64;
            if self.avatar.complete() && self.avatar.natural_width() > 0 {
                ctx.save();
                circle(ctx, player.pos, r)?;
                ctx.clip();
                ctx.draw_image_with_html_image_element_and_dw_and_dh(
                    &self.avatar,
                    player.pos.x as f64 - r,
                    player.pos.y as f64 - r,
                    r * 2.0,
                    r * 2.0,
                )?;
                ctx.restore();
            } else {
                ctx.set_fill_style_str(PLAYER_COLOR);
                circle(ctx, player.pos, r)?;
                ctx.fill();
            }
            ctx.set_stroke_style_str(PLAYER_COLOR);
            ctx.set_line_width(3.0);
            circle(ctx, player.pos, r)?;
            ctx.stroke();
            Ok(())
        }

        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let stats = self.game.stats();
            let fields = [
                ("hud-score", stats.score.to_string()),
                ("hud-kills", stats.enemies_killed.to_string()),
                ("hud-time", format!("{}s", stats.time_alive_secs)),
                ("hud-weapon", stats.current_weapon.as_str().to_string()),
            ];
            for (id, text) in fields {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(&text));
                }
            }
        }

        fn set_knob(&self, offset: Vec2) {
            let knob = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("joystick-knob"))
                .and_then(|el| el.dyn_into::<HtmlElement>().ok());
            if let Some(knob) = knob {
                let _ = knob.style().set_property(
                    "transform",
                    &format!("translate({}px, {}px)", offset.x, offset.y),
                );
            }
        }

        /// Stop the loop and every timer. Safe to call repeatedly.
        fn shutdown(&mut self) {
            if let (Some(handle), Some(window)) = (self.raf.take(), web_sys::window()) {
                let _ = window.cancel_animation_frame(handle);
            }
            self.game.teardown();
        }
    }

    fn circle(ctx: &CanvasRenderingContext2d, pos: Vec2, r: f64) -> Result<(), JsValue> {
        ctx.begin_path();
        ctx.arc(pos.x as f64, pos.y as f64, r, 0.0, TAU)
    }

    fn navigate(url: &str) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_href(url) {
                log::warn!("Navigation to {} failed: {:?}", url, e);
            }
        }
    }

    /// Balance overrides from an optional `<script id="tuning">` JSON block
    fn load_tuning(document: &web_sys::Document) -> Tuning {
        let Some(json) = document.get_element_by_id("tuning").and_then(|el| el.text_content()) else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring tuning overrides: {}", e);
                Tuning::default()
            }
        }
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Logger init failed: {}", e).into());
        }

        log::info!("Pew Pew Heroes starting...");

        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;

        let store = WebStore;
        let avatar_src = match store.avatar() {
            Ok(src) => src,
            Err(SessionError::MissingAvatar) => {
                log::info!("No avatar configured, redirecting to setup");
                navigate(SETUP_URL);
                return Ok(());
            }
            Err(e) => return Err(JsValue::from_str(&e.to_string())),
        };
        let avatar = HtmlImageElement::new()?;
        avatar.set_src(&avatar_src);

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or("no canvas")?
            .dyn_into()?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or("no 2d context")?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let tuning = load_tuning(&document);
        let game = Game::new(seed, tuning, Viewport::new(800.0, 600.0), store);
        let app = Rc::new(RefCell::new(App {
            game,
            joystick: Joystick::default(),
            canvas,
            ctx,
            avatar,
            raf: None,
        }));
        log::info!("Game initialized with seed: {}", seed);

        {
            let mut a = app.borrow_mut();
            a.resize();
            a.game.start(js_sys::Date::now());
        }

        setup_resize(app.clone())?;
        setup_joystick(app.clone())?;
        setup_teardown(app.clone())?;

        request_animation_frame(app);
        log::info!("Pew Pew Heroes running!");
        Ok(())
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let next = app.clone();
        let closure = Closure::once(move |_time: f64| {
            game_loop(next);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => app.borrow_mut().raf = Some(handle),
            Err(e) => log::warn!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>) {
        let over = {
            let mut a = app.borrow_mut();
            a.raf = None;
            if a.game.phase() != GamePhase::Running {
                return;
            }
            // Timers run on wall-clock time like the rest of the page
            let now = js_sys::Date::now();
            a.game.frame(now);
            if let Err(e) = a.render(now) {
                log::warn!("Render failed: {:?}", e);
            }
            a.update_hud();
            a.handle_events()
        };

        if over {
            app.borrow_mut().shutdown();
            navigate(RESULT_URL);
        } else {
            request_animation_frame(app);
        }
    }

    fn setup_resize(app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().resize();
        });
        window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_joystick(app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let document = window.document().ok_or("no document")?;
        let Some(base) = document.get_element_by_id("joystick") else {
            log::warn!("No joystick element; player cannot move");
            return Ok(());
        };

        // Press on the stick
        {
            let app = app.clone();
            let base_el = base.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let rect = base_el.get_bounding_client_rect();
                let center = Vec2::new(
                    (rect.left() + rect.width() / 2.0) as f32,
                    (rect.top() + rect.height() / 2.0) as f32,
                );
                let pointer = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let mut a = app.borrow_mut();
                a.joystick.press(center);
                if let Some(dir) = a.joystick.drag_to(pointer) {
                    a.game.set_input(dir);
                    let knob = a.joystick.knob();
                    a.set_knob(knob);
                }
            });
            base.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Drag anywhere on the page
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let pointer = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                let mut a = app.borrow_mut();
                if let Some(dir) = a.joystick.drag_to(pointer) {
                    a.game.set_input(dir);
                    let knob = a.joystick.knob();
                    a.set_knob(knob);
                }
            });
            window.add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Release
        for name in ["pointerup", "pointercancel"] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                let mut a = app.borrow_mut();
                if !a.joystick.is_dragging() {
                    return;
                }
                let dir = a.joystick.release();
                a.game.set_input(dir);
                a.set_knob(Vec2::ZERO);
            });
            window.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Leaving the page cancels the loop and all game timers
    fn setup_teardown(app: Rc<RefCell<App>>) -> Result<(), JsValue> {
        let window = web_sys::window().ok_or("no window")?;
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().shutdown();
            log::info!("Page hidden, session closed");
        });
        window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Pew Pew Heroes (native) starting...");
    log::info!("Native mode runs a headless autopilot; serve the wasm build for the real game");
    headless::run(std::env::args().nth(1).and_then(|s| s.parse().ok()).unwrap_or(42));
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Drives a session without a browser: circles the arena until caught
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use pew_pew_heroes::sim::{Game, GameEvent, GamePhase, Viewport};
    use pew_pew_heroes::{JoystickDirection, MemoryStore, SessionStore, Tuning};

    /// Simulated frame spacing (~60 Hz display)
    const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Give up after ten simulated minutes
    const MAX_MS: f64 = 600_000.0;

    pub fn run(seed: u64) {
        let mut game = Game::new(seed, Tuning::default(), Viewport::new(1280.0, 720.0), MemoryStore::new());
        game.start(0.0);

        let mut now = 0.0;
        let mut kills = 0;
        while game.phase() == GamePhase::Running && now < MAX_MS {
            let heading = (now / 2000.0) as f32;
            let offset = Vec2::from_angle(heading) * 50.0;
            game.set_input(JoystickDirection::from_offset(offset, 50.0));
            game.frame(now);
            for event in game.drain_events() {
                match event {
                    GameEvent::EnemyKilled { .. } => kills += 1,
                    GameEvent::WeaponPickedUp { kind } => log::info!("t={:.1}s picked up {}", now / 1000.0, kind.as_str()),
                    _ => {}
                }
            }
            now += FRAME_MS;
        }

        game.teardown();
        match game.store().load_results() {
            Ok(Some(results)) => log::info!(
                "Final: score {} ({}), {} kills, {}s alive",
                results.score,
                results.rating().as_str(),
                results.enemies_killed,
                results.time_alive_seconds
            ),
            Ok(None) => log::info!("Survived {:.0}s without being caught ({} kills)", now / 1000.0, kills),
            Err(e) => log::warn!("Could not read results: {}", e),
        }
    }
}
