//! Realm Defense entry point
//!
//! On the web the simulation is driven by `requestAnimationFrame` and drawn by
//! the page's `drawFrame` script. Natively it runs a headless auto-play demo.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, MouseEvent};

    use realm_defense::assets::AssetCatalog;
    use realm_defense::sim::{GameState, TowerKind};
    use realm_defense::{FrameOutcome, Hud, Renderer, SimulationController, Snapshot, Tuning};

    // The page owns every canvas draw call; Rust hands it a JSON snapshot
    #[wasm_bindgen(inline_js = "
        export function draw_frame(json) {
            if (typeof window.drawFrame === 'function') {
                window.drawFrame(JSON.parse(json));
            }
        }

        export function show_message(text) {
            if (typeof window.showMessage === 'function') {
                window.showMessage(text);
            } else {
                console.log(text);
            }
        }
    ")]
    extern "C" {
        fn draw_frame(json: &str);
        fn show_message(text: &str);
    }

    struct JsRenderer;

    impl Renderer for JsRenderer {
        fn render(&mut self, state: &GameState, hud: &Hud) {
            match Snapshot::new(state, hud).to_json() {
                Ok(json) => draw_frame(&json),
                Err(e) => log::error!("Snapshot failed: {e}"),
            }
        }
    }

    struct Game {
        controller: SimulationController,
        /// Whether an animation frame is currently scheduled
        looping: bool,
    }

    type SharedGame = Rc<RefCell<Game>>;

    thread_local! {
        static GAME: RefCell<Option<SharedGame>> = const { RefCell::new(None) };
    }

    fn with_game<T>(f: impl FnOnce(&mut Game) -> T) -> Option<T> {
        GAME.with(|slot| slot.borrow().as_ref().map(|g| f(&mut g.borrow_mut())))
    }

    /// Surface a rejected command; must be called with no game borrow held
    fn report<T>(result: Result<T, realm_defense::CommandError>) {
        if let Err(e) = result {
            show_message(&e.to_string());
        }
    }

    /// Run a player command and report its rejection once the game is released
    fn command<T>(
        f: impl FnOnce(&mut SimulationController) -> Result<T, realm_defense::CommandError>,
    ) {
        if let Some(result) = with_game(|g| f(&mut g.controller)) {
            report(result);
        }
    }

    pub fn start(loaded_assets: Vec<String>) -> Result<(), JsValue> {
        if let Err(e) = AssetCatalog::from_loaded(loaded_assets) {
            show_message(&e.to_string());
            return Err(JsValue::from_str(&e.to_string()));
        }

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game {
            controller: SimulationController::new(seed, Tuning::default()),
            looping: false,
        }));
        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(game.clone());
        GAME.with(|slot| *slot.borrow_mut() = Some(game.clone()));
        ensure_loop(game);
        Ok(())
    }

    /// Restart the frame loop if it stopped on a halt
    fn ensure_loop(game: SharedGame) {
        {
            let mut g = game.borrow_mut();
            if g.looping {
                return;
            }
            g.looping = true;
        }
        request_animation_frame(game);
    }

    fn request_animation_frame(game: SharedGame) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: SharedGame) {
        let outcome = {
            let mut g = game.borrow_mut();
            let outcome = g.controller.frame(&mut JsRenderer);
            if outcome == FrameOutcome::Halt {
                g.looping = false;
                let hud = g.controller.hud();
                // One last frame so the page can show the end screen
                let mut renderer = JsRenderer;
                renderer.render(g.controller.state(), &hud);
                log::info!("Loop halted: {:?}", hud.phase);
            }
            outcome
        };

        if outcome == FrameOutcome::Continue {
            request_animation_frame(game);
        }
    }

    fn setup_input_handlers(game: SharedGame) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        if let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        {
            let game = game.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let rect = target.get_bounding_client_rect();
                let pos = Vec2::new(
                    (event.client_x() as f64 - rect.left()) as f32,
                    (event.client_y() as f64 - rect.top()) as f32,
                );
                let result = game.borrow_mut().controller.click(pos);
                report(result);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard shortcuts
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let selection = {
                    let mut g = game.borrow_mut();
                    match event.key().as_str() {
                        " " | "p" | "P" => {
                            g.controller.toggle_pause();
                            None
                        }
                        "f" | "F" => {
                            g.controller.cycle_speed();
                            None
                        }
                        key => {
                            let kind = match key {
                                "1" => Some(TowerKind::Archer),
                                "2" => Some(TowerKind::Cannon),
                                "3" => Some(TowerKind::Ice),
                                "4" => Some(TowerKind::Tesla),
                                _ => None,
                            };
                            kind.map(|kind| g.controller.select_tower_kind(kind))
                        }
                    }
                };
                if let Some(result) = selection {
                    report(result);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    pub fn select_tower(name: &str) {
        match TowerKind::from_name(name) {
            Some(kind) => {
                command(|c| c.select_tower_kind(kind));
            }
            None => log::warn!("Unknown tower kind: {name}"),
        }
    }

    pub fn toggle_pause() {
        with_game(|g| g.controller.toggle_pause());
    }

    pub fn cycle_speed() -> u32 {
        with_game(|g| g.controller.cycle_speed().ticks_per_frame()).unwrap_or(1)
    }

    pub fn buy_slot() {
        command(|c| c.buy_tower_slot());
    }

    pub fn upgrade() {
        command(|c| c.upgrade_selected());
    }

    pub fn sell() {
        command(|c| c.sell_selected());
    }

    pub fn next_level() {
        let Some(game) = GAME.with(|slot| slot.borrow().clone()) else {
            return;
        };
        let result = game.borrow_mut().controller.next_level();
        match result {
            Ok(()) => ensure_loop(game),
            Err(e) => show_message(&e.to_string()),
        }
    }

    pub fn restart() {
        let Some(game) = GAME.with(|slot| slot.borrow().clone()) else {
            return;
        };
        let seed = js_sys::Date::now() as u64;
        game.borrow_mut().controller.restart(seed);
        ensure_loop(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&JsValue::from_str(&e.to_string()));
    }
    log::info!("Realm Defense loaded, waiting for assets...");
}

/// Called by the page once its image promises have settled
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_game(loaded_assets: Vec<String>) -> Result<(), JsValue> {
    wasm_game::start(loaded_assets)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn select_tower(name: &str) {
    wasm_game::select_tower(name);
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn toggle_pause() {
    wasm_game::toggle_pause();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn cycle_speed() -> u32 {
    wasm_game::cycle_speed()
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn buy_slot() {
    wasm_game::buy_slot();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn upgrade() {
    wasm_game::upgrade();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn sell() {
    wasm_game::sell();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn next_level() {
    wasm_game::next_level();
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn restart() {
    wasm_game::restart();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;

    use realm_defense::assets::AssetCatalog;
    use realm_defense::sim::geometry::{path_length, point_along};
    use realm_defense::sim::{GamePhase, GameState, TowerKind};
    use realm_defense::{FrameOutcome, GameSpeed, Hud, Renderer, SimulationController, Tuning};

    /// Frames between two HUD log lines
    const REPORT_EVERY: u64 = 600;
    /// Frames between two autopilot decisions
    const THINK_EVERY: u64 = 20;
    const MAX_FRAMES: u64 = 400_000;
    /// Distance kept from the road centre line when picking build spots
    const BUILD_OFFSET: f32 = 45.0;

    /// Logs the HUD now and then instead of drawing
    struct HeadlessRenderer {
        assets: AssetCatalog,
        frames: u64,
        fallback_draws: u64,
    }

    impl Renderer for HeadlessRenderer {
        fn render(&mut self, state: &GameState, hud: &Hud) {
            self.frames += 1;
            self.fallback_draws += state
                .towers
                .iter()
                .filter(|t| !self.assets.has_sprite(&state.tower_stats(t.kind).turret_sprite))
                .count() as u64;

            if self.frames % REPORT_EVERY == 0 {
                log::info!(
                    "L{} W{}/{} gold {} lives {} towers {}/{} enemies {}",
                    hud.level,
                    hud.wave,
                    hud.max_waves,
                    hud.gold,
                    hud.lives,
                    hud.towers,
                    hud.max_towers,
                    state.enemies_remaining()
                );
            }
        }
    }

    /// Candidate build spots beside the road, from the spawn end onward
    fn build_spots(state: &GameState) -> Vec<Vec2> {
        let path = &state.map.path;
        let total = path_length(path);
        let offsets = [
            Vec2::new(0.0, BUILD_OFFSET),
            Vec2::new(0.0, -BUILD_OFFSET),
            Vec2::new(BUILD_OFFSET, 0.0),
            Vec2::new(-BUILD_OFFSET, 0.0),
        ];

        let mut spots = Vec::new();
        let mut distance = 80.0;
        while distance < total {
            if let Some(p) = point_along(path, distance) {
                spots.extend(offsets.iter().map(|o| p + *o));
            }
            distance += 70.0;
        }
        spots.retain(|s| s.x > 0.0 && s.y > 0.0 && s.x < state.map.width && s.y < state.map.height);
        spots
    }

    /// Spend gold the simple way: fill slots, buy slots, then upgrade
    fn think(controller: &mut SimulationController) {
        let state = controller.state();
        if state.phase != GamePhase::Running {
            return;
        }
        let gold = state.gold_display();

        if state.towers.len() < state.max_towers {
            let kind = [TowerKind::Tesla, TowerKind::Cannon, TowerKind::Ice, TowerKind::Archer]
                .into_iter()
                .find(|k| state.is_unlocked(*k) && state.tower_stats(*k).cost <= gold);
            let Some(kind) = kind else {
                return;
            };
            let spot = build_spots(state)
                .into_iter()
                .find(|s| state.check_placement(kind, *s).is_ok());
            if let Some(spot) = spot {
                let built = controller
                    .select_tower_kind(kind)
                    .and_then(|()| controller.click(spot));
                if let Err(e) = built {
                    log::debug!("Bot could not build {kind:?} at {spot}: {e}");
                }
            }
            return;
        }

        if gold >= state.tower_slot_cost + 200 {
            if let Err(e) = controller.buy_tower_slot() {
                log::debug!("Bot could not buy a slot: {e}");
            }
            return;
        }

        let cheapest = state
            .towers
            .iter()
            .map(|t| (t.pos, state.upgrade_cost(t)))
            .min_by_key(|(_, cost)| *cost)
            .filter(|(_, cost)| *cost <= gold)
            .map(|(pos, _)| pos);
        if let Some(pos) = cheapest {
            let upgraded = controller.click(pos).and_then(|_| controller.upgrade_selected());
            if let Err(e) = upgraded {
                log::debug!("Bot could not upgrade the tower at {pos}: {e}");
            }
        }
    }

    pub fn run(seed: u64, levels: u32) {
        let mut controller = SimulationController::new(seed, Tuning::default());
        while controller.speed() != GameSpeed::Quad {
            controller.cycle_speed();
        }
        let mut renderer = HeadlessRenderer {
            assets: AssetCatalog::complete(),
            frames: 0,
            fallback_draws: 0,
        };

        while renderer.frames < MAX_FRAMES {
            if renderer.frames % THINK_EVERY == 0 {
                think(&mut controller);
            }
            if controller.frame(&mut renderer) == FrameOutcome::Continue {
                continue;
            }

            let state = controller.state();
            if state.phase == GamePhase::LevelComplete && state.level < levels {
                log::info!("Level {} cleared, moving on", state.level);
                if controller.next_level().is_err() {
                    break;
                }
            } else {
                break;
            }
        }

        let hud = controller.hud();
        println!("seed {seed}: {:?} at level {} wave {}", hud.phase, hud.level, hud.wave);
        println!(
            "  gold {}  lives {}  towers {}/{}  ticks {}",
            hud.gold,
            hud.lives,
            hud.towers,
            hud.max_towers,
            controller.state().time_ticks
        );
        println!(
            "  {} frames rendered, {} tower draws without sprites",
            renderer.frames, renderer.fallback_draws
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    log::info!("Realm Defense (headless) starting with seed {seed}");
    headless::run(seed, 3);
}
