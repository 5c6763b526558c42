//! Neon Drift entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent};

    use neon_drift::audio::AudioManager;
    use neon_drift::consts::SIM_DT;
    use neon_drift::presentation::Hud;
    use neon_drift::renderer::InstanceBuffer;
    use neon_drift::sim::{Intent, SessionSummary};
    use neon_drift::{Game, GameError, Settings};

    /// HUD backed by DOM elements
    struct DomHud {
        document: Document,
    }

    impl DomHud {
        fn set_text(&self, selector: &str, text: &str) {
            if let Some(el) = self.document.query_selector(selector).ok().flatten() {
                el.set_text_content(Some(text));
            }
        }

        fn set_visible(&self, id: &str, visible: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
            }
        }
    }

    impl Hud for DomHud {
        fn set_speed(&mut self, speed: u32) {
            self.set_text("#hud-speed .hud-value", &speed.to_string());
        }

        fn set_score(&mut self, score: u64) {
            self.set_text("#hud-score .hud-value", &score.to_string());
        }

        fn set_boost(&mut self, percent: f32) {
            if let Some(el) = self.document.get_element_by_id("hud-boost-bar") {
                let _ = el.set_attribute("style", &format!("width: {percent:.0}%"));
            }
        }

        fn flash(&mut self) {
            if let Some(el) = self.document.get_element_by_id("flash") {
                // Re-adding the class restarts the CSS animation
                let _ = el.set_attribute("class", "");
                let _ = el.set_attribute("class", "flash");
            }
        }

        fn show_prompt(&mut self, visible: bool) {
            self.set_visible("start-prompt", visible);
        }

        fn show_game_over(&mut self, summary: &SessionSummary) {
            self.set_text("#final-score", &summary.score.to_string());
            self.set_text("#final-distance", &format!("{:.0}", summary.distance));
            self.set_visible("game-over", true);
        }
    }

    /// Game plus host loop bookkeeping
    struct WebGame {
        game: Game,
        last_time: f64,
        /// Pending animation frame, cancelled on restart
        raf: Option<i32>,
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("logger init failed: {e}").into());
        }

        log::info!("Neon Drift starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document; cannot start");
            return;
        };

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let game = match boot(document, seed) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Boot failed: {e}");
                return;
            }
        };
        log::info!("Game initialized with seed: {}", seed);

        let web = Rc::new(RefCell::new(WebGame {
            game,
            last_time: 0.0,
            raf: None,
        }));

        setup_input_handlers(web.clone());

        // Idle loop: renders the attract screen until the first start
        let generation = web.borrow().game.generation();
        request_animation_frame(web, generation);

        log::info!("Neon Drift running!");
    }

    fn boot(document: Document, seed: u64) -> Result<Game, GameError> {
        let settings = Settings::default();
        let mut audio = AudioManager::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);

        let mut renderer = InstanceBuffer::new(settings.clone());
        if let Some(window) = web_sys::window() {
            let size = |v: Result<JsValue, JsValue>| {
                v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0) as u32
            };
            renderer.resize(size(window.inner_width()), size(window.inner_height()));
        }

        Game::builder()
            .seed(seed)
            .settings(settings)
            .renderer(renderer)
            .hud(DomHud { document })
            .sound(audio)
            .build()
    }

    fn key_to_intent(key: &str, down: bool) -> Option<Intent> {
        match (key, down) {
            ("ArrowLeft" | "a" | "A", true) => Some(Intent::LaneLeft),
            ("ArrowRight" | "d" | "D", true) => Some(Intent::LaneRight),
            ("ArrowUp" | "w" | "W", true) => Some(Intent::SpeedUp),
            ("ArrowDown" | "s" | "S", true) => Some(Intent::SpeedDown),
            (" " | "Shift", true) => Some(Intent::BoostDown),
            (" " | "Shift", false) => Some(Intent::BoostUp),
            _ => None,
        }
    }

    fn setup_input_handlers(web: Rc<RefCell<WebGame>>) {
        let Some(window) = web_sys::window() else { return };

        // Key down
        {
            let web = web.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let key = event.key();
                match key.as_str() {
                    "Enter" | "r" | "R" => {
                        start_session(&web);
                        return;
                    }
                    "p" | "P" => {
                        let mut w = web.borrow_mut();
                        let enabled = !w.game.autopilot();
                        w.game.set_autopilot(enabled);
                        return;
                    }
                    _ => {}
                }
                if event.repeat() {
                    return;
                }
                if let Some(intent) = key_to_intent(&key, true) {
                    event.prevent_default();
                    web.borrow_mut().game.push_intent(intent);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if let Some(intent) = key_to_intent(&event.key(), false) {
                    web.borrow_mut().game.push_intent(intent);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Cancel the scheduled frame, start a new session and a fresh loop
    fn start_session(web: &Rc<RefCell<WebGame>>) {
        let generation = {
            let mut w = web.borrow_mut();
            if let Some(id) = w.raf.take() {
                if let Some(window) = web_sys::window() {
                    let _ = window.cancel_animation_frame(id);
                }
            }
            w.last_time = 0.0;
            w.game.start_session()
        };
        if let Some(document) = web_sys::window().and_then(|w| w.document()) {
            if let Some(el) = document.get_element_by_id("game-over") {
                let _ = el.set_attribute("class", "hidden");
            }
        }
        request_animation_frame(web.clone(), generation);
    }

    fn request_animation_frame(web: Rc<RefCell<WebGame>>, generation: u64) {
        let Some(window) = web_sys::window() else { return };
        let loop_web = web.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(loop_web, generation, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(id) => web.borrow_mut().raf = Some(id),
            Err(e) => log::warn!("requestAnimationFrame failed: {e:?}"),
        }
        closure.forget();
    }

    fn game_loop(web: Rc<RefCell<WebGame>>, generation: u64, time: f64) {
        {
            let mut w = web.borrow_mut();
            w.raf = None;
            // A restart superseded this loop
            if !w.game.is_current(generation) {
                return;
            }

            let dt = if w.last_time > 0.0 {
                ((time - w.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            w.last_time = time;
            w.game.frame(dt);

            // Run over: stop once the crash has finished playing out
            if !w.game.wants_frame() {
                log::info!("Game over; loop {generation} stopped");
                return;
            }
        }

        request_animation_frame(web, generation);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use neon_drift::audio::AudioManager;
    use neon_drift::consts::SIM_DT;
    use neon_drift::presentation::Hud;
    use neon_drift::renderer::InstanceBuffer;
    use neon_drift::sim::{GamePhase, SessionSummary};
    use neon_drift::settings::QualityPreset;
    use neon_drift::{Game, Settings, Tuning};

    /// Environment variable naming a tuning override JSON file
    const TUNING_ENV: &str = "NEON_DRIFT_TUNING";
    /// Environment variable selecting the quality preset (low, medium, high)
    const QUALITY_ENV: &str = "NEON_DRIFT_QUALITY";
    /// Give up after ten simulated minutes
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    /// HUD that only logs the interesting moments
    #[derive(Default)]
    struct LogHud;

    impl Hud for LogHud {
        fn set_speed(&mut self, _speed: u32) {}
        fn set_score(&mut self, _score: u64) {}
        fn set_boost(&mut self, _percent: f32) {}
        fn flash(&mut self) {
            log::debug!("near miss!");
        }
        fn show_prompt(&mut self, _visible: bool) {}
        fn show_game_over(&mut self, summary: &SessionSummary) {
            log::info!("Game over: {}", summary.score);
        }
    }

    fn load_tuning() -> Result<Tuning, Box<dyn std::error::Error>> {
        match std::env::var(TUNING_ENV) {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)?;
                log::info!("Tuning override from {path}");
                Ok(Tuning::from_json(&json)?)
            }
            Err(_) => Ok(Tuning::default()),
        }
    }

    fn load_settings() -> Settings {
        let Ok(name) = std::env::var(QUALITY_ENV) else {
            return Settings::default();
        };
        match QualityPreset::from_name(&name) {
            Some(preset) => {
                log::info!("Quality preset: {}", preset.as_str());
                Settings::from_preset(preset)
            }
            None => {
                log::warn!("Unknown quality preset {name:?}; using defaults");
                Settings::default()
            }
        }
    }

    pub fn run() -> Result<(), Box<dyn std::error::Error>> {
        let seed = match std::env::args().nth(1) {
            Some(arg) => arg.parse()?,
            None => 42,
        };
        let tuning = load_tuning()?;
        let settings = load_settings();

        let mut game = Game::builder()
            .seed(seed)
            .tuning(tuning)
            .settings(settings.clone())
            .renderer(InstanceBuffer::new(settings))
            .hud(LogHud)
            .sound(AudioManager::new())
            .build()?;

        game.set_autopilot(true);
        game.start_session();

        let mut frames = 0;
        while game.phase() == GamePhase::Running && frames < MAX_FRAMES {
            game.frame(SIM_DT);
            frames += 1;
        }

        match game.last_summary() {
            Some(summary) => println!(
                "Crashed after {:.1}s: score {}, distance {:.0}, near-misses {}",
                summary.duration_secs, summary.score, summary.distance, summary.near_misses
            ),
            None => {
                let snap = game.snapshot();
                println!(
                    "Still driving after {frames} frames: score {}, distance {:.0}",
                    snap.score, snap.distance
                );
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Drift (native, headless autopilot) starting...");

    if let Err(e) = headless::run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
