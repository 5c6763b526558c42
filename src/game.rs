//! Host-owned game loop
//!
//! [`Game`] owns a [`Session`] plus the presentation collaborators. The host
//! calls [`Game::frame`] once per display frame with the wall-clock delta;
//! the session advances in fixed substeps and frame events fan out to the
//! HUD, sound and renderer.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::error::GameError;
use crate::presentation::{Hud, NullSound, Renderer, SoundKind, SoundSink};
use crate::renderer::Camera;
use crate::settings::Settings;
use crate::sim::{GameEvent, GamePhase, HudSnapshot, Intent, Session, SessionSummary, TickInput, tick};
use crate::tuning::Tuning;

/// Collects collaborators and configuration before boot
pub struct GameBuilder {
    tuning: Tuning,
    settings: Settings,
    seed: u64,
    renderer: Option<Box<dyn Renderer>>,
    hud: Option<Box<dyn Hud>>,
    sound: Option<Box<dyn SoundSink>>,
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBuilder {
    pub fn new() -> Self {
        Self {
            tuning: Tuning::default(),
            settings: Settings::default(),
            seed: 0,
            renderer: None,
            hud: None,
            sound: None,
        }
    }

    pub fn tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Seed for the stream session seeds are drawn from
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn hud(mut self, hud: impl Hud + 'static) -> Self {
        self.hud = Some(Box::new(hud));
        self
    }

    pub fn sound(mut self, sound: impl SoundSink + 'static) -> Self {
        self.sound = Some(Box::new(sound));
        self
    }

    /// Renderer and HUD are required; a missing sound sink only costs audio
    pub fn build(self) -> Result<Game, GameError> {
        self.tuning.validate()?;
        let renderer = self
            .renderer
            .ok_or(GameError::MissingPresentation { hook: "renderer" })?;
        let hud = self
            .hud
            .ok_or(GameError::MissingPresentation { hook: "hud" })?;
        let sound = self.sound.unwrap_or_else(|| {
            log::warn!("No sound sink supplied; running silent");
            Box::new(NullSound)
        });

        let mut seeds = Pcg32::seed_from_u64(self.seed);
        let session = Session::new(self.tuning, seeds.random());

        Ok(Game {
            session,
            settings: self.settings,
            renderer,
            hud,
            sound,
            seeds,
            accumulator: 0.0,
            pending: Vec::new(),
            autopilot: false,
            boost_loop: false,
            drift_loop: false,
            generation: 0,
            time: 0.0,
            last_summary: None,
        })
    }
}

pub struct Game {
    session: Session,
    settings: Settings,
    renderer: Box<dyn Renderer>,
    hud: Box<dyn Hud>,
    sound: Box<dyn SoundSink>,
    /// Source of per-session seeds
    seeds: Pcg32,
    accumulator: f32,
    /// Intents queued since the last substep
    pending: Vec<Intent>,
    autopilot: bool,
    // Looping-sound state, flipped only on transitions
    boost_loop: bool,
    drift_loop: bool,
    /// Bumped on every start; a host loop from an older generation must stop
    generation: u64,
    time: f32,
    last_summary: Option<SessionSummary>,
}

impl Game {
    pub fn builder() -> GameBuilder {
        GameBuilder::new()
    }

    /// Start (or restart) a session with the next seed from the stream.
    /// Returns the new loop generation.
    pub fn start_session(&mut self) -> u64 {
        let seed = self.seeds.random();
        self.start_session_with_seed(seed)
    }

    pub fn start_session_with_seed(&mut self, seed: u64) -> u64 {
        self.generation += 1;
        self.sound.prime();
        self.release_loops();
        self.session.restart(seed);
        self.accumulator = 0.0;
        self.pending.clear();
        self.last_summary = None;
        self.hud.show_prompt(false);
        log::info!("Loop generation {} running", self.generation);
        self.generation
    }

    /// A host loop scheduled under `generation` keeps running only while this holds
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queue an intent for the next simulation substep
    pub fn push_intent(&mut self, intent: Intent) {
        if self.session.is_running() {
            self.pending.push(intent);
        }
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        if enabled != self.autopilot {
            log::info!("Autopilot {}", if enabled { "on" } else { "off" });
        }
        self.autopilot = enabled;
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    /// Advance by a wall-clock delta, then present. Returns the frame's events.
    pub fn frame(&mut self, dt: f32) -> Vec<GameEvent> {
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        self.time += dt;

        let mut events = Vec::new();
        if self.session.is_running() {
            self.accumulator += dt;
            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = TickInput {
                    intents: std::mem::take(&mut self.pending),
                    autopilot: self.autopilot,
                };
                let step_events = tick(&mut self.session, &input, SIM_DT);
                self.dispatch(&step_events);
                events.extend(step_events);
                self.accumulator -= SIM_DT;
                substeps += 1;

                if !self.session.is_running() {
                    self.accumulator = 0.0;
                    break;
                }
            }
        } else {
            self.pending.clear();
            // Crash debris and shake settle on the game-over screen
            self.session.effects.update(dt);
        }

        let camera = Camera::follow(&self.session, &self.settings, self.time);
        let entities = self.session.render_entities();
        self.renderer.render(&entities, &camera, dt);
        self.update_hud();

        events
    }

    /// Whether the host should schedule another frame. Once a run has ended
    /// the loop stops as soon as the crash effects have settled.
    pub fn wants_frame(&self) -> bool {
        match self.session.phase {
            GamePhase::Idle | GamePhase::Running => true,
            GamePhase::Ended => !self.session.effects.is_settled(),
        }
    }

    pub fn snapshot(&self) -> HudSnapshot {
        self.session.snapshot()
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    /// Summary of the most recent crash, until the next start
    pub fn last_summary(&self) -> Option<SessionSummary> {
        self.last_summary
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn dispatch(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::BoostStarted => self.set_loop(SoundKind::Boost, true),
                GameEvent::BoostStopped { .. } => self.set_loop(SoundKind::Boost, false),
                GameEvent::DriftStarted => self.set_loop(SoundKind::Drift, true),
                GameEvent::DriftStopped => self.set_loop(SoundKind::Drift, false),
                GameEvent::NearMiss { .. } => {
                    self.sound.play_once(SoundKind::NearMiss);
                    if self.settings.effective_flash() {
                        self.hud.flash();
                    }
                }
                GameEvent::Crash { summary, .. } => {
                    self.release_loops();
                    self.sound.play_once(SoundKind::Crash);
                    self.hud.show_game_over(summary);
                    self.last_summary = Some(*summary);
                }
                GameEvent::LaneChanged { .. }
                | GameEvent::ClusterSpawned { .. }
                | GameEvent::PhaseThrough { .. } => {}
            }
        }
    }

    fn set_loop(&mut self, kind: SoundKind, on: bool) {
        let flag = match kind {
            SoundKind::Boost => &mut self.boost_loop,
            SoundKind::Drift => &mut self.drift_loop,
            SoundKind::Crash | SoundKind::NearMiss => return,
        };
        if *flag == on {
            return;
        }
        *flag = on;
        if on {
            self.sound.start_loop(kind);
        } else {
            self.sound.stop_loop(kind);
        }
    }

    fn release_loops(&mut self) {
        self.set_loop(SoundKind::Boost, false);
        self.set_loop(SoundKind::Drift, false);
    }

    fn update_hud(&mut self) {
        let snap = self.session.snapshot();
        self.hud.set_speed(snap.display_speed());
        self.hud.set_score(snap.score);
        self.hud.set_boost(snap.boost_percent);
        self.hud.show_prompt(snap.phase == GamePhase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{NeonColor, Obstacle, RenderEntity};
    use glam::Vec3;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Render(usize),
        Speed(u32),
        Score(u64),
        Boost,
        Flash,
        Prompt(bool),
        GameOver(u64),
        Once(SoundKind),
        Start(SoundKind),
        Stop(SoundKind),
        Prime,
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Call>>>);

    impl Recorder {
        fn count(&self, call: &Call) -> usize {
            self.0.borrow().iter().filter(|c| *c == call).count()
        }

        fn clear(&self) {
            self.0.borrow_mut().clear();
        }

        fn push(&self, call: Call) {
            self.0.borrow_mut().push(call);
        }
    }

    impl Renderer for Recorder {
        fn render(&mut self, entities: &[RenderEntity], _camera: &Camera, _dt: f32) {
            self.push(Call::Render(entities.len()));
        }
    }

    impl Hud for Recorder {
        fn set_speed(&mut self, speed: u32) {
            self.push(Call::Speed(speed));
        }
        fn set_score(&mut self, score: u64) {
            self.push(Call::Score(score));
        }
        fn set_boost(&mut self, _percent: f32) {
            self.push(Call::Boost);
        }
        fn flash(&mut self) {
            self.push(Call::Flash);
        }
        fn show_prompt(&mut self, visible: bool) {
            self.push(Call::Prompt(visible));
        }
        fn show_game_over(&mut self, summary: &SessionSummary) {
            self.push(Call::GameOver(summary.score));
        }
    }

    impl SoundSink for Recorder {
        fn prime(&mut self) {
            self.push(Call::Prime);
        }
        fn play_once(&mut self, kind: SoundKind) {
            self.push(Call::Once(kind));
        }
        fn start_loop(&mut self, kind: SoundKind) {
            self.push(Call::Start(kind));
        }
        fn stop_loop(&mut self, kind: SoundKind) {
            self.push(Call::Stop(kind));
        }
    }

    fn game(rec: &Recorder) -> Game {
        Game::builder()
            .seed(7)
            .renderer(rec.clone())
            .hud(rec.clone())
            .sound(rec.clone())
            .build()
            .unwrap()
    }

    fn park_on_vehicle(game: &mut Game) {
        let session = game.session_mut();
        let v = session.vehicle.as_ref().unwrap();
        let obstacle = Obstacle {
            id: 9999,
            lane: v.lane,
            pos: Vec3::new(v.pos.x, 5.0, v.pos.z - 1.0),
            width: 3.0,
            depth: 4.0,
            height: 10.0,
            color: NeonColor::Cyan,
            phased: false,
        };
        session.obstacles.push(obstacle);
    }

    #[test]
    fn test_missing_renderer_is_fatal() {
        let rec = Recorder::default();
        let err = Game::builder().hud(rec).build().err().unwrap();
        assert!(matches!(err, GameError::MissingPresentation { hook: "renderer" }));
    }

    #[test]
    fn test_missing_hud_is_fatal() {
        let rec = Recorder::default();
        let err = Game::builder().renderer(rec).build().err().unwrap();
        assert!(matches!(err, GameError::MissingPresentation { hook: "hud" }));
    }

    #[test]
    fn test_missing_sound_falls_back_to_silence() {
        let rec = Recorder::default();
        let game = Game::builder().renderer(rec.clone()).hud(rec).build();
        assert!(game.is_ok());
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let rec = Recorder::default();
        let tuning = Tuning {
            lane_width: 0.0,
            ..Default::default()
        };
        let result = Game::builder()
            .tuning(tuning)
            .renderer(rec.clone())
            .hud(rec)
            .build();
        assert!(matches!(result, Err(GameError::InvalidTuning { field: "lane_width", .. })));
    }

    #[test]
    fn test_idle_frame_renders_without_ticking() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        game.push_intent(Intent::LaneLeft);
        game.frame(SIM_DT * 2.0);
        assert_eq!(game.session().frames, 0);
        assert_eq!(rec.count(&Call::Prompt(true)), 1);
        assert!(rec.0.borrow().iter().any(|c| matches!(c, Call::Render(_))));
    }

    #[test]
    fn test_frame_substeps_are_capped() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        game.start_session();
        assert_eq!(rec.count(&Call::Prime), 1);
        // Long frames clamp to MAX_FRAME_DT, i.e. about 6 substeps
        game.frame(5.0);
        let frames = game.session().frames;
        assert!((5..=6).contains(&frames));
        assert!(frames <= u64::from(MAX_SUBSTEPS));
    }

    #[test]
    fn test_boost_loop_flags_only_flip_on_transitions() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        game.start_session();

        game.push_intent(Intent::BoostDown);
        game.frame(SIM_DT * 1.5);
        game.push_intent(Intent::BoostDown);
        game.frame(SIM_DT);
        assert_eq!(rec.count(&Call::Start(SoundKind::Boost)), 1);

        game.push_intent(Intent::BoostUp);
        game.frame(SIM_DT);
        game.push_intent(Intent::BoostUp);
        game.frame(SIM_DT);
        assert_eq!(rec.count(&Call::Stop(SoundKind::Boost)), 1);
    }

    #[test]
    fn test_crash_releases_loops_and_reports() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        game.start_session();
        game.frame(SIM_DT * 1.5);
        // Lean hard so the drift loop is running at the crash
        game.session_mut().vehicle.as_mut().unwrap().pos.x = 3.0;
        game.frame(SIM_DT);
        assert_eq!(rec.count(&Call::Start(SoundKind::Drift)), 1);

        park_on_vehicle(&mut game);
        game.frame(SIM_DT);

        assert_eq!(game.phase(), GamePhase::Ended);
        let summary = game.last_summary().unwrap();
        assert_eq!(rec.count(&Call::Once(SoundKind::Crash)), 1);
        assert_eq!(rec.count(&Call::GameOver(summary.score)), 1);
        assert_eq!(rec.count(&Call::Stop(SoundKind::Drift)), 1);

        // Frozen: further frames do not tick
        let frames = game.session().frames;
        game.frame(SIM_DT * 3.0);
        assert_eq!(game.session().frames, frames);
    }

    #[test]
    fn test_crash_effects_settle_and_loop_stops() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        game.start_session();
        game.frame(SIM_DT * 1.5);
        park_on_vehicle(&mut game);
        game.frame(SIM_DT);
        assert_eq!(game.phase(), GamePhase::Ended);
        assert!(game.wants_frame());

        let debris = game.session().effects.particles[0].pos;
        game.frame(SIM_DT);
        assert_ne!(game.session().effects.particles[0].pos, debris);

        for _ in 0..600 {
            game.frame(SIM_DT);
        }
        let effects = &game.session().effects;
        assert_eq!(effects.shake, 0.0);
        assert!(effects.particles.is_empty());
        assert!(!game.wants_frame());

        // Camera is still once the shake is gone
        let a = Camera::follow(game.session(), &Settings::default(), 1.0);
        let b = Camera::follow(game.session(), &Settings::default(), 2.0);
        assert_eq!(a.eye, b.eye);

        game.start_session();
        assert!(game.wants_frame());
    }

    #[test]
    fn test_restart_bumps_generation_and_resets() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        let first = game.start_session();
        for _ in 0..30 {
            game.frame(SIM_DT);
        }
        let second = game.start_session();
        assert!(second > first);
        assert!(!game.is_current(first));
        assert!(game.is_current(second));
        assert_eq!(game.snapshot().score, 0);
        assert_eq!(game.session().frames, 0);
        assert!(game.last_summary().is_none());
    }

    #[test]
    fn test_near_miss_flashes_hud() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        game.start_session();
        let (x, z) = {
            let v = game.session().vehicle.as_ref().unwrap();
            (v.pos.x, v.pos.z)
        };
        game.session_mut().obstacles.push(Obstacle {
            id: 4242,
            lane: 1,
            pos: Vec3::new(x + 3.5, 5.0, z),
            width: 3.0,
            depth: 40.0,
            height: 10.0,
            color: NeonColor::Violet,
            phased: false,
        });
        rec.clear();
        game.frame(SIM_DT * 1.5);
        assert_eq!(rec.count(&Call::Once(SoundKind::NearMiss)), 1);
        assert_eq!(rec.count(&Call::Flash), 1);
    }

    #[test]
    fn test_hud_receives_snapshot() {
        let rec = Recorder::default();
        let mut game = game(&rec);
        game.start_session();
        rec.clear();
        game.frame(SIM_DT);
        let snap = game.snapshot();
        assert_eq!(rec.count(&Call::Score(snap.score)), 1);
        assert_eq!(rec.count(&Call::Speed(snap.display_speed())), 1);
        assert_eq!(rec.count(&Call::Prompt(false)), 1);
    }
}
