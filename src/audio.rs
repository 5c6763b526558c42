//! Audio system
//!
//! Procedurally generated sound effects via the Web Audio API on wasm32, no
//! external files needed. Native builds get the same bookkeeping with no output.

use std::collections::HashSet;

use crate::error::GameError;
use crate::presentation::{SoundKind, SoundSink};

#[cfg(target_arch = "wasm32")]
use std::collections::HashMap;
#[cfg(target_arch = "wasm32")]
use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Audio manager for the game
pub struct AudioManager {
    #[cfg(target_arch = "wasm32")]
    ctx: Option<AudioContext>,
    /// Running loop voices, stopped on `stop_loop`
    #[cfg(target_arch = "wasm32")]
    voices: HashMap<SoundKind, (OscillatorNode, GainNode)>,
    active_loops: HashSet<SoundKind>,
    master_volume: f32,
    sfx_volume: f32,
    one_shots: u64,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioManager {
    /// Open the audio output, falling back to silence when it is unavailable
    pub fn new() -> Self {
        Self::try_new().unwrap_or_else(|err| {
            log::warn!("{err} - audio disabled");
            Self::silent()
        })
    }

    /// Manager with no output device
    pub fn silent() -> Self {
        Self {
            #[cfg(target_arch = "wasm32")]
            ctx: None,
            #[cfg(target_arch = "wasm32")]
            voices: HashMap::new(),
            active_loops: HashSet::new(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            one_shots: 0,
        }
    }

    /// Open the Web Audio context (may fail outside a secure context)
    #[cfg(target_arch = "wasm32")]
    pub fn try_new() -> Result<Self, GameError> {
        let ctx = AudioContext::new()
            .map_err(|e| GameError::AudioUnavailable(format!("{e:?}")))?;
        Ok(Self {
            ctx: Some(ctx),
            ..Self::silent()
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn try_new() -> Result<Self, GameError> {
        log::info!("Native build: sound output is silent");
        Ok(Self::silent())
    }

    /// Resume audio context (required after user gesture)
    #[cfg(target_arch = "wasm32")]
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn resume(&self) {}

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    fn effective_volume(&self) -> f32 {
        self.master_volume * self.sfx_volume
    }

    pub fn is_looping(&self, kind: SoundKind) -> bool {
        self.active_loops.contains(&kind)
    }

    pub fn active_loop_count(&self) -> usize {
        self.active_loops.len()
    }

    /// One-shots requested so far (played or not)
    pub fn one_shots(&self) -> u64 {
        self.one_shots
    }
}

impl SoundSink for AudioManager {
    fn prime(&mut self) {
        self.resume();
    }

    fn play_once(&mut self, kind: SoundKind) {
        self.one_shots += 1;
        self.play_web(kind);
    }

    fn start_loop(&mut self, kind: SoundKind) {
        if !self.active_loops.insert(kind) {
            return;
        }
        self.start_web_loop(kind);
    }

    fn stop_loop(&mut self, kind: SoundKind) {
        if !self.active_loops.remove(&kind) {
            return;
        }
        self.stop_web_loop(kind);
    }
}

// === Sound generators ===

#[cfg(target_arch = "wasm32")]
impl AudioManager {
    fn live_context(&self) -> Option<&AudioContext> {
        let ctx = self.ctx.as_ref()?;
        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        Some(ctx)
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    fn play_web(&self, kind: SoundKind) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = self.live_context() else { return };

        match kind {
            SoundKind::Crash => self.play_crash(ctx, vol),
            SoundKind::NearMiss => self.play_near_miss(ctx, vol),
            SoundKind::Boost => self.play_boost_kick(ctx, vol),
            SoundKind::Drift => self.play_drift_chirp(ctx, vol),
        }
    }

    /// Crash - noisy low smash with a falling tail
    fn play_crash(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 90.0, OscillatorType::Sawtooth) {
            gain.gain().set_value_at_time(vol * 0.5, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.6)
                .ok();
            osc.frequency().set_value_at_time(90.0, t).ok();
            osc.frequency().set_value_at_time(1400.0, t + 0.01).ok();
            osc.frequency().set_value_at_time(120.0, t + 0.03).ok();
            osc.frequency().set_value_at_time(900.0, t + 0.05).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(30.0, t + 0.6)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.7).ok();
        }

        // Sub bass punch
        if let Some((osc, gain)) = self.create_osc(ctx, 45.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.6, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.4)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.45).ok();
        }
    }

    /// Near miss - quick rising whoosh
    fn play_near_miss(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 500.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.25)
            .ok();
        osc.frequency().set_value_at_time(500.0, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(1600.0, t + 0.2)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.3).ok();
    }

    fn play_boost_kick(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 120.0, OscillatorType::Square) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.25, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.15)
            .ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(360.0, t + 0.12)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.2).ok();
    }

    fn play_drift_chirp(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 1800.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.15, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 0.1)
            .ok();
        osc.start().ok();
        osc.stop_with_when(t + 0.12).ok();
    }

    /// Sustained voice: boost is a low engine roar, drift a tyre squeal
    fn start_web_loop(&mut self, kind: SoundKind) {
        let vol = self.effective_volume();
        let Some(ctx) = self.live_context() else { return };
        let (freq, osc_type, level) = match kind {
            SoundKind::Boost => (70.0, OscillatorType::Sawtooth, 0.2),
            SoundKind::Drift => (2200.0, OscillatorType::Square, 0.05),
            // One-shot kinds get a short blip instead of a drone
            SoundKind::Crash | SoundKind::NearMiss => {
                self.play_web(kind);
                return;
            }
        };
        let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
            log::warn!("Failed to start {kind:?} loop");
            return;
        };
        let t = ctx.current_time();
        gain.gain().set_value_at_time(0.001, t).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(vol * level, t + 0.05)
            .ok();
        osc.start().ok();
        self.voices.insert(kind, (osc, gain));
    }

    fn stop_web_loop(&mut self, kind: SoundKind) {
        let Some((osc, gain)) = self.voices.remove(&kind) else {
            return;
        };
        let Some(ctx) = self.ctx.as_ref() else { return };
        let t = ctx.current_time();
        gain.gain().set_target_at_time(0.0, t, 0.03).ok();
        osc.stop_with_when(t + 0.15).ok();
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AudioManager {
    fn play_web(&self, kind: SoundKind) {
        log::trace!("sound: {kind:?} at {:.2} (silent)", self.effective_volume());
    }

    fn start_web_loop(&mut self, _kind: SoundKind) {}

    fn stop_web_loop(&mut self, _kind: SoundKind) {}
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_loops_are_idempotent() {
        let mut audio = AudioManager::new();
        audio.start_loop(SoundKind::Boost);
        audio.start_loop(SoundKind::Boost);
        assert_eq!(audio.active_loop_count(), 1);
        audio.stop_loop(SoundKind::Boost);
        audio.stop_loop(SoundKind::Boost);
        assert!(!audio.is_looping(SoundKind::Boost));
    }

    #[test]
    fn test_loops_tracked_per_kind() {
        let mut audio = AudioManager::silent();
        audio.start_loop(SoundKind::Boost);
        audio.start_loop(SoundKind::Drift);
        audio.stop_loop(SoundKind::Boost);
        assert!(audio.is_looping(SoundKind::Drift));
        assert_eq!(audio.active_loop_count(), 1);
    }

    #[test]
    fn test_one_shots_counted_and_volume_clamped() {
        let mut audio = AudioManager::silent();
        audio.set_master_volume(3.0);
        audio.set_sfx_volume(-1.0);
        assert_eq!(audio.effective_volume(), 0.0);
        audio.play_once(SoundKind::Crash);
        audio.play_once(SoundKind::NearMiss);
        assert_eq!(audio.one_shots(), 2);
    }
}
