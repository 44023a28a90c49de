//! Frame clock feeding a fixed-step accumulator

use std::time::Instant;

/// Frames longer than this are clamped so a stall can't queue up a flood of steps
const MAX_FRAME_TIME: f64 = 0.25;

/// The effect engine's native tick, 100 Hz
pub const DEFAULT_STEP: f64 = 0.01;

/// Game time plus the fixed-step accumulator that paces simulation
#[derive(Debug, Clone)]
pub struct GameClock {
    /// Scaled seconds since the clock started
    pub total_time: f64,
    /// Scaled length of the most recent frame
    pub delta_time: f64,
    /// Seconds per fixed step
    pub fixed_timestep: f64,
    /// Multiplier applied to wall time; 0 pauses the simulation
    pub time_scale: f64,
    accumulator: f64,
    last_instant: Option<Instant>,
}

impl Default for GameClock {
    fn default() -> Self {
        Self::with_step(DEFAULT_STEP)
    }
}

impl GameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock ticking at `hz` fixed steps per second
    pub fn with_fixed_timestep(hz: f64) -> Self {
        Self::with_step(1.0 / hz)
    }

    /// Clock with an explicit step length in seconds
    pub fn with_step(seconds: f64) -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            fixed_timestep: seconds,
            time_scale: 1.0,
            accumulator: 0.0,
            last_instant: None,
        }
    }

    /// Sample the wall clock. The first call only records a starting instant.
    pub fn tick(&mut self) {
        let now = Instant::now();
        match self.last_instant.replace(now) {
            Some(previous) => self.advance(now.duration_since(previous).as_secs_f64()),
            None => self.delta_time = 0.0,
        }
    }

    /// Feed `elapsed` wall seconds in directly, bypassing `Instant`
    pub fn advance(&mut self, elapsed: f64) {
        let scaled = elapsed.clamp(0.0, MAX_FRAME_TIME) * self.time_scale.max(0.0);
        self.delta_time = scaled;
        self.total_time += scaled;
        self.accumulator += scaled;
    }

    pub fn should_fixed_update(&self) -> bool {
        self.accumulator >= self.fixed_timestep
    }

    pub fn consume_fixed_step(&mut self) {
        self.accumulator -= self.fixed_timestep;
    }

    /// Fraction of a step left over, for interpolating between simulated states
    pub fn interpolation_alpha(&self) -> f64 {
        self.accumulator / self.fixed_timestep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(clock: &mut GameClock) -> u32 {
        let mut steps = 0;
        while clock.should_fixed_update() {
            clock.consume_fixed_step();
            steps += 1;
        }
        steps
    }

    #[test]
    fn defaults_to_effect_tick() {
        let clock = GameClock::new();
        assert!((clock.fixed_timestep - DEFAULT_STEP).abs() < 1e-12);
        assert_eq!(clock.total_time, 0.0);
        assert_eq!(clock.time_scale, 1.0);
    }

    #[test]
    fn hz_constructor() {
        let clock = GameClock::with_fixed_timestep(30.0);
        assert!((clock.fixed_timestep - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn first_tick_only_starts_the_clock() {
        let mut clock = GameClock::new();
        clock.tick();
        assert_eq!(clock.delta_time, 0.0);
        assert!(!clock.should_fixed_update());
    }

    #[test]
    fn advance_yields_whole_steps_and_remainder() {
        let mut clock = GameClock::with_fixed_timestep(100.0);
        clock.advance(0.025);
        assert_eq!(drain(&mut clock), 2);
        assert!((clock.interpolation_alpha() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn long_frames_are_clamped() {
        let mut clock = GameClock::new();
        clock.advance(3.0);
        assert!((clock.delta_time - MAX_FRAME_TIME).abs() < 1e-12);
        assert!((clock.total_time - MAX_FRAME_TIME).abs() < 1e-12);
    }

    #[test]
    fn time_scale_slows_and_pauses() {
        let mut clock = GameClock::with_step(0.01);
        clock.time_scale = 0.5;
        clock.advance(0.045);
        assert_eq!(drain(&mut clock), 2);

        clock.time_scale = 0.0;
        clock.advance(0.2);
        assert_eq!(clock.delta_time, 0.0);
        assert!(!clock.should_fixed_update());
    }
}
