//! Keyframed scalar curves: binary search + interpolation

use serde::{Deserialize, Serialize};

/// How to interpolate between keyframes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Linear interpolation
    #[default]
    Linear,
    /// Hold the left keyframe's value until the next keyframe (discrete)
    Step,
}

/// A keyframe: a value at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Normalized fraction of the owning duration, or seconds for indefinite emitters
    pub time: f32,
    pub value: f32,
}

impl Keyframe {
    pub const fn new(time: f32, value: f32) -> Self {
        Self { time, value }
    }
}

/// A piecewise time-to-value mapping
///
/// Keyframes are kept sorted by time. Sampling before the first or after the
/// last keyframe clamps to the boundary value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Curve {
    keyframes: Vec<Keyframe>,
    interpolation: Interpolation,
}

impl Curve {
    pub fn new(mut keyframes: Vec<Keyframe>, interpolation: Interpolation) -> Self {
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self {
            keyframes,
            interpolation,
        }
    }

    /// A curve holding `value` for all time
    pub fn constant(value: f32) -> Self {
        Self::new(vec![Keyframe::new(0.0, value)], Interpolation::Linear)
    }

    /// A two-point linear ramp from `from` at time 0 to `to` at time 1
    pub fn ramp(from: f32, to: f32) -> Self {
        Self::new(
            vec![Keyframe::new(0.0, from), Keyframe::new(1.0, to)],
            Interpolation::Linear,
        )
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Sample the curve at `time` using its own interpolation mode
    pub fn sample(&self, time: f32) -> f32 {
        evaluate(&self.keyframes, time, self.interpolation)
    }

    pub fn first_time(&self) -> Option<f32> {
        self.keyframes.first().map(|kf| kf.time)
    }

    pub fn last_time(&self) -> Option<f32> {
        self.keyframes.last().map(|kf| kf.time)
    }

    /// Largest value any keyframe takes
    pub fn max_value(&self) -> Option<f32> {
        self.keyframes.iter().map(|kf| kf.value).reduce(f32::max)
    }

    /// Ensure the curve starts at time 0, inserting `value` there if it doesn't.
    pub fn with_start_value(mut self, value: f32) -> Self {
        let starts_at_zero = self.first_time().is_some_and(|t| t <= 0.0);
        if !starts_at_zero {
            self.keyframes.insert(0, Keyframe::new(0.0, value));
        }
        self
    }

    /// Multiply every keyframe time by `factor` (unit conversion at load time)
    pub fn scale_times(&mut self, factor: f32) {
        for kf in &mut self.keyframes {
            kf.time *= factor;
        }
    }
}

/// Evaluate sorted keyframes at `time`.
///
/// `time` is clamped to the first/last keyframe. An empty slice evaluates to 0.
pub fn evaluate(keyframes: &[Keyframe], time: f32, mode: Interpolation) -> f32 {
    let Some(first) = keyframes.first() else {
        return 0.0;
    };

    // Before first keyframe (or NaN): clamp to first value
    if time.is_nan() || time <= first.time {
        return first.value;
    }

    // After last keyframe: clamp to last value
    let last = &keyframes[keyframes.len() - 1];
    if time >= last.time {
        return last.value;
    }

    // Binary search for the interval containing `time`
    let idx = match keyframes.binary_search_by(|kf| kf.time.total_cmp(&time)) {
        Ok(i) => return keyframes[i].value,
        Err(i) => i, // time is between [i-1] and [i]
    };

    let prev = &keyframes[idx - 1];
    let next = &keyframes[idx];

    let span = next.time - prev.time;
    if span <= 0.0 {
        return prev.value;
    }
    let t = (time - prev.time) / span;

    match mode {
        Interpolation::Step => prev.value,
        Interpolation::Linear => lerp_f32(prev.value, next.value, t),
    }
}

/// Linear interpolation between two floats
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Curve {
        Curve::new(
            vec![
                Keyframe::new(0.0, 0.0),
                Keyframe::new(0.5, 1.0),
                Keyframe::new(1.0, 0.0),
            ],
            Interpolation::Linear,
        )
    }

    #[test]
    fn empty_curve_samples_zero() {
        assert_eq!(evaluate(&[], 0.5, Interpolation::Linear), 0.0);
        assert_eq!(Curve::default().sample(3.0), 0.0);
    }

    #[test]
    fn single_keyframe_holds_everywhere() {
        let kfs = [Keyframe::new(0.0, 0.5)];
        for t in [-1.0, 0.0, 0.3, 1.0, 42.0] {
            assert_eq!(evaluate(&kfs, t, Interpolation::Linear), 0.5);
            assert_eq!(evaluate(&kfs, t, Interpolation::Step), 0.5);
        }
    }

    #[test]
    fn triangle_linear_quarters() {
        let curve = triangle();
        assert!((curve.sample(0.25) - 0.5).abs() < 1e-6);
        assert!((curve.sample(0.75) - 0.5).abs() < 1e-6);
        assert_eq!(curve.sample(0.5), 1.0);
    }

    #[test]
    fn clamps_outside_range() {
        let curve = Curve::new(
            vec![Keyframe::new(0.2, 3.0), Keyframe::new(0.8, 7.0)],
            Interpolation::Linear,
        );
        assert_eq!(curve.sample(0.0), 3.0);
        assert_eq!(curve.sample(1.0), 7.0);
        assert_eq!(curve.sample(f32::NAN), 3.0);
    }

    #[test]
    fn step_holds_left_value() {
        let kfs = triangle();
        assert_eq!(evaluate(kfs.keyframes(), 0.49, Interpolation::Step), 0.0);
        assert_eq!(evaluate(kfs.keyframes(), 0.51, Interpolation::Step), 1.0);
    }

    #[test]
    fn new_sorts_keyframes() {
        let curve = Curve::new(
            vec![Keyframe::new(1.0, 10.0), Keyframe::new(0.0, 0.0)],
            Interpolation::Linear,
        );
        assert_eq!(curve.first_time(), Some(0.0));
        assert!((curve.sample(0.5) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn start_value_inserted_only_when_missing() {
        let late = Curve::new(vec![Keyframe::new(0.5, 0.0)], Interpolation::Linear);
        let late = late.with_start_value(8.0);
        assert_eq!(late.keyframes().len(), 2);
        assert_eq!(late.sample(0.0), 8.0);
        assert!((late.sample(0.25) - 4.0).abs() < 1e-6);

        let early = triangle().with_start_value(8.0);
        assert_eq!(early.keyframes().len(), 3);
        assert_eq!(early.sample(0.0), 0.0);
    }

    #[test]
    fn scale_times_converts_units() {
        let mut curve = Curve::new(
            vec![Keyframe::new(0.0, 1.0), Keyframe::new(50.0, 0.0)],
            Interpolation::Linear,
        );
        curve.scale_times(0.01);
        assert_eq!(curve.last_time(), Some(0.5));
        assert_eq!(curve.max_value(), Some(1.0));
    }
}
