//! The value grammar: constants, random ranges, and keyframed curves
//!
//! Every animatable effect property is authored as a short text value:
//!
//! ```text
//! 10                      constant
//! [5 15]                  random in range, drawn once per instance
//! 1 0.5,3 1,0             value 1 at time 0, then keyframes (time,value)
//! Step 0,1 0.5,0          keyframes with a discrete interpolation keyword
//! [5 15] 0.6,0            hybrid: random start value, then animate to the keys
//! ```

use crate::curve::{Curve, Interpolation, Keyframe};
use crate::rand::ParticleRng;
use kindle_core::{KindleError, Result};

/// Raw result of parsing one value text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedValue {
    pub min: f32,
    pub max: f32,
    pub keyframes: Vec<Keyframe>,
    pub interpolation: Interpolation,
}

impl ParsedValue {
    pub fn constant(value: f32) -> Self {
        Self {
            min: value,
            max: value,
            keyframes: Vec::new(),
            interpolation: Interpolation::Linear,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Range(&'a str),
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        if let Some(inner) = rest.strip_prefix('[') {
            let close = inner
                .find(']')
                .ok_or_else(|| KindleError::value_parse(text, "unterminated range"))?;
            tokens.push(Token::Range(&inner[..close]));
            rest = &inner[close + 1..];
        } else {
            let end = rest
                .find(|c: char| c.is_whitespace() || c == '[')
                .unwrap_or(rest.len());
            let word = &rest[..end];
            if word.contains(']') {
                return Err(KindleError::value_parse(text, "unmatched ']'"));
            }
            tokens.push(Token::Word(word));
            rest = &rest[end..];
        }
        rest = rest.trim_start();
    }

    Ok(tokens)
}

fn number(text: &str, word: &str) -> Result<f32> {
    let value: f32 = word
        .trim()
        .parse()
        .map_err(|_| KindleError::value_parse(text, format!("'{word}' is not a number")))?;
    if !value.is_finite() {
        return Err(KindleError::value_parse(text, format!("'{word}' is not finite")));
    }
    Ok(value)
}

fn interpolation_keyword(word: &str) -> Option<Interpolation> {
    match word.to_ascii_lowercase().as_str() {
        "linear" => Some(Interpolation::Linear),
        "step" | "discrete" | "constant" => Some(Interpolation::Step),
        _ => None,
    }
}

/// Parse one value text.
pub fn try_parse_value(text: &str) -> Result<ParsedValue> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(KindleError::value_parse(text, "empty value"));
    }

    let mut iter = tokens.into_iter().peekable();

    let mut interpolation = Interpolation::Linear;
    if let Some(Token::Word(word)) = iter.peek() {
        if let Some(mode) = interpolation_keyword(word) {
            interpolation = mode;
            iter.next();
        }
    }

    // Optional un-keyed leading value: a number (the value at time 0) or a range
    let mut leading: Option<(f32, f32)> = None;
    let mut leading_is_range = false;
    match iter.peek() {
        Some(Token::Range(inner)) => {
            let bounds: Vec<&str> = inner
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|s| !s.is_empty())
                .collect();
            let (a, b) = match bounds.as_slice() {
                [single] => {
                    let v = number(text, single)?;
                    (v, v)
                }
                [a, b] => (number(text, a)?, number(text, b)?),
                _ => return Err(KindleError::value_parse(text, "range needs one or two numbers")),
            };
            leading = Some((a.min(b), a.max(b)));
            leading_is_range = true;
            iter.next();
        }
        Some(Token::Word(word)) if !word.contains(',') => {
            let v = number(text, word)?;
            leading = Some((v, v));
            iter.next();
        }
        _ => {}
    }

    let mut keyframes = Vec::new();
    for token in iter {
        let Token::Word(word) = token else {
            return Err(KindleError::value_parse(text, "range after keyframes"));
        };
        let (time, value) = word.split_once(',').ok_or_else(|| {
            KindleError::value_parse(text, format!("expected 'time,value', got '{word}'"))
        })?;
        let time = number(text, time)?;
        if time < 0.0 {
            return Err(KindleError::value_parse(text, "keyframe time is negative"));
        }
        keyframes.push(Keyframe::new(time, number(text, value)?));
    }
    keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));

    if leading.is_none() && keyframes.is_empty() {
        return Err(KindleError::value_parse(text, "no value after interpolation keyword"));
    }

    let (min, max) = match leading {
        Some(bounds) => bounds,
        None => (keyframes[0].value, keyframes[0].value),
    };

    // A bare leading number is the value at time 0
    if !leading_is_range && !keyframes.is_empty() && keyframes[0].time > 0.0 {
        keyframes.insert(0, Keyframe::new(0.0, min));
    }

    Ok(ParsedValue {
        min,
        max,
        keyframes,
        interpolation,
    })
}

/// Parse one value text, failing closed to a constant 0 on malformed input.
pub fn parse_value(text: &str) -> ParsedValue {
    match try_parse_value(text) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!("{err}; using 0");
            ParsedValue::constant(0.0)
        }
    }
}

/// A parsed property value, before any per-instance randomness is applied
#[derive(Debug, Clone, PartialEq)]
pub enum ValueSpec {
    Constant(f32),
    Range { min: f32, max: f32 },
    Curve(Curve),
    /// Draw a start value in `[min, max]` once, then follow `curve`
    RandomThenCurve { min: f32, max: f32, curve: Curve },
}

impl Default for ValueSpec {
    fn default() -> Self {
        ValueSpec::Constant(0.0)
    }
}

impl From<ParsedValue> for ValueSpec {
    fn from(parsed: ParsedValue) -> Self {
        if parsed.keyframes.is_empty() {
            return if parsed.min == parsed.max {
                ValueSpec::Constant(parsed.min)
            } else {
                ValueSpec::Range {
                    min: parsed.min,
                    max: parsed.max,
                }
            };
        }

        let curve = Curve::new(parsed.keyframes, parsed.interpolation);
        if parsed.min == parsed.max {
            ValueSpec::Curve(curve.with_start_value(parsed.min))
        } else {
            ValueSpec::RandomThenCurve {
                min: parsed.min,
                max: parsed.max,
                curve,
            }
        }
    }
}

impl ValueSpec {
    pub fn try_parse(text: &str) -> Result<Self> {
        try_parse_value(text).map(Self::from)
    }

    /// Parse, failing closed to `Constant(0)`
    pub fn parse(text: &str) -> Self {
        parse_value(text).into()
    }

    /// Fix this value for one instance: ranges are drawn, hybrids become plain curves.
    pub fn resolve(&self, rng: &mut ParticleRng) -> ResolvedValue {
        match self {
            ValueSpec::Constant(v) => ResolvedValue::Constant(*v),
            ValueSpec::Range { min, max } => ResolvedValue::Constant(rng.range(*min, *max)),
            ValueSpec::Curve(curve) => ResolvedValue::Curve(curve.clone()),
            ValueSpec::RandomThenCurve { min, max, curve } => {
                let start = rng.range(*min, *max);
                ResolvedValue::Curve(curve.clone().with_start_value(start))
            }
        }
    }

    /// Draw a single value at `time` without keeping a resolved curve around.
    pub fn sample(&self, rng: &mut ParticleRng, time: f32) -> f32 {
        match self {
            ValueSpec::Constant(v) => *v,
            ValueSpec::Range { min, max } => rng.range(*min, *max),
            ValueSpec::Curve(curve) => curve.sample(time),
            ValueSpec::RandomThenCurve { .. } => self.resolve(rng).sample(time),
        }
    }

    /// Smallest and largest value this can produce
    pub fn bounds(&self) -> (f32, f32) {
        let curve_bounds = |curve: &Curve| {
            curve
                .keyframes()
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), kf| {
                    (lo.min(kf.value), hi.max(kf.value))
                })
        };
        match self {
            ValueSpec::Constant(v) => (*v, *v),
            ValueSpec::Range { min, max } => (*min, *max),
            ValueSpec::Curve(curve) => {
                let (lo, hi) = curve_bounds(curve);
                if lo > hi {
                    (0.0, 0.0)
                } else {
                    (lo, hi)
                }
            }
            ValueSpec::RandomThenCurve { min, max, curve } => {
                let (lo, hi) = curve_bounds(curve);
                (lo.min(*min), hi.max(*max))
            }
        }
    }

    /// Time of the last keyframe, if this value is animated
    pub fn last_key_time(&self) -> Option<f32> {
        match self {
            ValueSpec::Curve(curve) | ValueSpec::RandomThenCurve { curve, .. } => curve.last_time(),
            _ => None,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, ValueSpec::Curve(_) | ValueSpec::RandomThenCurve { .. })
    }

    /// Convert keyframe times by `factor` (e.g. centiseconds to seconds)
    pub fn scale_times(&mut self, factor: f32) {
        if let ValueSpec::Curve(curve) | ValueSpec::RandomThenCurve { curve, .. } = self {
            curve.scale_times(factor);
        }
    }
}

/// A value fixed for one emitter or particle instance
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
    Constant(f32),
    Curve(Curve),
}

impl Default for ResolvedValue {
    fn default() -> Self {
        ResolvedValue::Constant(0.0)
    }
}

impl ResolvedValue {
    pub fn sample(&self, time: f32) -> f32 {
        match self {
            ResolvedValue::Constant(v) => *v,
            ResolvedValue::Curve(curve) => curve.sample(time),
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, ResolvedValue::Curve(_))
    }

    /// Largest value this instance can take
    pub fn max_value(&self) -> f32 {
        match self {
            ResolvedValue::Constant(v) => *v,
            ResolvedValue::Curve(curve) => curve.max_value().unwrap_or(0.0),
        }
    }

    pub fn last_key_time(&self) -> Option<f32> {
        match self {
            ResolvedValue::Constant(_) => None,
            ResolvedValue::Curve(curve) => curve.last_time(),
        }
    }
}
