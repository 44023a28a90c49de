//! Force fields
//!
//! Each particle carries its own resolved copy of the effect's fields. A field
//! is resolved once at spawn: ranges become either a fixed draw or a per-tick
//! jitter, curves are kept and sampled against the particle's normalized age.

use crate::curve::Curve;
use crate::definition::FieldKind;
use crate::effect::FieldTemplate;
use crate::rand::ParticleRng;
use crate::value::{ResolvedValue, ValueSpec};
use glam::Vec2;

/// Acceleration and friction values are authored per 1/100 s step
pub const SOURCE_TICK: f32 = 0.01;

/// One axis of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldAxis {
    Fixed(ResolvedValue),
    /// Redrawn from the range on every tick
    Jitter { min: f32, max: f32 },
}

impl FieldAxis {
    pub fn resolve(spec: &ValueSpec, rng: &mut ParticleRng) -> Self {
        match spec {
            ValueSpec::Range { min, max } => FieldAxis::Jitter {
                min: *min,
                max: *max,
            },
            other => FieldAxis::Fixed(other.resolve(rng)),
        }
    }

    pub fn sample(&self, rng: &mut ParticleRng, t: f32) -> f32 {
        match self {
            FieldAxis::Fixed(value) => value.sample(t),
            FieldAxis::Jitter { min, max } => rng.range(*min, *max),
        }
    }
}

/// Kinematic state a field acts on
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Motion {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Where the particle was spawned
    pub origin: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// Adds to velocity every tick
    Acceleration { x: FieldAxis, y: FieldAxis },
    /// Scales velocity down every tick
    Friction { x: FieldAxis, y: FieldAxis },
    /// Overrides integration: position = origin + curve(t)
    Position { x: Curve, y: Curve },
    /// Rotates the velocity vector, degrees per second
    Circle { angular_velocity: FieldAxis },
    /// Pushes the particle radially outward from its spawn point
    Away { speed: FieldAxis },
    /// Floor for ground collision, `ground_y` below the spawn point
    GroundConstraint { ground_y: f32 },
}

/// A position offset track: un-keyed values animate from 0 to a drawn target
fn offset_curve(spec: &ValueSpec, authored: bool, rng: &mut ParticleRng) -> Curve {
    if !authored {
        return Curve::constant(0.0);
    }
    match spec.resolve(rng) {
        ResolvedValue::Constant(target) => Curve::ramp(0.0, target),
        ResolvedValue::Curve(curve) => curve,
    }
}

impl Field {
    /// Fix a template's randomness for one particle spawned at `spawn`
    pub fn resolve(template: &FieldTemplate, spawn: Vec2, rng: &mut ParticleRng) -> Self {
        match template.kind {
            FieldKind::Acceleration => Field::Acceleration {
                x: FieldAxis::resolve(&template.x, rng),
                y: FieldAxis::resolve(&template.y, rng),
            },
            FieldKind::Friction => Field::Friction {
                x: FieldAxis::resolve(&template.x, rng),
                y: FieldAxis::resolve(&template.y, rng),
            },
            FieldKind::Position => Field::Position {
                x: offset_curve(&template.x, template.has_x, rng),
                y: offset_curve(&template.y, template.has_y, rng),
            },
            FieldKind::Circle => Field::Circle {
                angular_velocity: FieldAxis::resolve(&template.x, rng),
            },
            FieldKind::Away => Field::Away {
                speed: FieldAxis::resolve(&template.x, rng),
            },
            FieldKind::GroundConstraint => {
                let spec = if template.has_y { &template.y } else { &template.x };
                Field::GroundConstraint {
                    ground_y: spawn.y + spec.sample(rng, 0.0),
                }
            }
        }
    }

    /// Apply this field for one tick. `t` is the particle's normalized age.
    pub fn apply(&self, motion: &mut Motion, dt: f32, t: f32, rng: &mut ParticleRng) {
        match self {
            Field::Acceleration { x, y } => {
                let accel = Vec2::new(x.sample(rng, t), y.sample(rng, t));
                motion.velocity += accel / SOURCE_TICK * dt;
            }
            Field::Friction { x, y } => {
                let damp = |c: f32| (1.0 - c / SOURCE_TICK * dt).max(0.0);
                motion.velocity.x *= damp(x.sample(rng, t));
                motion.velocity.y *= damp(y.sample(rng, t));
            }
            Field::Circle { angular_velocity } => {
                let radians = (angular_velocity.sample(rng, t) * dt).to_radians();
                motion.velocity = Vec2::from_angle(radians).rotate(motion.velocity);
            }
            Field::Away { speed } => {
                let heading = motion
                    .velocity
                    .try_normalize()
                    .or_else(|| (motion.position - motion.origin).try_normalize());
                if let Some(heading) = heading {
                    motion.velocity += heading * speed.sample(rng, t) * dt;
                }
            }
            // Handled during integration and collision
            Field::Position { .. } | Field::GroundConstraint { .. } => {}
        }
    }

    /// Offset from the spawn point if this field drives position directly
    pub fn position_offset(&self, t: f32) -> Option<Vec2> {
        match self {
            Field::Position { x, y } => Some(Vec2::new(x.sample(t), y.sample(t))),
            _ => None,
        }
    }

    pub fn ground_y(&self) -> Option<f32> {
        match self {
            Field::GroundConstraint { ground_y } => Some(*ground_y),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(kind: FieldKind, x: &str, y: &str) -> FieldTemplate {
        FieldTemplate {
            kind,
            x: ValueSpec::parse(x),
            y: ValueSpec::parse(y),
            has_x: true,
            has_y: true,
        }
    }

    fn at_rest() -> Motion {
        Motion::default()
    }

    #[test]
    fn acceleration_uses_source_tick() {
        let mut rng = ParticleRng::new(1);
        let field = Field::resolve(&template(FieldKind::Acceleration, "0", "0.05"), Vec2::ZERO, &mut rng);
        let mut motion = at_rest();
        field.apply(&mut motion, 0.5, 0.0, &mut rng);
        // 0.05 per 1/100 s is 5 per second
        assert!((motion.velocity.y - 2.5).abs() < 1e-5);
        assert_eq!(motion.velocity.x, 0.0);
    }

    #[test]
    fn friction_never_reverses_velocity() {
        let mut rng = ParticleRng::new(1);
        let field = Field::resolve(&template(FieldKind::Friction, "0.5", "0.001"), Vec2::ZERO, &mut rng);
        let mut motion = Motion {
            velocity: Vec2::new(100.0, 100.0),
            ..at_rest()
        };
        field.apply(&mut motion, 0.1, 0.0, &mut rng);
        assert_eq!(motion.velocity.x, 0.0);
        assert!((motion.velocity.y - 99.0).abs() < 1e-3);
    }

    #[test]
    fn range_axis_jitters_per_tick() {
        let mut rng = ParticleRng::new(9);
        let axis = FieldAxis::resolve(&ValueSpec::parse("[1 2]"), &mut rng);
        assert!(matches!(axis, FieldAxis::Jitter { .. }));
        let draws: Vec<f32> = (0..10).map(|_| axis.sample(&mut rng, 0.0)).collect();
        assert!(draws.iter().all(|v| (1.0..=2.0).contains(v)));
        assert!(draws.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn position_target_ramps_from_zero() {
        let mut rng = ParticleRng::new(1);
        let mut tpl = template(FieldKind::Position, "40", "0");
        tpl.has_y = false;
        let field = Field::resolve(&tpl, Vec2::ZERO, &mut rng);
        assert_eq!(field.position_offset(0.0), Some(Vec2::ZERO));
        let halfway = field.position_offset(0.5).unwrap();
        assert!((halfway.x - 20.0).abs() < 1e-5);
        assert_eq!(halfway.y, 0.0);
    }

    #[test]
    fn circle_preserves_speed() {
        let mut rng = ParticleRng::new(1);
        let field = Field::resolve(&template(FieldKind::Circle, "90", "0"), Vec2::ZERO, &mut rng);
        let mut motion = Motion {
            velocity: Vec2::new(10.0, 0.0),
            ..at_rest()
        };
        field.apply(&mut motion, 1.0, 0.0, &mut rng);
        assert!((motion.velocity.length() - 10.0).abs() < 1e-4);
        assert!(motion.velocity.x.abs() < 1e-4);
        assert!((motion.velocity.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn away_falls_back_to_spawn_offset() {
        let mut rng = ParticleRng::new(1);
        let field = Field::resolve(&template(FieldKind::Away, "10", "0"), Vec2::ZERO, &mut rng);
        let mut motion = Motion {
            position: Vec2::new(0.0, -5.0),
            ..at_rest()
        };
        field.apply(&mut motion, 0.5, 0.0, &mut rng);
        assert!((motion.velocity.y + 5.0).abs() < 1e-5);

        let mut still = at_rest();
        field.apply(&mut still, 0.5, 0.0, &mut rng);
        assert_eq!(still.velocity, Vec2::ZERO);
    }

    #[test]
    fn ground_is_relative_to_spawn() {
        let mut rng = ParticleRng::new(1);
        let field = Field::resolve(
            &template(FieldKind::GroundConstraint, "0", "30"),
            Vec2::new(5.0, 70.0),
            &mut rng,
        );
        assert_eq!(field.ground_y(), Some(100.0));
        assert_eq!(field.position_offset(0.3), None);
    }
}
