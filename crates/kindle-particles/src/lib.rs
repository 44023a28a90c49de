//! Kindle Particles - data-driven 2D visual effects
//!
//! Effects are authored as TOML tables whose properties use a small value
//! grammar (constants, random ranges, keyframed curves). At runtime:
//! - `Emitter` entities schedule launches in burst, sustain, or continuous mode
//! - `Particle` entities integrate motion, force fields, and ground bounces
//! - appearance tracks are sampled against each particle's normalized age
//! - live particles are packed into `SpriteInstance`s for batched drawing

pub mod completion;
pub mod config;
pub mod curve;
pub mod definition;
pub mod draw;
pub mod effect;
pub mod emitter;
pub mod field;
pub mod particle;
pub mod rand;
pub mod side_channel;
pub mod spawn;
pub mod sprite;
pub mod system;
pub mod value;

pub use config::ParticleConfig;
pub use curve::{Curve, Interpolation, Keyframe};
pub use definition::{EffectDefinition, EffectFile, FieldDescriptor, FieldKind};
pub use draw::{InstanceBuffer, SpriteBatch, SpriteInstance};
pub use effect::{Effect, EffectLibrary};
pub use emitter::Emitter;
pub use field::Field;
pub use particle::{Particle, ParticleStatus};
pub use side_channel::EffectSideChannel;
pub use sprite::{SpriteAtlas, SpriteProvider, SpriteSheet};
pub use system::{ParticleStats, ParticleSystem};
pub use value::{parse_value, try_parse_value, ResolvedValue, ValueSpec};
