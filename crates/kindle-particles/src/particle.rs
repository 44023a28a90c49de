//! Particle component and its per-tick update

use crate::field::{Field, Motion};
use crate::rand::ParticleRng;
use crate::sprite::SpriteSheet;
use crate::value::ResolvedValue;
use glam::Vec2;
use kindle_core::{Color, EntityId};

/// Outcome of advancing a particle one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleStatus {
    Alive,
    Expired,
}

/// Appearance tracks, sampled against normalized particle age
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeTracks {
    pub scale: ResolvedValue,
    pub alpha: ResolvedValue,
    pub red: ResolvedValue,
    pub green: ResolvedValue,
    pub blue: ResolvedValue,
    pub brightness: ResolvedValue,
    pub spin_speed: ResolvedValue,
}

impl Default for AttributeTracks {
    fn default() -> Self {
        let one = || ResolvedValue::Constant(1.0);
        Self {
            scale: one(),
            alpha: one(),
            red: one(),
            green: one(),
            blue: one(),
            brightness: one(),
            spin_speed: ResolvedValue::Constant(0.0),
        }
    }
}

/// Ground bounce response
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub ground_y: f32,
    pub reflect_x: ResolvedValue,
    pub reflect_y: ResolvedValue,
    /// Random spin impulse magnitude, degrees per second
    pub spin: ResolvedValue,
}

impl Collision {
    pub fn new(ground_y: f32) -> Self {
        Self {
            ground_y,
            reflect_x: ResolvedValue::Constant(0.0),
            reflect_y: ResolvedValue::Constant(0.0),
            spin: ResolvedValue::Constant(0.0),
        }
    }
}

/// Sprite selection and flipbook timing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpriteFrame {
    pub sheet: Option<SpriteSheet>,
    pub row: u32,
    pub frame: u32,
    pub frame_count: u32,
    pub animated: bool,
    /// Seconds per frame; `None` spreads the frames over the particle lifetime
    pub frame_duration: Option<f32>,
    frame_time: f32,
}

impl SpriteFrame {
    pub fn new(sheet: Option<SpriteSheet>, row: u32, frame_count: u32) -> Self {
        Self {
            sheet,
            row,
            frame: 0,
            frame_count: frame_count.max(1),
            animated: false,
            frame_duration: None,
            frame_time: 0.0,
        }
    }

    fn advance(&mut self, dt: f32, lifetime: f32) {
        if !self.animated || self.frame_count <= 1 {
            return;
        }
        let per_frame = self
            .frame_duration
            .unwrap_or(lifetime / self.frame_count as f32);
        if per_frame <= 0.0 {
            return;
        }
        self.frame_time += dt;
        while self.frame_time >= per_frame {
            self.frame_time -= per_frame;
            self.frame = (self.frame + 1) % self.frame_count;
        }
    }
}

/// A single live particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub emitter: EntityId,
    pub motion: Motion,
    /// Degrees
    pub rotation: f32,
    /// Degrees per second
    pub rotation_speed: f32,
    /// Accumulated collision spin, added on top of the spin track
    pub spin_impulse: f32,

    pub scale: f32,
    pub alpha: f32,
    pub color: [f32; 3],
    pub brightness: f32,
    pub tracks: AttributeTracks,

    pub age: f32,
    pub lifetime: f32,
    pub looping: bool,

    /// Owning emitter's clock, mirrored for the system alpha track
    pub emitter_age: f32,
    pub emitter_duration: f32,
    pub system_alpha: Option<ResolvedValue>,
    pub system_alpha_value: f32,

    pub fields: Vec<Field>,
    pub collision: Option<Collision>,
    pub sprite: SpriteFrame,

    /// Spawned this tick; skipped by the tick's particle pass
    pub(crate) fresh: bool,
}

impl Particle {
    pub fn new(emitter: EntityId, position: Vec2, velocity: Vec2, lifetime: f32) -> Self {
        Self {
            emitter,
            motion: Motion {
                position,
                velocity,
                origin: position,
            },
            rotation: 0.0,
            rotation_speed: 0.0,
            spin_impulse: 0.0,
            scale: 1.0,
            alpha: 1.0,
            color: [1.0; 3],
            brightness: 1.0,
            tracks: AttributeTracks::default(),
            age: 0.0,
            lifetime,
            looping: false,
            emitter_age: 0.0,
            emitter_duration: 0.0,
            system_alpha: None,
            system_alpha_value: 1.0,
            fields: Vec::new(),
            collision: None,
            sprite: SpriteFrame::default(),
            fresh: false,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.motion.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.motion.velocity
    }

    /// Age as a fraction of lifetime, in [0, 1]
    pub fn normalized_age(&self) -> f32 {
        if self.lifetime > 0.0 {
            (self.age / self.lifetime).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Final color with the emitter's alpha folded in
    pub fn tint(&self) -> Color {
        let [r, g, b] = self.color;
        Color::new(r, g, b, self.alpha * self.system_alpha_value).brightened(self.brightness)
    }

    /// Advance one tick of `dt` seconds
    pub fn advance(&mut self, dt: f32, rng: &mut ParticleRng) -> ParticleStatus {
        if self.lifetime <= 0.0 {
            return ParticleStatus::Expired;
        }

        self.age += dt;
        self.emitter_age += dt;
        if self.age >= self.lifetime {
            if !self.looping {
                return ParticleStatus::Expired;
            }
            self.age = 0.0;
        }
        let t = self.normalized_age();

        match self.fields.iter().find_map(|f| f.position_offset(t)) {
            Some(offset) => self.motion.position = self.motion.origin + offset,
            None => self.motion.position += self.motion.velocity * dt,
        }

        self.collide(t, rng);
        self.rotation += self.rotation_speed * dt;

        for field in &self.fields {
            field.apply(&mut self.motion, dt, t, rng);
        }

        self.sample_tracks(t);
        self.sprite.advance(dt, self.lifetime);

        ParticleStatus::Alive
    }

    fn collide(&mut self, t: f32, rng: &mut ParticleRng) {
        let Some(collision) = &self.collision else {
            return;
        };
        let ground_y = collision.ground_y;
        let motion = &mut self.motion;
        if ground_y <= 0.0 || motion.position.y < ground_y || motion.velocity.y <= 0.0 {
            return;
        }

        motion.position.y = ground_y;
        motion.velocity.y = -motion.velocity.y * collision.reflect_y.sample(t);
        motion.velocity.x *= collision.reflect_x.sample(t);
        self.spin_impulse += rng.signed_unit() * collision.spin.sample(t);
        self.rotation_speed = self.tracks.spin_speed.sample(t) + self.spin_impulse;
    }

    /// Refresh appearance from the tracks at normalized age `t`
    pub fn sample_tracks(&mut self, t: f32) {
        let tracks = &self.tracks;
        self.scale = tracks.scale.sample(t);
        self.alpha = tracks.alpha.sample(t);
        self.color = [tracks.red.sample(t), tracks.green.sample(t), tracks.blue.sample(t)];
        self.brightness = tracks.brightness.sample(t);
        self.rotation_speed = tracks.spin_speed.sample(t) + self.spin_impulse;

        if let Some(system_alpha) = &self.system_alpha {
            let emitter_t = if self.emitter_duration > 0.0 {
                self.emitter_age / self.emitter_duration
            } else {
                self.emitter_age
            };
            self.system_alpha_value = system_alpha.sample(emitter_t);
        }
    }
}
