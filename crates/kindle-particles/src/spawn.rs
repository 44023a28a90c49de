//! Particle initialization at launch

use crate::emitter::Emitter;
use crate::field::Field;
use crate::particle::{AttributeTracks, Collision, Particle, SpriteFrame};
use crate::rand::ParticleRng;
use crate::value::ValueSpec;
use glam::Vec2;
use kindle_core::EntityId;
use std::f32::consts::TAU;

/// Velocity for a launch at `angle` degrees. Screen y points down, so 90° is straight up.
pub fn launch_velocity(angle: f32, speed: f32) -> Vec2 {
    let radians = angle.to_radians();
    Vec2::new(radians.cos() * speed, -radians.sin() * speed)
}

/// Extent of a region axis: ranges are taken as-is, anything else spans 0..value
fn extent(spec: &ValueSpec, rng: &mut ParticleRng, t: f32) -> (f32, f32) {
    match spec {
        ValueSpec::Range { min, max } => (*min, *max),
        other => {
            let v = other.sample(rng, t);
            (v.min(0.0), v.max(0.0))
        }
    }
}

/// Random point in the emitter's spawn region, relative to the emitter
pub fn region_point(emitter: &Emitter, rng: &mut ParticleRng) -> Vec2 {
    let effect = &emitter.effect;
    let t = emitter.curve_time();

    let (r_min, r_max) = extent(&effect.emitter_radius, rng, t);
    if r_max > 0.0 {
        // Area-uniform inside the annulus
        let r_min = r_min.max(0.0);
        let u = rng.next_f32();
        let r = (u * (r_max * r_max - r_min * r_min) + r_min * r_min).sqrt();
        let theta = rng.range(0.0, TAU);
        return Vec2::new(r * theta.cos(), r * theta.sin());
    }

    let (x_min, x_max) = extent(&effect.emitter_box_x, rng, t);
    let (y_min, y_max) = extent(&effect.emitter_box_y, rng, t);
    Vec2::new(
        x_min + rng.next_f32() * (x_max - x_min),
        y_min + rng.next_f32() * (y_max - y_min),
    )
}

/// Build one particle for `emitter`, drawing every per-particle value
pub fn launch_particle(emitter: &Emitter, emitter_id: EntityId, rng: &mut ParticleRng) -> Particle {
    let effect = &emitter.effect;
    let t = emitter.curve_time();

    let offset = Vec2::new(
        effect.emitter_offset_x.sample(rng, t),
        effect.emitter_offset_y.sample(rng, t),
    );
    let position = emitter.position + offset + region_point(emitter, rng);

    let lifetime = effect.particle_duration.sample(rng, t);
    let speed = effect.launch_speed.sample(rng, t);
    let angle = effect.launch_angle.sample(rng, t) + emitter.angle_offset;

    let mut particle = Particle::new(emitter_id, position, launch_velocity(angle, speed), lifetime);
    particle.looping = effect.particle_loops;
    particle.rotation = effect.particle_spin_angle.sample(rng, 0.0);

    particle.fields = effect
        .fields
        .iter()
        .map(|template| Field::resolve(template, position, rng))
        .collect();
    particle.collision = particle
        .fields
        .iter()
        .find_map(Field::ground_y)
        .map(|ground_y| Collision {
            ground_y,
            reflect_x: effect.collision_reflect_x.resolve(rng),
            reflect_y: effect.collision_reflect_y.resolve(rng),
            spin: effect.collision_spin.resolve(rng),
        });

    particle.tracks = AttributeTracks {
        scale: effect.particle_scale.resolve(rng),
        alpha: effect.particle_alpha.resolve(rng),
        red: effect.particle_red.resolve(rng),
        green: effect.particle_green.resolve(rng),
        blue: effect.particle_blue.resolve(rng),
        brightness: effect.particle_brightness.resolve(rng),
        spin_speed: effect.particle_spin_speed.resolve(rng),
    };

    particle.emitter_age = emitter.age;
    particle.emitter_duration = emitter.system_duration;
    particle.system_alpha = emitter.system_alpha.clone();
    particle.sample_tracks(0.0);

    particle.sprite = sprite_frame(emitter, rng);
    particle.fresh = true;
    particle
}

fn sprite_frame(emitter: &Emitter, rng: &mut ParticleRng) -> SpriteFrame {
    let effect = &emitter.effect;
    let sheet = emitter.sprite;
    let columns = sheet.map_or(1, |s| s.columns);
    let rows = sheet.map_or(1, |s| s.rows.max(1));

    let row = effect.image_row.unwrap_or(0).min(rows - 1);
    let mut frame = SpriteFrame::new(sheet, row, effect.image_frames.unwrap_or(columns));
    frame.animated = effect.animated;
    frame.frame_duration = effect.animation_rate.map(|fps| 1.0 / fps);
    if effect.random_start_frame {
        frame.frame = rng.index(frame.frame_count);
    }
    frame
}
