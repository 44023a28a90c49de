//! When is an effect done?
//!
//! A triggered effect may be made of several co-located emitters. The effect
//! counts as complete once every emitter sharing the representative's origin
//! has stopped spawning and its longest-lived particle has had time to expire.

use crate::emitter::Emitter;
use glam::Vec2;
use kindle_ecs::KindleWorld;

/// Emitters this close to each other belong to the same effect instance
pub const ORIGIN_EPSILON: f32 = 1e-3;

/// Emitter age at which all of this emitter's particles are gone
pub fn completion_time(emitter: &Emitter) -> f32 {
    let effect = &emitter.effect;
    if emitter.looping || effect.particle_loops {
        return f32::INFINITY;
    }

    let last_key = emitter.spawn.last_key_time();
    let stop_time = if emitter.system_duration > 0.0 {
        emitter.system_duration * last_key.unwrap_or(1.0).max(1.0)
    } else {
        let uncapped_stream = emitter.spawn.rate.max_value() > 0.0
            && emitter.spawn.max_launched.max_value() <= 0.0;
        if uncapped_stream {
            return f32::INFINITY;
        }
        last_key.unwrap_or(0.0)
    };

    stop_time + effect.particle_duration.bounds().1.max(0.0)
}

/// Whether every emitter within [`ORIGIN_EPSILON`] of `origin` has outlived its completion time.
/// Each emitter is measured against its own age. No emitter there means nothing is left to finish.
pub fn is_complete_at(world: &KindleWorld, origin: Vec2) -> bool {
    world.ids_with::<Emitter>().into_iter().all(|id| {
        world.get::<Emitter>(id).map_or(true, |emitter| {
            emitter.origin.distance(origin) > ORIGIN_EPSILON
                || emitter.age >= completion_time(&emitter)
        })
    })
}
