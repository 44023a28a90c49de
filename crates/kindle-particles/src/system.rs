//! The particle system: owns the RNG and sprite lookup, drives emitters and particles

use crate::completion;
use crate::config::ParticleConfig;
use crate::draw::InstanceBuffer;
use crate::effect::Effect;
use crate::emitter::Emitter;
use crate::particle::{Particle, ParticleStatus};
use crate::rand::ParticleRng;
use crate::side_channel::EffectSideChannel;
use crate::spawn;
use crate::sprite::{SpriteAtlas, SpriteProvider};
use glam::Vec2;
use kindle_core::{EntityId, Result};
use kindle_ecs::KindleWorld;
use kindle_runtime::RuntimeSystem;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Snapshot counts for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParticleStats {
    pub emitters: usize,
    pub active_emitters: usize,
    pub particles: usize,
}

pub struct ParticleSystem {
    config: ParticleConfig,
    rng: ParticleRng,
    sprites: Box<dyn SpriteProvider>,
    side_channel: Option<Box<dyn EffectSideChannel>>,
    /// Image names already reported missing
    missing_images: HashSet<String>,
    /// Origins of removed emitters whose co-located effect may still be running
    retired: HashMap<EntityId, Vec2>,
    instances: InstanceBuffer,
}

impl ParticleSystem {
    pub fn new(config: ParticleConfig) -> Self {
        Self {
            rng: ParticleRng::new(config.seed),
            config,
            sprites: Box::new(SpriteAtlas::new()),
            side_channel: None,
            missing_images: HashSet::new(),
            retired: HashMap::new(),
            instances: InstanceBuffer::new(),
        }
    }

    pub fn with_sprites(mut self, sprites: impl SpriteProvider + 'static) -> Self {
        self.sprites = Box::new(sprites);
        self
    }

    pub fn with_side_channel(mut self, channel: impl EffectSideChannel + 'static) -> Self {
        self.side_channel = Some(Box::new(channel));
        self
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    /// Start an effect at `position`. Launch angles are rotated by `angle_offset` degrees.
    pub fn spawn_emitter(
        &mut self,
        world: &mut KindleWorld,
        effect: &Arc<Effect>,
        position: Vec2,
        angle_offset: f32,
    ) -> EntityId {
        let mut emitter = Emitter::new(Arc::clone(effect), position, angle_offset, &mut self.rng);

        if let Some(image) = &effect.image {
            emitter.sprite = self.sprites.lookup(image);
            if emitter.sprite.is_none() && self.missing_images.insert(image.clone()) {
                tracing::warn!(effect = %effect.name, image = %image, "sprite not found; particles will not render");
            }
        }

        let id = world.spawn_with(emitter);
        tracing::debug!(effect = %effect.name, emitter = %id, x = position.x, y = position.y, "emitter spawned");

        if let Some(channel) = &mut self.side_channel {
            channel.emitter_spawned(id, &effect.name, effect.spawn_cue.as_deref());
        }
        id
    }

    /// Whether the effect started with `handle` has finished, including every emitter
    /// sharing its origin. The handle stays valid after its own emitter is removed.
    pub fn is_effect_complete(&self, world: &KindleWorld, handle: EntityId) -> bool {
        let origin = world
            .get::<Emitter>(handle)
            .map(|emitter| emitter.origin)
            .or_else(|| self.retired.get(&handle).copied());
        match origin {
            Some(origin) => completion::is_complete_at(world, origin),
            None => true,
        }
    }

    /// Remove an emitter and every particle it owns. Missing handles are ignored.
    pub fn destroy_emitter(&mut self, world: &mut KindleWorld, handle: EntityId) {
        let Ok(emitter) = world.remove::<Emitter>(handle) else {
            return;
        };
        for particle in &emitter.live {
            world.despawn_if_present(*particle);
        }
        world.despawn_if_present(handle);
        tracing::debug!(emitter = %handle, effect = %emitter.effect.name, "emitter destroyed");
        self.retire(handle, &emitter);
    }

    fn retire(&mut self, id: EntityId, emitter: &Emitter) {
        self.retired.insert(id, emitter.origin);
        if let Some(channel) = &mut self.side_channel {
            channel.emitter_finished(id);
        }
    }

    /// Advance every emitter, then every particle, by `dt` seconds
    pub fn tick(&mut self, world: &mut KindleWorld, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let mut room = self
            .config
            .max_particles
            .saturating_sub(world.count_with::<Particle>());
        for id in world.ids_with::<Emitter>() {
            self.update_emitter(world, id, dt, &mut room);
        }
        self.retired
            .retain(|_, origin| !completion::is_complete_at(world, *origin));

        let mut expired = Vec::new();
        for id in world.ids_with::<Particle>() {
            let owner_alive = world
                .get::<Particle>(id)
                .is_some_and(|p| !p.looping || world.contains(p.emitter));
            let Some(mut particle) = world.get_mut::<Particle>(id) else {
                continue;
            };
            if particle.fresh {
                particle.fresh = false;
                continue;
            }
            if !owner_alive || particle.advance(dt, &mut self.rng) == ParticleStatus::Expired {
                expired.push(id);
            }
        }
        for id in expired {
            world.despawn_if_present(id);
        }
    }

    fn update_emitter(&mut self, world: &mut KindleWorld, id: EntityId, dt: f32, room: &mut usize) {
        // Detach while working so the world stays free for spawning
        let Ok(mut emitter) = world.remove::<Emitter>(id) else {
            return;
        };

        emitter.tick_clock(dt);
        emitter.prune(|particle| world.contains(particle));

        let count = emitter.schedule(*room);
        for _ in 0..count {
            let particle = spawn::launch_particle(&emitter, id, &mut self.rng);
            emitter.live.push(world.spawn_with(particle));
        }
        *room -= count;

        if emitter.is_finished() {
            world.despawn_if_present(id);
            tracing::debug!(emitter = %id, effect = %emitter.effect.name, launched = emitter.total_launched, "emitter finished");
            self.retire(id, &emitter);
        } else if let Err(err) = world.insert(id, emitter) {
            tracing::warn!(emitter = %id, "failed to reattach emitter: {err}");
        }
    }

    pub fn stats(&self, world: &KindleWorld) -> ParticleStats {
        let emitters = world.ids_with::<Emitter>();
        ParticleStats {
            active_emitters: emitters
                .iter()
                .filter(|id| world.get::<Emitter>(**id).is_some_and(|e| e.active))
                .count(),
            emitters: emitters.len(),
            particles: world.count_with::<Particle>(),
        }
    }

    /// Repack draw instances from the current particles
    pub fn pack_instances(&mut self, world: &KindleWorld) -> &InstanceBuffer {
        self.instances.pack(world);
        &self.instances
    }

    pub fn instances(&self) -> &InstanceBuffer {
        &self.instances
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new(ParticleConfig::default())
    }
}

impl RuntimeSystem for ParticleSystem {
    fn initialize(&mut self, world: &mut KindleWorld) -> Result<()> {
        let stats = self.stats(world);
        tracing::info!(
            seed = self.config.seed,
            max_particles = self.config.max_particles,
            emitters = stats.emitters,
            "particle system ready"
        );
        Ok(())
    }

    fn fixed_update(&mut self, world: &mut KindleWorld, dt: f64) -> Result<()> {
        self.tick(world, dt as f32);
        Ok(())
    }

    fn update(&mut self, world: &mut KindleWorld, _dt: f64) -> Result<()> {
        self.instances.pack(world);
        Ok(())
    }

    fn name(&self) -> &str {
        "particles"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::EffectLibrary;
    use crate::sprite::SpriteAtlas;
    use kindle_runtime::{EventBus, GameEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn effect(name: &str, body: &str) -> Arc<Effect> {
        Arc::new(Effect::from_toml_str(name, body).unwrap())
    }

    #[test]
    fn fresh_particles_skip_their_first_tick() {
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default();
        let fx = effect("one", "spawn_min_active = 1\nsystem_duration = 1\nlaunch_speed = 100");
        system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);

        system.tick(&mut world, 0.01);
        let id = world.ids_with::<Particle>()[0];
        assert_eq!(world.get::<Particle>(id).unwrap().age, 0.0);

        system.tick(&mut world, 0.01);
        assert!((world.get::<Particle>(id).unwrap().age - 0.01).abs() < 1e-6);
    }

    #[test]
    fn global_cap_drops_spawns() {
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::new(ParticleConfig {
            max_particles: 5,
            ..ParticleConfig::default()
        });
        let fx = effect("many", "spawn_min_active = 8\nsystem_duration = 1");
        let handle = system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);

        system.tick(&mut world, 0.01);
        assert_eq!(world.count_with::<Particle>(), 5);
        assert_eq!(world.get::<Emitter>(handle).unwrap().total_launched, 5);
    }

    #[test]
    fn destroy_emitter_removes_its_particles() {
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default();
        let fx = effect("loop", "spawn_min_active = 3\nparticle_loops = true\nsystem_duration = 1");
        let handle = system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);
        system.tick(&mut world, 0.01);
        assert_eq!(world.count_with::<Particle>(), 3);

        system.destroy_emitter(&mut world, handle);
        assert_eq!(world.entity_count(), 0);
        // idempotent
        system.destroy_emitter(&mut world, handle);
    }

    #[test]
    fn side_channel_sees_lifecycle() {
        let bus = Rc::new(RefCell::new(EventBus::new()));
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default().with_side_channel(Rc::clone(&bus));
        let fx = effect("pop", "spawn_min_active = 1\nparticle_duration = 0.02\nspawn_cue = \"pop_sfx\"");
        let handle = system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);

        for _ in 0..10 {
            system.tick(&mut world, 0.01);
        }
        assert!(!world.contains(handle));
        assert_eq!(
            bus.borrow_mut().drain(),
            vec![
                GameEvent::EmitterSpawned {
                    emitter: handle,
                    effect: "pop".into()
                },
                GameEvent::EffectCue {
                    emitter: handle,
                    cue: "pop_sfx".into()
                },
                GameEvent::EmitterFinished { emitter: handle },
            ]
        );
    }

    #[test]
    fn destroy_reports_finished_once() {
        let bus = Rc::new(RefCell::new(EventBus::new()));
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default().with_side_channel(Rc::clone(&bus));
        let fx = effect("hum", "spawn_rate = 5");
        let handle = system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);
        system.tick(&mut world, 0.01);

        system.destroy_emitter(&mut world, handle);
        system.destroy_emitter(&mut world, handle);
        let finished = bus
            .borrow()
            .iter()
            .filter(|event| **event == GameEvent::EmitterFinished { emitter: handle })
            .count();
        assert_eq!(finished, 1);
    }

    #[test]
    fn handle_outlives_its_emitter() {
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default();
        let short = effect("short", "system_duration = 0.1
spawn_min_active = 1
particle_duration = 0.1");
        let long = effect("long", "system_duration = 1
spawn_min_active = 1
particle_duration = 1");
        let handle = system.spawn_emitter(&mut world, &short, Vec2::ONE, 0.0);
        system.spawn_emitter(&mut world, &long, Vec2::ONE, 0.0);

        for _ in 0..50 {
            system.tick(&mut world, 0.01);
        }
        assert!(!world.contains(handle));
        assert!(!system.is_effect_complete(&world, handle));

        for _ in 0..200 {
            system.tick(&mut world, 0.01);
        }
        assert!(system.is_effect_complete(&world, handle));
        assert!(system.retired.is_empty());
        assert!(system.is_effect_complete(&world, EntityId(77)));
    }

    #[test]
    fn missing_sprite_still_simulates() {
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default();
        let fx = effect("ghost", "spawn_min_active = 2\nsystem_duration = 1\nimage = \"nope\"");
        system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);
        system.tick(&mut world, 0.01);

        assert_eq!(world.count_with::<Particle>(), 2);
        assert!(system.pack_instances(&world).instances().is_empty());
    }

    #[test]
    fn packs_sprites_from_atlas() {
        let mut atlas = SpriteAtlas::new();
        atlas.insert("dot", 1, 1);
        let library = EffectLibrary::from_toml_str(
            "[effects.dots]\nspawn_min_active = 4\nsystem_duration = 1\nimage = \"dot\"",
        )
        .unwrap();

        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default().with_sprites(atlas);
        system.spawn_emitter(&mut world, &library.require("dots").unwrap(), Vec2::ZERO, 0.0);
        system.tick(&mut world, 0.01);

        let buffer = system.pack_instances(&world);
        assert_eq!(buffer.instances().len(), 4);
        assert_eq!(buffer.batches().len(), 1);
    }

    #[test]
    fn stats_count_entities() {
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default();
        let fx = effect("s", "spawn_min_active = 2\nsystem_duration = 1");
        system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);
        system.spawn_emitter(&mut world, &fx, Vec2::new(5.0, 0.0), 0.0);
        system.tick(&mut world, 0.01);

        assert_eq!(
            system.stats(&world),
            ParticleStats {
                emitters: 2,
                active_emitters: 2,
                particles: 4
            }
        );
    }

    #[test]
    fn non_positive_dt_is_ignored() {
        let mut world = KindleWorld::new();
        let mut system = ParticleSystem::default();
        let fx = effect("s", "spawn_min_active = 2\nsystem_duration = 1");
        system.spawn_emitter(&mut world, &fx, Vec2::ZERO, 0.0);
        system.tick(&mut world, 0.0);
        system.tick(&mut world, f32::NAN);
        assert_eq!(world.count_with::<Particle>(), 0);
    }
}
