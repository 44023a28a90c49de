//! Emitter component: lifecycle clock and spawn scheduling

use crate::effect::Effect;
use crate::rand::ParticleRng;
use crate::sprite::SpriteSheet;
use crate::value::ResolvedValue;
use glam::Vec2;
use kindle_core::EntityId;
use std::sync::Arc;

/// Continuous spawning never owes more than this many seconds of backlog
pub const MAX_SPAWN_BACKLOG: f32 = 10.0;

/// Spawn parameters fixed for one emitter instance
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnParams {
    pub rate: ResolvedValue,
    pub min_active: ResolvedValue,
    pub max_active: ResolvedValue,
    pub max_launched: ResolvedValue,
}

impl SpawnParams {
    fn is_static(&self) -> bool {
        !(self.rate.is_animated()
            || self.min_active.is_animated()
            || self.max_active.is_animated()
            || self.max_launched.is_animated())
    }

    /// Latest keyframe time across all four tracks
    pub fn last_key_time(&self) -> Option<f32> {
        [&self.rate, &self.min_active, &self.max_active, &self.max_launched]
            .into_iter()
            .filter_map(ResolvedValue::last_key_time)
            .reduce(f32::max)
    }
}

fn count(value: f32) -> usize {
    if value.is_finite() && value > 0.0 {
        value.round() as usize
    } else {
        0
    }
}

/// A running instance of an effect
#[derive(Debug, Clone)]
pub struct Emitter {
    pub effect: Arc<Effect>,
    /// Where the emitter was triggered
    pub origin: Vec2,
    /// Current position (origin plus the system position track)
    pub position: Vec2,
    /// Degrees added to every launch angle
    pub angle_offset: f32,

    pub age: f32,
    pub active: bool,
    /// Seconds; 0 runs until stopped
    pub system_duration: f32,
    pub looping: bool,

    pub next_spawn_time: f32,
    pub total_launched: usize,
    /// Particles this emitter owns that may still be alive
    pub live: Vec<EntityId>,

    pub spawn: SpawnParams,
    pub system_position: Option<(ResolvedValue, ResolvedValue)>,
    pub system_alpha: Option<ResolvedValue>,
    pub sprite: Option<SpriteSheet>,
}

impl Emitter {
    pub fn new(effect: Arc<Effect>, position: Vec2, angle_offset: f32, rng: &mut ParticleRng) -> Self {
        let system_duration = effect.system_duration.sample(rng, 0.0).max(0.0);
        let spawn = SpawnParams {
            rate: effect.spawn_rate.resolve(rng),
            min_active: effect.spawn_min_active.resolve(rng),
            max_active: effect.spawn_max_active.resolve(rng),
            max_launched: effect.spawn_max_launched.resolve(rng),
        };
        let system_position = effect
            .system_position
            .as_ref()
            .map(|(x, y)| (x.resolve(rng), y.resolve(rng)));
        let system_alpha = effect.system_alpha.as_ref().map(|a| a.resolve(rng));

        Self {
            looping: effect.looping,
            effect,
            origin: position,
            position,
            angle_offset,
            age: 0.0,
            active: true,
            system_duration,
            next_spawn_time: 0.0,
            total_launched: 0,
            live: Vec::new(),
            spawn,
            system_position,
            system_alpha,
            sprite: None,
        }
    }

    /// Time coordinate for emitter-time tracks: normalized when the duration is finite
    pub fn curve_time(&self) -> f32 {
        if self.system_duration > 0.0 {
            self.age / self.system_duration
        } else {
            self.age
        }
    }

    /// Advance the lifecycle clock: age, system position, then duration/loop handling
    pub fn tick_clock(&mut self, dt: f32) {
        self.age += dt;

        if let Some((x, y)) = &self.system_position {
            let t = self.curve_time();
            self.position = self.origin + Vec2::new(x.sample(t), y.sample(t));
        }

        if self.system_duration > 0.0 && self.age >= self.system_duration {
            if self.looping {
                self.age = 0.0;
                self.next_spawn_time = 0.0;
                self.total_launched = 0;
            } else {
                self.active = false;
            }
        }
    }

    /// Decide how many particles to launch this tick, committing the counters.
    ///
    /// `room` is how many more particles the system will accept.
    pub fn schedule(&mut self, room: usize) -> usize {
        if !self.active {
            return 0;
        }

        let t = self.curve_time();
        let rate = self.spawn.rate.sample(t);
        let min_active = count(self.spawn.min_active.sample(t));
        let max_active = count(self.spawn.max_active.sample(t));
        let max_launched = count(self.spawn.max_launched.sample(t));
        let active = self.live.len();

        let under_cap = |spawned: usize| max_active == 0 || active + spawned < max_active;

        let mut spawned = 0;
        let exhausted = if rate > 0.0 {
            if self.age - self.next_spawn_time > MAX_SPAWN_BACKLOG {
                self.next_spawn_time = self.age - MAX_SPAWN_BACKLOG;
            }
            while self.age >= self.next_spawn_time
                && under_cap(spawned)
                && (max_launched == 0 || self.total_launched < max_launched)
                && spawned < room
            {
                spawned += 1;
                self.total_launched += 1;
                self.next_spawn_time += 1.0 / rate;
            }
            max_launched > 0 && self.total_launched >= max_launched
        } else {
            let budget = if max_launched > 0 { max_launched } else { min_active };
            while active + spawned < min_active
                && self.total_launched < budget
                && under_cap(spawned)
                && spawned < room
            {
                spawned += 1;
                self.total_launched += 1;
            }
            self.total_launched >= budget
        };

        // A one-shot emitter with no clock of its own ends when its launch budget is spent
        if exhausted && self.system_duration <= 0.0 && !self.looping && self.spawn.is_static() {
            self.active = false;
        }

        spawned
    }

    /// Drop particle IDs that no longer exist
    pub fn prune(&mut self, alive: impl Fn(EntityId) -> bool) {
        self.live.retain(|id| alive(*id));
    }

    /// Ready for removal: inactive with no surviving particles
    pub fn is_finished(&self) -> bool {
        !self.active && self.live.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::EffectDefinition;

    fn emitter(toml: &str) -> Emitter {
        let def: EffectDefinition = toml::from_str(toml).unwrap();
        let effect = Arc::new(Effect::compile(&def));
        Emitter::new(effect, Vec2::ZERO, 0.0, &mut ParticleRng::new(5))
    }

    fn fake_ids(n: usize) -> Vec<EntityId> {
        (0..n as u64).map(|i| EntityId(1000 + i)).collect()
    }

    #[test]
    fn burst_spawns_min_active_once() {
        let mut e = emitter("spawn_min_active = 8\nsystem_duration = 1");
        e.tick_clock(0.01);
        assert_eq!(e.schedule(usize::MAX), 8);
        e.live = fake_ids(8);

        e.tick_clock(0.01);
        assert_eq!(e.schedule(usize::MAX), 0);

        // Burst budget is spent even once the particles die
        e.live.clear();
        e.tick_clock(0.01);
        assert_eq!(e.schedule(usize::MAX), 0);
        assert_eq!(e.total_launched, 8);
    }

    #[test]
    fn sustain_refills_up_to_budget() {
        let mut e = emitter("spawn_min_active = 5\nspawn_max_launched = 20\nsystem_duration = 10");
        let mut launched = 0;
        for _ in 0..50 {
            e.tick_clock(0.01);
            launched += e.schedule(usize::MAX);
            // every particle dies right away
            e.live.clear();
        }
        assert_eq!(launched, 20);
        assert_eq!(e.total_launched, 20);
    }

    #[test]
    fn sustain_respects_max_active() {
        let mut e = emitter("spawn_min_active = 10\nspawn_max_active = 4\nsystem_duration = 1");
        e.tick_clock(0.01);
        assert_eq!(e.schedule(usize::MAX), 4);
    }

    #[test]
    fn continuous_rate_over_time() {
        let mut e = emitter("spawn_rate = 10\nsystem_duration = 5");
        let mut launched = 0;
        for _ in 0..50 {
            e.tick_clock(0.01);
            launched += e.schedule(usize::MAX);
        }
        assert!((4..=6).contains(&launched), "launched {launched}");
    }

    #[test]
    fn continuous_honors_max_launched() {
        let mut e = emitter("spawn_rate = 1000\nspawn_max_launched = 3\nsystem_duration = 5");
        e.tick_clock(0.1);
        assert_eq!(e.schedule(usize::MAX), 3);
        e.tick_clock(0.1);
        assert_eq!(e.schedule(usize::MAX), 0);
    }

    #[test]
    fn backlog_is_bounded() {
        let mut e = emitter("spawn_rate = 2");
        e.tick_clock(100.0);
        let n = e.schedule(usize::MAX);
        assert!(n <= (MAX_SPAWN_BACKLOG * 2.0) as usize + 1, "spawned {n}");
    }

    #[test]
    fn room_limits_spawns_without_spending_budget() {
        let mut e = emitter("spawn_min_active = 8\nsystem_duration = 1");
        e.tick_clock(0.01);
        assert_eq!(e.schedule(3), 3);
        assert_eq!(e.total_launched, 3);
    }

    #[test]
    fn duration_deactivates_exactly_once_past_end() {
        let mut e = emitter("system_duration = 1.0\nspawn_rate = 1");
        e.tick_clock(0.5);
        assert!(e.active);
        e.tick_clock(0.6);
        assert!(!e.active);
    }

    #[test]
    fn looping_emitter_resets_its_clock() {
        let mut e = emitter("system_duration = 1.0\nlooping = true\nspawn_min_active = 2");
        e.tick_clock(0.01);
        assert_eq!(e.schedule(usize::MAX), 2);
        e.tick_clock(1.0);
        assert!(e.active);
        assert_eq!(e.age, 0.0);
        assert_eq!(e.total_launched, 0);
    }

    #[test]
    fn indefinite_burst_ends_when_budget_spent() {
        let mut e = emitter("spawn_min_active = 3");
        e.tick_clock(0.01);
        assert_eq!(e.schedule(usize::MAX), 3);
        assert!(!e.active);
        e.live = fake_ids(3);
        assert!(!e.is_finished());
        e.prune(|_| false);
        assert!(e.is_finished());
    }

    #[test]
    fn system_position_moves_emitter() {
        let mut e = emitter("system_duration = 2\nsystem_position_x = \"0 1,100\"");
        e.tick_clock(1.0);
        assert!((e.position.x - 50.0).abs() < 1e-4);
        assert_eq!(e.origin, Vec2::ZERO);
    }
}
