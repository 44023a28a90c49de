//! Out-of-band notifications from the particle system to the host

use kindle_core::EntityId;
use kindle_runtime::{EventBus, GameEvent};
use std::cell::RefCell;
use std::rc::Rc;

/// Receives emitter lifecycle notifications. Every hook defaults to a no-op.
pub trait EffectSideChannel {
    /// An emitter started. `cue` is the effect's spawn cue, if it has one.
    fn emitter_spawned(&mut self, _emitter: EntityId, _effect: &str, _cue: Option<&str>) {}

    /// An emitter ran out and was removed
    fn emitter_finished(&mut self, _emitter: EntityId) {}
}

impl EffectSideChannel for EventBus {
    fn emitter_spawned(&mut self, emitter: EntityId, effect: &str, cue: Option<&str>) {
        self.push(GameEvent::EmitterSpawned {
            emitter,
            effect: effect.to_string(),
        });
        if let Some(cue) = cue {
            self.push(GameEvent::EffectCue {
                emitter,
                cue: cue.to_string(),
            });
        }
    }

    fn emitter_finished(&mut self, emitter: EntityId) {
        self.push(GameEvent::EmitterFinished { emitter });
    }
}

/// Lets the host keep a handle to a channel it also gave to the system
impl<T: EffectSideChannel> EffectSideChannel for Rc<RefCell<T>> {
    fn emitter_spawned(&mut self, emitter: EntityId, effect: &str, cue: Option<&str>) {
        self.borrow_mut().emitter_spawned(emitter, effect, cue);
    }

    fn emitter_finished(&mut self, emitter: EntityId) {
        self.borrow_mut().emitter_finished(emitter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_records_cue() {
        let mut bus = EventBus::new();
        bus.emitter_spawned(EntityId(3), "boom", Some("sfx_boom"));
        bus.emitter_spawned(EntityId(4), "puff", None);
        bus.emitter_finished(EntityId(3));

        assert_eq!(
            bus.drain(),
            vec![
                GameEvent::EmitterSpawned {
                    emitter: EntityId(3),
                    effect: "boom".into()
                },
                GameEvent::EffectCue {
                    emitter: EntityId(3),
                    cue: "sfx_boom".into()
                },
                GameEvent::EmitterSpawned {
                    emitter: EntityId(4),
                    effect: "puff".into()
                },
                GameEvent::EmitterFinished { emitter: EntityId(3) },
            ]
        );
    }

    #[test]
    fn shared_handle_sees_events() {
        let bus = Rc::new(RefCell::new(EventBus::new()));
        let mut channel = Rc::clone(&bus);
        channel.emitter_finished(EntityId(1));
        assert_eq!(bus.borrow().len(), 1);
    }

    struct Silent;
    impl EffectSideChannel for Silent {}

    #[test]
    fn default_hooks_do_nothing() {
        let mut silent = Silent;
        silent.emitter_spawned(EntityId(1), "x", Some("y"));
        silent.emitter_finished(EntityId(1));
    }
}
