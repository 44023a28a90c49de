//! Queue of events produced during a tick

use crate::event::GameEvent;
use kindle_core::EntityId;

/// Events pushed by systems and drained by game code after the frame
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take only the effect cues, leaving other events queued
    pub fn take_cues(&mut self) -> Vec<(EntityId, String)> {
        let (cues, rest): (Vec<_>, Vec<_>) = self
            .drain()
            .into_iter()
            .partition(|event| matches!(event, GameEvent::EffectCue { .. }));
        self.events = rest;

        cues.into_iter()
            .filter_map(|event| match event {
                GameEvent::EffectCue { emitter, cue } => Some((emitter, cue)),
                _ => None,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
