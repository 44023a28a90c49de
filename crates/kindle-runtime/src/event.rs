//! Events broadcast by runtime systems

use kindle_core::EntityId;

/// An event produced during a tick and drained by game code
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// An emitter was created for the named effect
    EmitterSpawned { emitter: EntityId, effect: String },
    /// An effect asked for an out-of-band cue (e.g. a sound) when it started
    EffectCue { emitter: EntityId, cue: String },
    /// An emitter finished and removed itself
    EmitterFinished { emitter: EntityId },
}
