//! Compiled effects: definitions with every value text parsed once

use crate::definition::{EffectDefinition, EffectFile, FieldKind};
use crate::value::ValueSpec;
use kindle_core::{KindleError, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Authored keyframe times on indefinite emitters are in hundredths of a second
pub const KEYFRAME_TICK: f32 = 0.01;

/// A field template: the kind plus its unresolved per-axis values
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTemplate {
    pub kind: FieldKind,
    pub x: ValueSpec,
    pub y: ValueSpec,
    /// Whether the axis text was authored at all (position fields leave unset axes still)
    pub has_x: bool,
    pub has_y: bool,
}

/// An effect type ready to launch: shared read-only by every emitter spawned from it
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub name: String,

    pub system_duration: ValueSpec,
    pub looping: bool,
    pub spawn_rate: ValueSpec,
    pub spawn_min_active: ValueSpec,
    pub spawn_max_active: ValueSpec,
    pub spawn_max_launched: ValueSpec,

    pub emitter_offset_x: ValueSpec,
    pub emitter_offset_y: ValueSpec,
    pub emitter_box_x: ValueSpec,
    pub emitter_box_y: ValueSpec,
    pub emitter_radius: ValueSpec,
    pub system_position: Option<(ValueSpec, ValueSpec)>,
    pub system_alpha: Option<ValueSpec>,

    pub particle_duration: ValueSpec,
    pub particle_loops: bool,
    pub launch_speed: ValueSpec,
    pub launch_angle: ValueSpec,

    pub particle_scale: ValueSpec,
    pub particle_alpha: ValueSpec,
    pub particle_red: ValueSpec,
    pub particle_green: ValueSpec,
    pub particle_blue: ValueSpec,
    pub particle_brightness: ValueSpec,
    pub particle_spin_angle: ValueSpec,
    pub particle_spin_speed: ValueSpec,

    pub collision_reflect_x: ValueSpec,
    pub collision_reflect_y: ValueSpec,
    pub collision_spin: ValueSpec,

    pub fields: Vec<FieldTemplate>,

    pub image: Option<String>,
    pub image_frames: Option<u32>,
    pub image_row: Option<u32>,
    pub animated: bool,
    /// Frames per second; `None` spreads the frames over the particle lifetime
    pub animation_rate: Option<f32>,
    pub random_start_frame: bool,
    pub spawn_cue: Option<String>,
}

fn spec_or(text: &Option<String>, default: f32) -> ValueSpec {
    text.as_deref()
        .map(ValueSpec::parse)
        .unwrap_or(ValueSpec::Constant(default))
}

impl Effect {
    /// Compile a definition. Malformed values fall back to 0 and unknown field kinds are skipped.
    pub fn compile(def: &EffectDefinition) -> Self {
        let system_duration = spec_or(&def.system_duration, 0.0);
        let indefinite = system_duration.bounds().1 <= 0.0;

        // Emitter-time tracks: normalized over the duration, or seconds when indefinite
        let emitter_track = |text: &Option<String>, default: f32| {
            let mut spec = spec_or(text, default);
            if indefinite {
                spec.scale_times(KEYFRAME_TICK);
            }
            spec
        };

        let system_position = match (&def.system_position_x, &def.system_position_y) {
            (None, None) => None,
            (x, y) => Some((emitter_track(x, 0.0), emitter_track(y, 0.0))),
        };
        let system_alpha = def.system_alpha.as_ref().map(|_| emitter_track(&def.system_alpha, 1.0));

        let fields = def
            .fields
            .iter()
            .filter_map(|field| match field.kind() {
                Ok(kind) => Some(FieldTemplate {
                    kind,
                    x: spec_or(&field.x, 0.0),
                    y: spec_or(&field.y, 0.0),
                    has_x: field.x.is_some(),
                    has_y: field.y.is_some(),
                }),
                Err(err) => {
                    tracing::warn!(effect = %def.name, "{err}; field skipped");
                    None
                }
            })
            .collect();

        let animation_rate = def
            .animation_rate
            .as_deref()
            .map(|text| ValueSpec::parse(text).bounds().1)
            .filter(|fps| *fps > 0.0);

        Self {
            name: def.name.clone(),
            looping: def.looping,
            spawn_rate: emitter_track(&def.spawn_rate, 0.0),
            spawn_min_active: emitter_track(&def.spawn_min_active, 0.0),
            spawn_max_active: emitter_track(&def.spawn_max_active, 0.0),
            spawn_max_launched: emitter_track(&def.spawn_max_launched, 0.0),
            emitter_offset_x: emitter_track(&def.emitter_offset_x, 0.0),
            emitter_offset_y: emitter_track(&def.emitter_offset_y, 0.0),
            emitter_box_x: emitter_track(&def.emitter_box_x, 0.0),
            emitter_box_y: emitter_track(&def.emitter_box_y, 0.0),
            emitter_radius: emitter_track(&def.emitter_radius, 0.0),
            system_position,
            system_alpha,
            particle_duration: emitter_track(&def.particle_duration, 1.0),
            particle_loops: def.particle_loops,
            launch_speed: emitter_track(&def.launch_speed, 0.0),
            launch_angle: emitter_track(&def.launch_angle, 0.0),
            particle_scale: spec_or(&def.particle_scale, 1.0),
            particle_alpha: spec_or(&def.particle_alpha, 1.0),
            particle_red: spec_or(&def.particle_red, 1.0),
            particle_green: spec_or(&def.particle_green, 1.0),
            particle_blue: spec_or(&def.particle_blue, 1.0),
            particle_brightness: spec_or(&def.particle_brightness, 1.0),
            particle_spin_angle: spec_or(&def.particle_spin_angle, 0.0),
            particle_spin_speed: spec_or(&def.particle_spin_speed, 0.0),
            collision_reflect_x: spec_or(&def.collision_reflect_x, 0.0),
            collision_reflect_y: spec_or(&def.collision_reflect_y, 0.0),
            collision_spin: spec_or(&def.collision_spin, 0.0),
            fields,
            image: def.image.clone(),
            image_frames: def.image_frames,
            image_row: def.image_row,
            animated: def.animated,
            animation_rate,
            random_start_frame: def.random_start_frame,
            spawn_cue: def.spawn_cue.clone(),
            system_duration,
        }
    }

    /// Compile a definition from a single TOML table body
    pub fn from_toml_str(name: &str, source: &str) -> Result<Self> {
        let mut def: EffectDefinition = toml::from_str(source)?;
        def.name = name.to_string();
        Ok(Self::compile(&def))
    }

    /// Whether the emitter runs until explicitly stopped
    pub fn is_indefinite(&self) -> bool {
        self.system_duration.bounds().1 <= 0.0
    }

    /// Latest keyframe time across the spawn-parameter tracks
    pub fn spawn_last_key_time(&self) -> Option<f32> {
        [
            &self.spawn_rate,
            &self.spawn_min_active,
            &self.spawn_max_active,
            &self.spawn_max_launched,
        ]
        .into_iter()
        .filter_map(ValueSpec::last_key_time)
        .reduce(f32::max)
    }
}

/// All compiled effects from one or more effect files, by name
#[derive(Debug, Default, Clone)]
pub struct EffectLibrary {
    effects: BTreeMap<String, Arc<Effect>>,
}

impl EffectLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(file: &EffectFile) -> Self {
        let mut library = Self::new();
        library.extend(file);
        library
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(Self::from_file(&EffectFile::from_toml_str(source)?))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = EffectFile::load(path)?;
        tracing::info!(path = %path.display(), count = file.effects.len(), "loaded effects");
        Ok(Self::from_file(&file))
    }

    /// Add every definition in `file`, replacing effects with the same name
    pub fn extend(&mut self, file: &EffectFile) {
        for (name, def) in &file.effects {
            self.insert(name.clone(), Effect::compile(def));
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, effect: Effect) -> Arc<Effect> {
        let effect = Arc::new(effect);
        self.effects.insert(name.into(), Arc::clone(&effect));
        effect
    }

    pub fn get(&self, name: &str) -> Option<Arc<Effect>> {
        self.effects.get(name).cloned()
    }

    pub fn require(&self, name: &str) -> Result<Arc<Effect>> {
        self.get(name)
            .ok_or_else(|| KindleError::EffectNotFound(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_for_unset_properties() {
        let effect = Effect::compile(&EffectDefinition::default());
        assert_eq!(effect.particle_duration, ValueSpec::Constant(1.0));
        assert_eq!(effect.particle_scale, ValueSpec::Constant(1.0));
        assert_eq!(effect.spawn_rate, ValueSpec::Constant(0.0));
        assert!(effect.system_position.is_none());
        assert!(effect.system_alpha.is_none());
        assert!(effect.is_indefinite());
    }

    #[test]
    fn indefinite_emitter_tracks_use_centiseconds() {
        let effect = Effect::from_toml_str("smoke", r#"spawn_rate = "0,10 200,0""#).unwrap();
        assert!(effect.is_indefinite());
        let last = effect.spawn_rate.last_key_time().unwrap();
        assert!((last - 2.0).abs() < 1e-5);
    }

    #[test]
    fn finite_emitter_tracks_stay_normalized() {
        let effect = Effect::from_toml_str(
            "puff",
            r#"
system_duration = 2
spawn_rate = "0,10 1,0"
"#,
        )
        .unwrap();
        assert!(!effect.is_indefinite());
        assert_eq!(effect.spawn_last_key_time(), Some(1.0));
    }

    #[test]
    fn particle_age_tracks_are_never_converted() {
        let effect = Effect::from_toml_str("fade", r#"particle_alpha = "1 1,0""#).unwrap();
        assert_eq!(effect.particle_alpha.last_key_time(), Some(1.0));
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let effect = Effect::from_toml_str(
            "odd",
            r#"
[[fields]]
kind = "wobble"

[[fields]]
kind = "friction"
x = "0.02"
"#,
        )
        .unwrap();
        assert_eq!(effect.fields.len(), 1);
        assert_eq!(effect.fields[0].kind, FieldKind::Friction);
        assert!(effect.fields[0].has_x);
        assert!(!effect.fields[0].has_y);
    }

    #[test]
    fn library_lookup() {
        let library = EffectLibrary::from_toml_str(
            r#"
[effects.a]
spawn_min_active = 1

[effects.b]
spawn_rate = 5
"#,
        )
        .unwrap();
        assert_eq!(library.len(), 2);
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(library.require("b").unwrap().name, "b");
        assert!(matches!(
            library.require("c"),
            Err(KindleError::EffectNotFound(_))
        ));
    }
}
