//! Effect definitions as authored in TOML
//!
//! ```toml
//! [effects.dirt_clump]
//! system_duration = "0.6"
//! spawn_min_active = 6
//! particle_duration = "[0.5 0.9]"
//! launch_speed = "[120 200]"
//! launch_angle = "[60 120]"
//! particle_alpha = "1 .7,1 1,0"
//! image = "dirt_small"
//!
//! [[effects.dirt_clump.fields]]
//! kind = "acceleration"
//! y = "0.05"
//!
//! [[effects.dirt_clump.fields]]
//! kind = "ground_constraint"
//! y = "[20 40]"
//! ```

use kindle_core::{KindleError, Result};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Accept value-grammar text as a TOML string, integer, or float
fn value_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Int(i) => i.to_string(),
        Raw::Float(f) => f.to_string(),
    }))
}

/// Kind tag of a force field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Acceleration,
    Friction,
    Position,
    Circle,
    Away,
    GroundConstraint,
}

impl FromStr for FieldKind {
    type Err = KindleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "acceleration" => Ok(FieldKind::Acceleration),
            "friction" => Ok(FieldKind::Friction),
            "position" => Ok(FieldKind::Position),
            "circle" => Ok(FieldKind::Circle),
            "away" => Ok(FieldKind::Away),
            "ground_constraint" | "groundconstraint" => Ok(FieldKind::GroundConstraint),
            _ => Err(KindleError::UnknownFieldKind(s.to_string())),
        }
    }
}

/// One force field attached to an effect: kind + per-axis value text
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldDescriptor {
    pub kind: String,
    #[serde(default, deserialize_with = "value_text")]
    pub x: Option<String>,
    #[serde(default, deserialize_with = "value_text")]
    pub y: Option<String>,
}

impl FieldDescriptor {
    pub fn kind(&self) -> Result<FieldKind> {
        self.kind.parse()
    }
}

/// Immutable description of one effect type. Every animatable property is value-grammar text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EffectDefinition {
    /// Filled from the table key when loaded through [`EffectFile`]
    pub name: String,

    // Emitter lifecycle
    #[serde(deserialize_with = "value_text")]
    pub system_duration: Option<String>,
    pub looping: bool,
    #[serde(deserialize_with = "value_text")]
    pub spawn_rate: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub spawn_min_active: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub spawn_max_active: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub spawn_max_launched: Option<String>,

    // Spawn region and emitter motion
    #[serde(deserialize_with = "value_text")]
    pub emitter_offset_x: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub emitter_offset_y: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub emitter_box_x: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub emitter_box_y: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub emitter_radius: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub system_position_x: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub system_position_y: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub system_alpha: Option<String>,

    // Launch
    #[serde(deserialize_with = "value_text")]
    pub particle_duration: Option<String>,
    pub particle_loops: bool,
    #[serde(deserialize_with = "value_text")]
    pub launch_speed: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub launch_angle: Option<String>,

    // Appearance over particle age
    #[serde(deserialize_with = "value_text")]
    pub particle_scale: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub particle_alpha: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub particle_red: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub particle_green: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub particle_blue: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub particle_brightness: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub particle_spin_angle: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub particle_spin_speed: Option<String>,

    // Ground collision
    #[serde(deserialize_with = "value_text")]
    pub collision_reflect_x: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub collision_reflect_y: Option<String>,
    #[serde(deserialize_with = "value_text")]
    pub collision_spin: Option<String>,

    // Sprite
    pub image: Option<String>,
    pub image_frames: Option<u32>,
    pub image_row: Option<u32>,
    pub animated: bool,
    #[serde(deserialize_with = "value_text")]
    pub animation_rate: Option<String>,
    pub random_start_frame: bool,

    /// Out-of-band cue forwarded to the side channel when an emitter starts
    pub spawn_cue: Option<String>,

    pub fields: Vec<FieldDescriptor>,
}

impl EffectDefinition {
    /// Every value-grammar property by name, including field axes
    pub fn value_texts(&self) -> Vec<(String, &str)> {
        let named: [(&str, &Option<String>); 28] = [
            ("system_duration", &self.system_duration),
            ("spawn_rate", &self.spawn_rate),
            ("spawn_min_active", &self.spawn_min_active),
            ("spawn_max_active", &self.spawn_max_active),
            ("spawn_max_launched", &self.spawn_max_launched),
            ("emitter_offset_x", &self.emitter_offset_x),
            ("emitter_offset_y", &self.emitter_offset_y),
            ("emitter_box_x", &self.emitter_box_x),
            ("emitter_box_y", &self.emitter_box_y),
            ("emitter_radius", &self.emitter_radius),
            ("system_position_x", &self.system_position_x),
            ("system_position_y", &self.system_position_y),
            ("system_alpha", &self.system_alpha),
            ("particle_duration", &self.particle_duration),
            ("launch_speed", &self.launch_speed),
            ("launch_angle", &self.launch_angle),
            ("particle_scale", &self.particle_scale),
            ("particle_alpha", &self.particle_alpha),
            ("particle_red", &self.particle_red),
            ("particle_green", &self.particle_green),
            ("particle_blue", &self.particle_blue),
            ("particle_brightness", &self.particle_brightness),
            ("particle_spin_angle", &self.particle_spin_angle),
            ("particle_spin_speed", &self.particle_spin_speed),
            ("collision_reflect_x", &self.collision_reflect_x),
            ("collision_reflect_y", &self.collision_reflect_y),
            ("collision_spin", &self.collision_spin),
            ("animation_rate", &self.animation_rate),
        ];

        let mut texts: Vec<(String, &str)> = named
            .into_iter()
            .filter_map(|(name, text)| text.as_deref().map(|t| (name.to_string(), t)))
            .collect();

        for (i, field) in self.fields.iter().enumerate() {
            if let Some(x) = field.x.as_deref() {
                texts.push((format!("fields[{i}].x"), x));
            }
            if let Some(y) = field.y.as_deref() {
                texts.push((format!("fields[{i}].y"), y));
            }
        }
        texts
    }

    /// Every malformed property, with the reason it failed to parse
    pub fn problems(&self) -> Vec<(String, KindleError)> {
        let mut problems: Vec<(String, KindleError)> = self
            .value_texts()
            .into_iter()
            .filter_map(|(name, text)| {
                crate::value::try_parse_value(text)
                    .err()
                    .map(|err| (name, err))
            })
            .collect();

        for (i, field) in self.fields.iter().enumerate() {
            if let Err(err) = field.kind() {
                problems.push((format!("fields[{i}].kind"), err));
            }
        }
        problems
    }
}

/// A TOML document holding effect definitions keyed by name
#[derive(Debug, Default, Deserialize)]
pub struct EffectFile {
    #[serde(default)]
    pub effects: BTreeMap<String, EffectDefinition>,
}

impl EffectFile {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let mut file: EffectFile = toml::from_str(source)?;
        for (name, definition) in &mut file.effects {
            definition.name = name.clone();
        }
        Ok(file)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
