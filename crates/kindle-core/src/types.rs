//! Common value types

use serde::{Deserialize, Serialize};

/// RGBA color with components in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Scale the RGB channels by `brightness`, clamping to [0, 1]. Alpha is untouched.
    pub fn brightened(&self, brightness: f32) -> Self {
        Self {
            r: (self.r * brightness).clamp(0.0, 1.0),
            g: (self.g * brightness).clamp(0.0, 1.0),
            b: (self.b * brightness).clamp(0.0, 1.0),
            a: self.a,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
