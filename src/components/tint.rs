//! Color tint used to dim the primary frame as chances are consumed.
//!
//! The [`Tint`] value is carried by the [`Playback`](crate::resources::playback::Playback)
//! resource for the primary frame and may also be attached to score indicator
//! entities to colour them. The renderer passes it to raylib in place of
//! `Color::WHITE`.

use bevy_ecs::prelude::Component;
use raylib::prelude::Color;

/// Color tint component for rendering modulation.
#[derive(Component, Clone, Debug, Copy, PartialEq)]
pub struct Tint {
    pub color: Color,
}

impl Tint {
    /// Create a new Tint with the specified RGBA values.
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            color: Color::new(r, g, b, a),
        }
    }

    /// Opaque grey of the given brightness, `0.0` black to `1.0` white.
    pub fn grey(brightness: f32) -> Self {
        let level = (brightness.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(level, level, level, 255)
    }

    /// Grey proportional to the remaining share of a chance budget.
    ///
    /// An empty budget (`total == 0`) has nothing to fade and stays white.
    pub fn faded(remaining: u32, total: u32) -> Self {
        if total == 0 {
            return Self::default();
        }
        Self::grey(remaining as f32 / total as f32)
    }

    /// Brightness of the red channel in `0.0..=1.0`.
    pub fn brightness(&self) -> f32 {
        self.color.r as f32 / 255.0
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
        }
    }
}
