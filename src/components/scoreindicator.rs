//! On-screen score gauge bound to one hotspot region.
//!
//! Indicator entities are spawned at scene load from the manifest's
//! indicator placements. Each frame
//! [`score_indicator_system`](crate::systems::scoreindicator::score_indicator_system)
//! copies the region's score into `fill`; the renderer draws a circle whose
//! filled sector grows with it.

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

#[derive(Component, Clone, Debug, PartialEq)]
pub struct ScoreIndicator {
    /// Hotspot region this gauge mirrors.
    pub region: usize,
    /// Center in frame space.
    pub center: Vector2,
    pub radius: f32,
    /// Current score, `0.0..=1.0`.
    pub fill: f32,
    /// Hidden on slices that do not show a score.
    pub visible: bool,
}

impl ScoreIndicator {
    pub fn new(region: usize, center: Vector2, radius: f32) -> Self {
        Self {
            region,
            center,
            radius,
            fill: 0.0,
            visible: false,
        }
    }

    /// End angle in degrees of the filled sector, starting from 12 o'clock.
    pub fn sweep_degrees(&self) -> f32 {
        self.fill.clamp(0.0, 1.0) * 360.0
    }
}
