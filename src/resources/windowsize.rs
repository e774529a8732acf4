//! Window size resource.
//!
//! Tracks the actual window dimensions in pixels, which usually differ from
//! the frame resolution of the scene. Updated each frame to handle resizing.

use bevy_ecs::prelude::Resource;
use raylib::prelude::*;

/// Current window size in pixels.
///
/// Frames are scaled into the window with letterbox/pillarbox bars so their
/// aspect ratio is kept. Pointer positions go the opposite way through
/// [`WindowSize::window_to_game_pos`].
#[derive(Resource, Clone, Copy, Debug)]
pub struct WindowSize {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl WindowSize {
    /// Destination rectangle of a `game_width x game_height` image drawn
    /// centered in the window with its aspect ratio kept.
    pub fn calculate_letterbox(&self, game_width: u32, game_height: u32) -> Rectangle {
        let game_w = game_width.max(1) as f32;
        let game_h = game_height.max(1) as f32;
        let window_w = self.w.max(1) as f32;
        let window_h = self.h.max(1) as f32;

        let game_aspect = game_w / game_h;
        let window_aspect = window_w / window_h;

        if window_aspect > game_aspect {
            // wider than the frame: bars on the sides
            let scale = window_h / game_h;
            let scaled_w = game_w * scale;
            Rectangle {
                x: (window_w - scaled_w) / 2.0,
                y: 0.0,
                width: scaled_w,
                height: window_h,
            }
        } else {
            // taller than the frame: bars top and bottom
            let scale = window_w / game_w;
            let scaled_h = game_h * scale;
            Rectangle {
                x: 0.0,
                y: (window_h - scaled_h) / 2.0,
                width: window_w,
                height: scaled_h,
            }
        }
    }

    /// Transform a window-space position to frame space.
    ///
    /// Positions inside the bars are clamped to the frame bounds.
    pub fn window_to_game_pos(
        &self,
        window_pos: Vector2,
        game_width: u32,
        game_height: u32,
    ) -> Vector2 {
        let letterbox = self.calculate_letterbox(game_width, game_height);
        let game_w = game_width.max(1) as f32;
        let game_h = game_height.max(1) as f32;

        let relative_x = window_pos.x - letterbox.x;
        let relative_y = window_pos.y - letterbox.y;

        let scale_x = game_w / letterbox.width;
        let scale_y = game_h / letterbox.height;

        Vector2 {
            x: (relative_x * scale_x).clamp(0.0, game_w),
            y: (relative_y * scale_y).clamp(0.0, game_h),
        }
    }
}
