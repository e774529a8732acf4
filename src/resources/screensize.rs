//! Frame resolution resource.
//!
//! Size in pixels of the primary frames of the loaded scene. Pointer input,
//! hotspot polygons and score indicators all live in this frame space; the
//! renderer scales it into the window with a letterbox.

use bevy_ecs::prelude::Resource;

/// Frame size in pixels.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenSize {
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}
