//! Debug toggle resource.
//!
//! The mere presence of this resource enables the debug overlay: hotspot
//! polygon outlines and the playback cursor printed over the frame.

use bevy_ecs::prelude::Resource;

/// Marker resource: when present, the renderer draws the debug overlay.
#[derive(Resource, Clone, Copy)]
pub struct DebugMode {}
