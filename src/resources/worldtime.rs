use bevy_ecs::prelude::Resource;

/// Longest frame delta accepted, in seconds. Anything above (window drag,
/// breakpoint, suspended laptop) is treated as this long.
pub const MAX_FRAME_DELTA: f32 = 0.25;

#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct WorldTime {
    /// Seconds since the player started.
    pub elapsed: f32,
    /// Duration of the last frame in seconds.
    pub delta: f32,
    /// Frames rendered so far.
    pub frame_count: u64,
}
