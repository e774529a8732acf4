//! Time update system.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per frame, before the schedule runs.
use bevy_ecs::prelude::*;

use crate::resources::worldtime::{MAX_FRAME_DELTA, WorldTime};

/// Update elapsed and delta seconds on the `WorldTime` resource.
///
/// `dt` is the raw frame delta in seconds, clamped to `0..=MAX_FRAME_DELTA`.
pub fn update_world_time(world: &mut World, dt: f32) {
    let mut wt = world.resource_mut::<WorldTime>();
    let dt = dt.clamp(0.0, MAX_FRAME_DELTA);
    wt.elapsed += dt;
    wt.delta = dt;
    wt.frame_count += 1;
}
