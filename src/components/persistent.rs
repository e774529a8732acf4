//! Marker for entities that outlive a scene.
//!
//! `leave_scene` despawns every entity without [`Persistent`]. The observers
//! and the registered state hooks are entities too, so they carry it.

use bevy_ecs::prelude::Component;

#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Persistent;
