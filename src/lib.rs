//! Flipbook player library.
//!
//! Exposes the player's ECS components, resources, systems and events, the
//! scene hooks and the authoring tools for use in integration tests.

pub mod authoring;
pub mod components;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
