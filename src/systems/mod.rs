//! Player systems.
//!
//! Submodules overview
//! - [`audio`] – bridge with the audio thread and the audio clock
//! - [`gameconfig`] – apply window settings when the configuration changes
//! - [`gamestate`] – check for pending state transitions and trigger events
//! - [`input`] – read hardware input and update [`crate::resources::input::InputState`]
//! - [`playback`] – schedule and run playback ticks, apply their effects
//! - [`render`] – draw the frame, indicators and debug overlay using Raylib
//! - [`scoreindicator`] – mirror hotspot scores into indicator entities
//! - [`time`] – update elapsed time and frame delta

pub mod audio;
pub mod gameconfig;
pub mod gamestate;
pub mod input;
pub mod playback;
pub mod render;
pub mod scoreindicator;
pub mod time;
