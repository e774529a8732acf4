//! Event types and observers used by the player.
//!
//! Submodules:
//! - [`audio`] – commands and messages for the background audio thread
//! - [`gamestate`] – state transition notifications for the high-level game flow
//! - [`playback`] – slice entries and the end of a scene
//! - [`switchdebug`] – toggle the debug overlay on/off
pub mod audio;
pub mod gamestate;
pub mod playback;
pub mod switchdebug;
