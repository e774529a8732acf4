//! ECS resources made available to systems.
//!
//! Overview
//! - `audio` – bridge and channels for the background audio thread
//! - `audioclock` – track position reported by the audio thread
//! - `debugmode` – presence toggles the debug overlay
//! - `framestore` – texture keys and baked polygons per frame and region
//! - `gameconfig` – window and playback settings from `config.ini`
//! - `gamestate` – authoritative and pending high-level game state
//! - `hotspot` – hotspot controllers and polygon hit testing
//! - `input` – pointer and keys, with the stale-input guard
//! - `playback` – the slice playback engine
//! - `progress` – persistent per-slice completion flags
//! - `rendertarget` – off-screen texture at the frame resolution
//! - `scene` – scene directory layout, manifest and active scene
//! - `screensize` – frame resolution of the active scene
//! - `slicetable` – slice records and their validation
//! - `systemsstore` – registry of dynamically-lookup-able systems by name
//! - `texturestore` – loaded textures keyed by string IDs
//! - `tickclock` – fixed-rate playback tick scheduler
//! - `windowsize` – window dimensions and letterboxing
//! - `worldtime` – elapsed time and frame delta
pub mod audio;
pub mod audioclock;
pub mod debugmode;
pub mod framestore;
pub mod gameconfig;
pub mod gamestate;
pub mod hotspot;
pub mod input;
pub mod playback;
pub mod progress;
pub mod rendertarget;
pub mod scene;
pub mod screensize;
pub mod slicetable;
pub mod systemsstore;
pub mod texturestore;
pub mod tickclock;
pub mod windowsize;
pub mod worldtime;
