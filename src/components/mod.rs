//! ECS components for entities.
//!
//! Most of the player's state lives in resources; entities are only used for
//! what is drawn on top of the frame and for the engine's own bookkeeping.
//!
//! Submodules overview:
//! - [`persistent`] – marker for entities that persist across scene changes
//! - [`scoreindicator`] – on-screen score gauge bound to a hotspot region
//! - [`tint`] – color modulation (loop fade, indicator color)

pub mod persistent;
pub mod scoreindicator;
pub mod tint;
