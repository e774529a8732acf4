//! Game configuration change detection system.
//!
//! Applies [`GameConfig`] window settings when the resource is inserted or
//! modified.

use crate::resources::gameconfig::GameConfig;
use bevy_ecs::prelude::*;
use log::{debug, info};
use raylib::ffi;

/// Apply vsync and the target FPS whenever [`GameConfig`] changes.
pub fn apply_gameconfig_changes(
    maybe_config: Option<Res<GameConfig>>,
    mut rl: NonSendMut<raylib::RaylibHandle>,
) {
    let Some(config) = maybe_config else {
        return;
    };
    if !config.is_changed() {
        return;
    }

    unsafe {
        if config.vsync {
            ffi::SetWindowState(ffi::ConfigFlags::FLAG_VSYNC_HINT as u32);
        } else {
            ffi::ClearWindowState(ffi::ConfigFlags::FLAG_VSYNC_HINT as u32);
        }
    }
    debug!("VSync {}", if config.vsync { "enabled" } else { "disabled" });

    rl.set_target_fps(config.target_fps);
    info!("GameConfig changes applied (target fps {})", config.target_fps);
}
