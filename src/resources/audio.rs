//! Bridge between the ECS world and the audio thread.
//!
//! [`setup_audio`] spawns the thread that owns the scene track and inserts
//! the [`AudioBridge`] together with the `Messages<AudioCmd>` and
//! `Messages<AudioMessage>` queues. [`shutdown_audio`] stops and joins it.
//! When the thread cannot be spawned the player keeps running silently:
//! commands are dropped and no position is ever reported.

use std::thread::JoinHandle;

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::systems::audio::audio_thread;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{error, info};

#[derive(Resource)]
pub struct AudioBridge {
    /// ECS -> audio thread.
    pub tx_cmd: Sender<AudioCmd>,
    /// Audio thread -> ECS.
    pub rx_msg: Receiver<AudioMessage>,
    handle: Option<JoinHandle<()>>,
}

/// Spawn the audio thread and register bridge resources.
pub fn setup_audio(world: &mut World) {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = match std::thread::Builder::new()
        .name("flipbook-audio".into())
        .spawn(move || audio_thread(rx_cmd, tx_msg))
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!("Failed to spawn audio thread, playing silent: {}", e);
            None
        }
    };

    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
    world.init_resource::<Messages<AudioMessage>>();
    world.init_resource::<Messages<AudioCmd>>();
}

/// Ask the audio thread to stop and wait for it.
pub fn shutdown_audio(world: &mut World) {
    let Some(bridge) = world.remove_resource::<AudioBridge>() else {
        return;
    };
    // the thread may already be gone
    let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
    match bridge.handle.map(JoinHandle::join) {
        Some(Err(_)) => error!("Audio thread panicked"),
        Some(Ok(())) => info!("Audio thread stopped"),
        None => {}
    }
}
