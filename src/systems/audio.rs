//! Audio playback backed by a dedicated thread and Raylib.
//!
//! - [`audio_thread`] runs on its own OS thread, owns the Raylib audio device
//!   and the scene track, and processes
//!   [`AudioCmd`](crate::events::audio::AudioCmd) messages, answering with
//!   [`AudioMessage`](crate::events::audio::AudioMessage)s. While a track
//!   plays it also reports the stream position a few times per second.
//! - [`forward_audio_cmds`] / [`poll_audio_messages`] move messages between
//!   the ECS message queues and the thread's channels.
//! - [`update_audio_clock`] feeds those reports into the
//!   [`AudioClock`](crate::resources::audioclock::AudioClock) used to keep
//!   playback ticks in line with the sound.
//!
//! Raylib audio calls stay on the audio thread; the main thread only talks to
//! it through lock-free channels.

use std::time::{Duration, Instant};

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audio::AudioBridge;
use crate::resources::audioclock::AudioClock;
use crate::resources::scene::CurrentScene;
use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use raylib::core::audio::{Music, RaylibAudio};
use rustc_hash::{FxHashMap, FxHashSet};

const POSITION_REPORT_INTERVAL: Duration = Duration::from_millis(50);

/// Drain pending messages from the audio thread into the ECS
/// [`Messages<AudioMessage>`] mailbox.
pub fn poll_audio_messages(bridge: Res<AudioBridge>, mut writer: MessageWriter<AudioMessage>) {
    writer.write_batch(bridge.rx_msg.try_iter());
}

/// Advance the ECS message queue for [`AudioMessage`].
pub fn update_bevy_audio_messages(mut msgs: ResMut<Messages<AudioMessage>>) {
    msgs.update();
}

/// Forward ECS [`AudioCmd`] messages to the audio thread.
pub fn forward_audio_cmds(bridge: Res<AudioBridge>, mut reader: MessageReader<AudioCmd>) {
    for cmd in reader.read() {
        // ignore send errors once the thread is gone
        let _ = bridge.tx_cmd.send(cmd.clone());
    }
}

/// Advance the ECS message queue for [`AudioCmd`].
pub fn update_bevy_audio_cmds(mut msgs: ResMut<Messages<AudioCmd>>) {
    msgs.update();
}

/// Track the position of the current scene's music in [`AudioClock`].
pub fn update_audio_clock(
    mut reader: MessageReader<AudioMessage>,
    mut clock: ResMut<AudioClock>,
    scene: Option<Res<CurrentScene>>,
) {
    let current = scene.as_ref().and_then(|s| s.music_id.clone());
    let is_current = |id: &String| current.as_ref() == Some(id);
    for msg in reader.read() {
        match msg {
            AudioMessage::MusicSeeked { id, seconds } if is_current(id) => {
                clock.on_seeked(*seconds);
            }
            AudioMessage::MusicPosition { id, seconds } if is_current(id) => {
                clock.on_position(*seconds);
            }
            AudioMessage::MusicLoadFailed { id, error } => {
                warn!("Music '{}' failed to load ({}), playing silent", id, error);
                if is_current(id) {
                    clock.clear();
                }
            }
            AudioMessage::MusicStopped { id } | AudioMessage::MusicFinished { id }
                if is_current(id) =>
            {
                clock.clear();
            }
            AudioMessage::MusicUnloadedAll => clock.clear(),
            _ => {}
        }
    }
}

/// Entry point of the dedicated audio thread.
///
/// Blocks until [`AudioCmd::Shutdown`] is received. If the audio device cannot
/// be opened the thread logs the failure and exits; commands sent afterwards
/// are dropped and playback runs without sound.
pub fn audio_thread(rx_cmd: Receiver<AudioCmd>, tx_msg: Sender<AudioMessage>) {
    let audio = match RaylibAudio::init_audio_device() {
        Ok(device) => device,
        Err(e) => {
            error!("Failed to initialize audio device: {}", e);
            return;
        }
    };

    info!(
        "[audio] thread starting (id={:?})",
        std::thread::current().id()
    );

    let mut musics: FxHashMap<String, Music> = FxHashMap::default();
    let mut playing: FxHashSet<String> = FxHashSet::default();
    let mut last_report = Instant::now();

    'run: loop {
        // 1) Drain commands
        for cmd in rx_cmd.try_iter() {
            match cmd {
                AudioCmd::LoadMusic { id, path } => match audio.new_music(&path) {
                    Ok(mut music) => {
                        // positions must not wrap back to zero
                        music.looping = false;
                        debug!("[audio] loaded id='{}' path='{}'", id, path);
                        musics.insert(id.clone(), music);
                        let _ = tx_msg.send(AudioMessage::MusicLoaded { id });
                    }
                    Err(e) => {
                        warn!(
                            "[audio] load failed id='{}' path='{}' error='{}'",
                            id, path, e
                        );
                        let _ = tx_msg.send(AudioMessage::MusicLoadFailed {
                            id,
                            error: e.to_string(),
                        });
                    }
                },
                AudioCmd::PlayMusic { id } => {
                    if let Some(music) = musics.get(&id) {
                        debug!("[audio] play start id='{}'", id);
                        music.play_stream();
                        playing.insert(id.clone());
                        let _ = tx_msg.send(AudioMessage::MusicPlayStarted { id });
                    }
                }
                AudioCmd::SeekMusic { id, seconds } => {
                    if let Some(music) = musics.get(&id) {
                        let seconds = seconds.clamp(0.0, music.get_time_length());
                        debug!("[audio] seek id='{}' to {:.3}s", id, seconds);
                        music.seek_stream(seconds);
                        let _ = tx_msg.send(AudioMessage::MusicSeeked { id, seconds });
                    }
                }
                AudioCmd::StopMusic { id } => {
                    if let Some(music) = musics.get(&id) {
                        debug!("[audio] stop id='{}'", id);
                        music.stop_stream();
                        playing.remove(&id);
                        let _ = tx_msg.send(AudioMessage::MusicStopped { id });
                    }
                }
                AudioCmd::UnloadAllMusic => {
                    debug!("[audio] unload all");
                    musics.clear();
                    playing.clear();
                    let _ = tx_msg.send(AudioMessage::MusicUnloadedAll);
                }
                AudioCmd::Shutdown => {
                    info!("[audio] shutdown requested");
                    musics.clear();
                    playing.clear();
                    let _ = tx_msg.send(AudioMessage::MusicUnloadedAll);
                    break 'run;
                }
            }
        }

        // 2) Pump streaming, detect ends and report positions
        let report = last_report.elapsed() >= POSITION_REPORT_INTERVAL;
        let mut ended: Vec<String> = Vec::new();
        for id in playing.iter() {
            let Some(music) = musics.get(id) else {
                continue;
            };
            if music.is_stream_playing() {
                music.update_stream();
                if report {
                    let _ = tx_msg.send(AudioMessage::MusicPosition {
                        id: id.clone(),
                        seconds: music.get_time_played(),
                    });
                }
            } else if music.get_time_played() >= music.get_time_length() - 0.01 {
                ended.push(id.clone());
            }
        }
        if report {
            last_report = Instant::now();
        }
        for id in ended {
            debug!("[audio] finished id='{}'", id);
            playing.remove(&id);
            let _ = tx_msg.send(AudioMessage::MusicFinished { id });
        }

        std::thread::sleep(Duration::from_millis(10));
    } // 'run

    info!(
        "[audio] thread exiting (id={:?})",
        std::thread::current().id()
    );
}
