//! Playback systems.
//!
//! - [`advance_tick_clock`] turns the frame delta into whole playback ticks and
//!   nudges the schedule back in line with the audio position.
//! - [`playback_system`] runs the due ticks on the [`Playback`] cursor and
//!   applies the resulting [`PlaybackEffect`]s to the rest of the world: audio
//!   seeks go to the audio thread, completed slices to the progress store,
//!   slice entries and the end of the scene become observer events.
use bevy_ecs::prelude::*;
use log::trace;

use crate::events::audio::AudioCmd;
use crate::events::playback::{FlipbookFinishedEvent, SliceEnteredEvent};
use crate::resources::audioclock::AudioClock;
use crate::resources::framestore::FrameStore;
use crate::resources::input::InputState;
use crate::resources::playback::{Playback, PlaybackEffect};
use crate::resources::progress::ProgressStore;
use crate::resources::scene::CurrentScene;
use crate::resources::slicetable::SliceTable;
use crate::resources::tickclock::TickClock;
use crate::resources::worldtime::WorldTime;

/// Schedule the ticks covered by this frame's delta.
pub fn advance_tick_clock(
    time: Res<WorldTime>,
    audio_clock: Res<AudioClock>,
    playback: Option<Res<Playback>>,
    clock: Option<ResMut<TickClock>>,
) {
    let (Some(playback), Some(mut clock)) = (playback, clock) else {
        return;
    };
    if playback.finished {
        return;
    }
    clock.advance(time.delta);
    if let Some(audio_seconds) = audio_clock.current_time() {
        clock.resync(audio_seconds, playback.position_seconds());
    }
}

/// Apply the side effects of a playback step.
pub fn apply_playback_effects(
    effects: Vec<PlaybackEffect>,
    commands: &mut Commands,
    scene: &CurrentScene,
    progress: &mut ProgressStore,
    audio_clock: &mut AudioClock,
    audio_cmds: &mut MessageWriter<AudioCmd>,
) {
    for effect in effects {
        match effect {
            PlaybackEffect::SeekAudio { seconds } => {
                if let Some(id) = scene.music_id.as_ref() {
                    audio_cmds.write(AudioCmd::SeekMusic {
                        id: id.clone(),
                        seconds,
                    });
                    audio_clock.begin_seek();
                }
            }
            PlaybackEffect::SliceCompleted { name } => progress.set_flag(name, true),
            PlaybackEffect::SliceEntered { index } => {
                commands.trigger(SliceEnteredEvent { index });
            }
            PlaybackEffect::Finished => {
                commands.trigger(FlipbookFinishedEvent {
                    loads_to: scene.loads_to.clone(),
                });
            }
        }
    }
}

/// Run every due playback tick.
#[allow(clippy::too_many_arguments)]
pub fn playback_system(
    mut commands: Commands,
    clock: Option<ResMut<TickClock>>,
    playback: Option<ResMut<Playback>>,
    slices: Option<Res<SliceTable>>,
    frames: Option<Res<FrameStore>>,
    scene: Option<Res<CurrentScene>>,
    input: Res<InputState>,
    mut progress: ResMut<ProgressStore>,
    mut audio_clock: ResMut<AudioClock>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    let (Some(mut clock), Some(mut playback), Some(slices), Some(frames), Some(scene)) =
        (clock, playback, slices, frames, scene)
    else {
        return;
    };

    let due = clock.take_due();
    let pointer = input.active_pointer();
    for _ in 0..due {
        if playback.finished {
            break;
        }
        let effects = playback.tick(&slices, &frames, pointer);
        apply_playback_effects(
            effects,
            &mut commands,
            &scene,
            &mut progress,
            &mut audio_clock,
            &mut audio_cmds,
        );
    }
    if due > 0 {
        trace!(
            "{} ticks, slice {} frame {}",
            due, playback.current_slice, playback.current_frame
        );
    }
}
