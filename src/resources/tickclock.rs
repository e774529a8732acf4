//! Fixed-rate playback scheduler.
//!
//! The render loop runs at whatever rate the window allows, while playback
//! advances at exactly `frame_rate` ticks per second. [`TickClock`] converts
//! frame deltas into whole ticks with an accumulator and lets the audio
//! position nudge it back in line when the two drift apart by more than one
//! tick. The audio track is the reference for elapsed time.

use bevy_ecs::prelude::Resource;
use log::debug;

/// Upper bound of ticks run in a single render frame. A longer stall (window
/// drag, breakpoint) drops the excess instead of fast-forwarding through it.
pub const MAX_TICKS_PER_FRAME: u32 = 8;

/// Drift beyond this many seconds means the audio position no longer tracks
/// the frames (track ended, device stall); resync is skipped until the two
/// are close again.
pub const RESYNC_WINDOW: f64 = 1.0;

const EPSILON: f64 = 1e-9;

#[derive(Resource, Debug, Clone)]
pub struct TickClock {
    frame_rate: u32,
    accumulator: f64,
    due: u32,
}

impl TickClock {
    pub fn new(frame_rate: u32) -> Self {
        Self {
            frame_rate: frame_rate.max(1),
            accumulator: 0.0,
            due: 0,
        }
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Duration of one tick in seconds.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / self.frame_rate as f64
    }

    /// Ticks scheduled but not yet taken.
    pub fn due(&self) -> u32 {
        self.due
    }

    /// Accumulate `dt` seconds and schedule every whole tick it completes.
    pub fn advance(&mut self, dt: f32) {
        let tick = self.tick_seconds();
        self.accumulator += dt.max(0.0) as f64;
        while self.accumulator + EPSILON >= tick {
            self.accumulator -= tick;
            self.due += 1;
        }
        if self.due > MAX_TICKS_PER_FRAME {
            debug!(
                "Dropping {} playback ticks after a long frame",
                self.due - MAX_TICKS_PER_FRAME
            );
            self.due = MAX_TICKS_PER_FRAME;
            self.accumulator = 0.0;
        }
    }

    /// Take all scheduled ticks.
    pub fn take_due(&mut self) -> u32 {
        std::mem::take(&mut self.due)
    }

    /// Correct drift against the audio position.
    ///
    /// `playback_seconds` is the position of the frame the next tick will
    /// show. When the audio runs more than one tick ahead of the schedule an
    /// extra tick is added; when it lags more than one tick behind, one
    /// scheduled tick is held back. The accumulator never owes more than one
    /// tick, and a drift wider than [`RESYNC_WINDOW`] is ignored.
    pub fn resync(&mut self, audio_seconds: f32, playback_seconds: f32) {
        let tick = self.tick_seconds();
        let scheduled = playback_seconds as f64 + self.due as f64 * tick;
        let drift = audio_seconds as f64 - scheduled;
        if drift.abs() > RESYNC_WINDOW {
            debug!(
                "Audio at {:.2}s is {:.2}s off the frames, not resyncing",
                audio_seconds, drift
            );
            return;
        }
        if drift > tick && self.due < MAX_TICKS_PER_FRAME {
            self.due += 1;
        } else if drift < -tick {
            if self.due > 0 {
                self.due -= 1;
            } else {
                self.accumulator = (self.accumulator - tick).max(-tick);
            }
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.due = 0;
    }
}
