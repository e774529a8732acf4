//! Audio position as seen from the ECS world.
//!
//! The audio thread reports the position of the scene track through
//! [`AudioMessage`](crate::events::audio::AudioMessage)s. Position reports
//! that were already in flight when a seek was requested describe the old
//! position, so they are ignored until the audio thread acknowledges the seek.

use bevy_ecs::prelude::Resource;

#[derive(Resource, Debug, Clone, Default)]
pub struct AudioClock {
    seconds: Option<f32>,
    awaiting_seek: bool,
}

impl AudioClock {
    /// Last reliable track position, if any.
    pub fn current_time(&self) -> Option<f32> {
        if self.awaiting_seek {
            None
        } else {
            self.seconds
        }
    }

    /// A seek command was sent; distrust reports until it is acknowledged.
    pub fn begin_seek(&mut self) {
        self.awaiting_seek = true;
    }

    pub fn on_seeked(&mut self, seconds: f32) {
        self.awaiting_seek = false;
        self.seconds = Some(seconds);
    }

    pub fn on_position(&mut self, seconds: f32) {
        if !self.awaiting_seek {
            self.seconds = Some(seconds);
        }
    }

    /// Forget the track, e.g. when it stopped or failed to load.
    pub fn clear(&mut self) {
        self.seconds = None;
        self.awaiting_seek = false;
    }
}
