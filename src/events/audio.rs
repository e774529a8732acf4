use bevy_ecs::message::Message;

/// Commands sent *to* the audio thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioCmd {
    LoadMusic { id: String, path: String },
    PlayMusic { id: String },
    SeekMusic { id: String, seconds: f32 },
    StopMusic { id: String },
    UnloadAllMusic,
    Shutdown,
}

/// Messages sent *back* from the audio thread
#[derive(Message, Debug, Clone, PartialEq)]
pub enum AudioMessage {
    MusicLoaded { id: String },
    MusicLoadFailed { id: String, error: String },
    MusicPlayStarted { id: String },
    MusicSeeked { id: String, seconds: f32 },
    /// Periodic position report while the track plays.
    MusicPosition { id: String, seconds: f32 },
    MusicStopped { id: String },
    MusicUnloadedAll,
    MusicFinished { id: String },
}
