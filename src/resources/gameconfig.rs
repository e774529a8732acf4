//! Player configuration resource.
//!
//! Settings are loaded from an INI file. Every key is optional: whatever is
//! missing keeps its default, and a missing file leaves all defaults in place.
//!
//! # Configuration File Format
//!
//! ```ini
//! [window]
//! width = 1280
//! height = 720
//! target_fps = 60
//! vsync = true
//!
//! [playback]
//! frame_rate = 24
//! assets_root = ./assets/scenes
//! start_scene = Intro
//! save_path = ./progress.json
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::info;
use std::path::{Path, PathBuf};

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_VSYNC: bool = true;
const DEFAULT_FRAME_RATE: u32 = 24;
const DEFAULT_ASSETS_ROOT: &str = "./assets/scenes";
const DEFAULT_START_SCENE: &str = "Intro";
const DEFAULT_SAVE_PATH: &str = "./progress.json";
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Player configuration resource.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Target render frames per second.
    pub target_fps: u32,
    /// Enable vertical sync.
    pub vsync: bool,
    /// Playback ticks per second, unless the scene manifest overrides it.
    pub frame_rate: u32,
    /// Directory holding one sub-directory per scene.
    pub assets_root: PathBuf,
    /// Scene loaded at startup.
    pub start_scene: String,
    /// Progress file.
    pub save_path: PathBuf,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            vsync: DEFAULT_VSYNC,
            frame_rate: DEFAULT_FRAME_RATE,
            assets_root: PathBuf::from(DEFAULT_ASSETS_ROOT),
            start_scene: DEFAULT_START_SCENE.to_string(),
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [window] section
        if let Some(width) = config.getuint("window", "width").ok().flatten() {
            self.window_width = width as u32;
        }
        if let Some(height) = config.getuint("window", "height").ok().flatten() {
            self.window_height = height as u32;
        }
        if let Some(fps) = config.getuint("window", "target_fps").ok().flatten() {
            self.target_fps = fps as u32;
        }
        if let Some(vsync) = config.getbool("window", "vsync").ok().flatten() {
            self.vsync = vsync;
        }

        // [playback] section
        if let Some(rate) = config.getuint("playback", "frame_rate").ok().flatten() {
            self.frame_rate = (rate as u32).max(1);
        }
        if let Some(root) = config.get("playback", "assets_root") {
            self.assets_root = PathBuf::from(root);
        }
        if let Some(scene) = config.get("playback", "start_scene") {
            self.start_scene = scene;
        }
        if let Some(path) = config.get("playback", "save_path") {
            self.save_path = PathBuf::from(path);
        }

        info!(
            "Loaded config: {}x{} window, fps={}, vsync={}, frame_rate={}, scenes in {:?}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.vsync,
            self.frame_rate,
            self.assets_root
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("window", "width", Some(self.window_width.to_string()));
        config.set("window", "height", Some(self.window_height.to_string()));
        config.set("window", "target_fps", Some(self.target_fps.to_string()));
        config.set("window", "vsync", Some(self.vsync.to_string()));

        config.set("playback", "frame_rate", Some(self.frame_rate.to_string()));
        config.set(
            "playback",
            "assets_root",
            Some(self.assets_root.display().to_string()),
        );
        config.set("playback", "start_scene", Some(self.start_scene.clone()));
        config.set(
            "playback",
            "save_path",
            Some(self.save_path.display().to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    /// Directory of the scene called `name`.
    pub fn scene_dir(&self, name: &str) -> PathBuf {
        self.assets_root.join(name)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
