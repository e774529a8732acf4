//! Scene layout on disk and the active scene resources.
//!
//! A scene is a directory named after the scene:
//!
//! ```text
//! Intro/
//!   scene.json            slice table and scene options (SceneManifest)
//!   Intro.wav             audio track, optional
//!   slices.txt            slice start frames, authoring input only
//!   Frames/*.jpg          primary frames, played in file name order
//!   ButtonFrames_0/       sprites of hotspot region 0: Intro_button0_<frame>.jpg
//!     colliders.json      baked polygons of region 0
//!   ButtonFrames_1/       region 1, and so on until the first missing folder
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bevy_ecs::prelude::Resource;
use log::{info, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::resources::framestore::ColliderData;
use crate::resources::hotspot::Polygon;
use crate::resources::slicetable::Slice;

pub const SCENE_MANIFEST: &str = "scene.json";
pub const COLLIDERS_FILE: &str = "colliders.json";
pub const FRAMES_DIR: &str = "Frames";
pub const REGION_DIR_PREFIX: &str = "ButtonFrames_";

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

fn default_radius() -> f32 {
    24.0
}

/// Where a region's score indicator is drawn, in frame space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPlacement {
    pub region: usize,
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_radius")]
    pub radius: f32,
}

/// Contents of `scene.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    /// Overrides `[playback] frame_rate` for this scene.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<u32>,
    #[serde(default)]
    pub start_slice: usize,
    /// Scene loaded when the last slice finishes. The game quits without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loads_to: Option<String>,
    #[serde(default)]
    pub indicators: Vec<IndicatorPlacement>,
    #[serde(default)]
    pub slices: Vec<Slice>,
}

impl SceneManifest {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let file_content = std::fs::read_to_string(path)?;
        let manifest: SceneManifest = serde_json::from_str(&file_content)?;
        Ok(manifest)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Give every unnamed slice its default progress key.
    pub fn fill_slice_names(&mut self, scene: &str) {
        for (index, slice) in self.slices.iter_mut().enumerate() {
            if slice.name.is_empty() {
                slice.name = default_slice_name(scene, index);
            }
        }
    }
}

/// Progress key of slice `index` in `scene` when the manifest names none.
pub fn default_slice_name(scene: &str, index: usize) -> String {
    format!("{}_Slice {}", scene, index)
}

/// Scene currently loaded or being loaded.
#[derive(Resource, Debug, Clone)]
pub struct CurrentScene {
    pub name: String,
    pub dir: PathBuf,
    pub loads_to: Option<String>,
    /// Audio id of the scene track, when one was found.
    pub music_id: Option<String>,
}

/// Scene to load on the next entry into `Setup`.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct SceneRequest {
    pub name: String,
}

/// Files of one hotspot region.
#[derive(Debug, Clone, Default)]
pub struct RegionAssets {
    pub sprites: BTreeMap<u32, PathBuf>,
    pub polygons: FxHashMap<u32, Vec<Polygon>>,
}

/// Every asset path of a scene directory.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub name: String,
    pub dir: PathBuf,
    pub frames: Vec<PathBuf>,
    pub regions: Vec<RegionAssets>,
    pub audio: Option<PathBuf>,
}

impl SceneAssets {
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(SCENE_MANIFEST)
    }
}

/// Name of the scene stored in `dir`.
pub fn scene_name(dir: &Path) -> Result<String, String> {
    dir.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| format!("Not a scene directory: {}", dir.display()))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

fn sorted_images(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read {}: {}", dir.display(), e))?;
    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_image(path))
        .collect();
    images.sort();
    Ok(images)
}

/// Frame number of a region sprite named `<scene>_<region>_<frame>`.
pub fn parse_hotspot_frame_number(stem: &str) -> Option<u32> {
    stem.split('_').nth(2)?.parse().ok()
}

fn scan_region(dir: &Path) -> Result<RegionAssets, String> {
    let mut region = RegionAssets::default();
    for path in sorted_images(dir)? {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        match parse_hotspot_frame_number(stem) {
            Some(frame) => {
                region.sprites.insert(frame, path);
            }
            None => warn!("Failed to parse frame number from {}", path.display()),
        }
    }
    let colliders = dir.join(COLLIDERS_FILE);
    if colliders.exists() {
        match ColliderData::load_from_file(&colliders) {
            Ok(data) => region.polygons = data.into_polygons(),
            Err(e) => warn!("Failed to load {}: {}", colliders.display(), e),
        }
    } else {
        warn!("No {} in {}, region is never hit", COLLIDERS_FILE, dir.display());
    }
    Ok(region)
}

/// Collect the frames, hotspot regions and audio of the scene in `dir`.
pub fn scan_scene(dir: &Path) -> Result<SceneAssets, String> {
    let name = scene_name(dir)?;
    let frames = sorted_images(&dir.join(FRAMES_DIR))?;
    if frames.is_empty() {
        return Err(format!("No frames in {}", dir.join(FRAMES_DIR).display()));
    }

    let mut regions = Vec::new();
    loop {
        let region_dir = dir.join(format!("{}{}", REGION_DIR_PREFIX, regions.len()));
        if !region_dir.is_dir() {
            break;
        }
        regions.push(scan_region(&region_dir)?);
    }

    let audio_path = dir.join(format!("{}.wav", name));
    let audio = if audio_path.is_file() {
        Some(audio_path)
    } else {
        warn!("No audio clip at {}, playing silent", audio_path.display());
        None
    };

    info!(
        "Scanned scene '{}': {} frames, {} hotspot regions",
        name,
        frames.len(),
        regions.len()
    );
    Ok(SceneAssets {
        name,
        dir: dir.to_path_buf(),
        frames,
        regions,
        audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_parse_hotspot_frame_number() {
        assert_eq!(parse_hotspot_frame_number("Intro_button0_0042"), Some(42));
        assert_eq!(parse_hotspot_frame_number("Intro_button0"), None);
        assert_eq!(parse_hotspot_frame_number("Intro_button0_x"), None);
    }

    #[test]
    fn test_scan_scene_layout() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Intro");
        touch(&dir.join("Frames").join("Intro_0002.jpg"));
        touch(&dir.join("Frames").join("Intro_0001.jpg"));
        touch(&dir.join("Frames").join("notes.txt"));
        touch(&dir.join("ButtonFrames_0").join("Intro_button0_1.jpg"));
        touch(&dir.join("ButtonFrames_0").join("broken.jpg"));
        fs::write(
            dir.join("ButtonFrames_0").join(COLLIDERS_FILE),
            r#"[{ "frame_number": 1, "points": [[0,0],[1,0],[1,1]] }]"#,
        )
        .unwrap();
        touch(&dir.join("ButtonFrames_2").join("Intro_button2_1.jpg"));

        let assets = scan_scene(&dir).unwrap();
        assert_eq!(assets.name, "Intro");
        assert_eq!(assets.frames.len(), 2);
        assert!(assets.frames[0].ends_with("Intro_0001.jpg"));
        assert_eq!(assets.regions.len(), 1);
        assert_eq!(assets.regions[0].sprites.len(), 1);
        assert_eq!(assets.regions[0].polygons[&1].len(), 1);
        assert!(assets.audio.is_none());
    }

    #[test]
    fn test_scan_scene_without_frames_fails() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("Empty");
        fs::create_dir_all(dir.join("Frames")).unwrap();
        assert!(scan_scene(&dir).is_err());
    }

    #[test]
    fn test_manifest_defaults_and_names() {
        let mut manifest: SceneManifest = serde_json::from_str(
            r#"{ "slices": [ { "first_frame": 0, "last_frame": 3, "is_last_slice": true } ] }"#,
        )
        .unwrap();
        assert_eq!(manifest.start_slice, 0);
        assert!(manifest.frame_rate.is_none());
        manifest.fill_slice_names("Intro");
        assert_eq!(manifest.slices[0].name, "Intro_Slice 0");
    }
}
