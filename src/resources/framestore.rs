//! Frame and sprite lookup for the active scene.
//!
//! The [`FrameStore`] maps playback frames to texture keys in the
//! [`TextureStore`](crate::resources::texturestore::TextureStore): one ordered
//! list of primary frames and, per hotspot region, a sparse map
//! `frame number -> (sprite, polygons)`. It is filled once at scene load and is
//! read-only during playback.
//!
//! Baked hit geometry comes from a `colliders.json` file next to each region's
//! sprites:
//!
//! ```json
//! [
//!   { "frame_number": 12, "points": [[10.0, 20.0], [40.0, 20.0], [25.0, 50.0]] },
//!   { "frame_number": 12, "points": [[60.0, 20.0], [90.0, 20.0], [75.0, 50.0]] }
//! ]
//! ```
//!
//! Several entries with the same frame number describe several polygons of the
//! same frame.

use bevy_ecs::prelude::Resource;
use raylib::prelude::Vector2;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::resources::hotspot::Polygon;

/// Sprite and hit geometry of one region on one frame.
#[derive(Debug, Clone, Default)]
pub struct HotspotFrame {
    pub tex_key: String,
    pub polygons: Vec<Polygon>,
}

#[derive(Resource, Debug, Clone, Default)]
pub struct FrameStore {
    frames: Vec<String>,
    hotspots: Vec<FxHashMap<u32, HotspotFrame>>,
}

impl FrameStore {
    pub fn new(frames: Vec<String>) -> Self {
        Self {
            frames,
            hotspots: Vec::new(),
        }
    }

    /// Append a region. Its index is the region id used by slices and colliders.
    pub fn push_region(&mut self, frames: FxHashMap<u32, HotspotFrame>) -> usize {
        self.hotspots.push(frames);
        self.hotspots.len() - 1
    }

    /// Texture key of primary frame `index`.
    pub fn primary_frame(&self, index: u32) -> Option<&str> {
        self.frames.get(index as usize).map(String::as_str)
    }

    /// Sprite and polygons of `region` at `frame`, if the region is shown.
    pub fn hotspot_frame(&self, region: usize, frame: u32) -> Option<&HotspotFrame> {
        self.hotspots.get(region)?.get(&frame)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn region_count(&self) -> usize {
        self.hotspots.len()
    }
}

/// One baked polygon as stored in `colliders.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColliderPath {
    pub frame_number: u32,
    pub points: Vec<[f32; 2]>,
}

/// Contents of a region's `colliders.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColliderData {
    pub paths: Vec<ColliderPath>,
}

impl ColliderData {
    pub fn load_from_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let file_content = std::fs::read_to_string(path)?;
        let data: ColliderData = serde_json::from_str(&file_content)?;
        Ok(data)
    }

    /// Group paths by frame number.
    pub fn into_polygons(self) -> FxHashMap<u32, Vec<Polygon>> {
        let mut by_frame: FxHashMap<u32, Vec<Polygon>> = FxHashMap::default();
        for path in self.paths {
            let polygon: Polygon = path
                .points
                .iter()
                .map(|&[x, y]| Vector2 { x, y })
                .collect();
            by_frame.entry(path.frame_number).or_default().push(polygon);
        }
        by_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FrameStore {
        let mut store = FrameStore::new(vec!["f0".into(), "f1".into(), "f2".into()]);
        let mut region = FxHashMap::default();
        region.insert(
            1,
            HotspotFrame {
                tex_key: "b0_1".into(),
                polygons: Vec::new(),
            },
        );
        store.push_region(region);
        store
    }

    #[test]
    fn test_primary_frame_lookup() {
        let s = store();
        assert_eq!(s.primary_frame(2), Some("f2"));
        assert_eq!(s.primary_frame(3), None);
        assert_eq!(s.frame_count(), 3);
    }

    #[test]
    fn test_hotspot_frame_is_sparse() {
        let s = store();
        assert_eq!(s.region_count(), 1);
        assert_eq!(s.hotspot_frame(0, 1).map(|f| f.tex_key.as_str()), Some("b0_1"));
        assert!(s.hotspot_frame(0, 0).is_none());
        assert!(s.hotspot_frame(5, 1).is_none());
    }

    #[test]
    fn test_collider_paths_grouped_by_frame() {
        let json = r#"[
            { "frame_number": 3, "points": [[0,0],[4,0],[4,4]] },
            { "frame_number": 3, "points": [[10,0],[14,0],[14,4]] },
            { "frame_number": 4, "points": [[0,0],[1,0],[1,1]] }
        ]"#;
        let data: ColliderData = serde_json::from_str(json).unwrap();
        let polygons = data.into_polygons();
        assert_eq!(polygons[&3].len(), 2);
        assert_eq!(polygons[&4].len(), 1);
        assert_eq!(polygons[&3][1][0].x, 10.0);
    }
}
