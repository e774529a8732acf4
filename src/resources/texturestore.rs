//! Texture store resource.
//!
//! A non-send resource holding every texture of the loaded scene: primary
//! frames and hotspot sprites, keyed by the `tex_key` recorded in the
//! [`FrameStore`](crate::resources::framestore::FrameStore). The store is
//! cleared when the scene is left.
//!
//! Note: This is a non-send resource because Raylib textures must be accessed
//! from the main thread only.

use raylib::prelude::Texture2D;
use rustc_hash::FxHashMap;

/// Map of texture keys to loaded textures.
///
/// This is a non-send resource; use `NonSend<TextureStore>` in system parameters.
pub struct TextureStore {
    textures: FxHashMap<String, Texture2D>,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureStore {
    pub fn new() -> Self {
        Self {
            textures: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, texture: Texture2D) {
        self.textures.insert(key.into(), texture);
    }

    pub fn get(&self, key: impl AsRef<str>) -> Option<&Texture2D> {
        self.textures.get(key.as_ref())
    }

    /// Unload every texture.
    pub fn clear(&mut self) {
        self.textures.clear();
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }
}
