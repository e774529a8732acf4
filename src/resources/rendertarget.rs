//! Off-screen canvas at the frame resolution of the current scene.
//!
//! The primary frame, hotspot sprites and score indicators are drawn here
//! first, then the canvas is scaled into the letterboxed window area.

use raylib::ffi::{self, TextureFilter};
use raylib::prelude::*;

/// NonSend: the render texture lives on the GPU and belongs to the main thread.
pub struct RenderTarget {
    pub texture: RenderTexture2D,
    pub frame_width: u32,
    pub frame_height: u32,
}

fn load_canvas(
    rl: &mut RaylibHandle,
    th: &RaylibThread,
    width: u32,
    height: u32,
) -> Result<RenderTexture2D, String> {
    let canvas = rl
        .load_render_texture(th, width.max(1), height.max(1))
        .map_err(|e| format!("Cannot allocate {}x{} canvas: {}", width, height, e))?;
    unsafe {
        ffi::SetTextureFilter(
            canvas.texture,
            TextureFilter::TEXTURE_FILTER_BILINEAR as i32,
        );
    }
    Ok(canvas)
}

impl RenderTarget {
    pub fn new(
        rl: &mut RaylibHandle,
        th: &RaylibThread,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        Ok(Self {
            texture: load_canvas(rl, th, width, height)?,
            frame_width: width,
            frame_height: height,
        })
    }

    /// Reallocate the canvas when a scene with another frame size is loaded.
    /// Returns `Ok(false)` when the size already matches.
    pub fn fit_to(
        &mut self,
        rl: &mut RaylibHandle,
        th: &RaylibThread,
        width: u32,
        height: u32,
    ) -> Result<bool, String> {
        if self.frame_width == width && self.frame_height == height {
            return Ok(false);
        }
        self.texture = load_canvas(rl, th, width, height)?;
        self.frame_width = width;
        self.frame_height = height;
        Ok(true)
    }

    /// Whole canvas, with a negative height since render textures are
    /// stored upside down.
    pub fn source_rect(&self) -> Rectangle {
        Rectangle::new(
            0.0,
            0.0,
            self.frame_width as f32,
            -(self.frame_height as f32),
        )
    }
}
