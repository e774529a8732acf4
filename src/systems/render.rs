//! Render system.
//!
//! The frame is composed at the scene's frame resolution in the
//! [`RenderTarget`]: the primary frame (tinted by the loop fade), the sprite of
//! every hotspot region on top, then the score indicators. The target is then
//! scaled into the window with letterboxing. With [`DebugMode`] on, hotspot
//! polygons and the pointer are outlined in frame space and playback counters
//! are printed in window space.
use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::components::scoreindicator::ScoreIndicator;
use crate::components::tint::Tint;
use crate::resources::debugmode::DebugMode;
use crate::resources::input::InputState;
use crate::resources::playback::Playback;
use crate::resources::progress::ProgressStore;
use crate::resources::rendertarget::RenderTarget;
use crate::resources::texturestore::TextureStore;
use crate::resources::windowsize::WindowSize;

const INDICATOR_BACKDROP: Color = Color {
    r: 0,
    g: 0,
    b: 0,
    a: 140,
};
const INDICATOR_SEGMENTS: i32 = 48;

fn draw_frame<D: RaylibDraw>(d: &mut D, playback: &Playback, textures: &TextureStore) {
    if let Some(tex) = playback
        .primary_visual
        .as_deref()
        .and_then(|key| textures.get(key))
    {
        d.draw_texture(tex, 0, 0, playback.tint.color);
    }
    for hotspot in playback.hotspots.iter() {
        if let Some(tex) = hotspot.visual.as_deref().and_then(|key| textures.get(key)) {
            d.draw_texture(tex, 0, 0, Color::WHITE);
        }
    }
}

fn draw_indicator<D: RaylibDraw>(d: &mut D, indicator: &ScoreIndicator, tint: Tint) {
    if !indicator.visible {
        return;
    }
    d.draw_circle_v(indicator.center, indicator.radius, INDICATOR_BACKDROP);
    if indicator.fill > 0.0 {
        d.draw_circle_sector(
            indicator.center,
            indicator.radius,
            -90.0,
            -90.0 + indicator.sweep_degrees(),
            INDICATOR_SEGMENTS,
            tint.color,
        );
    }
    d.draw_circle_lines(
        indicator.center.x as i32,
        indicator.center.y as i32,
        indicator.radius,
        tint.color,
    );
}

fn draw_debug_geometry<D: RaylibDraw>(d: &mut D, playback: &Playback, input: &InputState) {
    for hotspot in playback.hotspots.iter() {
        let color = if hotspot.touched_frames > 0 {
            Color::LIME
        } else {
            Color::RED
        };
        for path in hotspot.collider.paths.iter() {
            for (i, a) in path.iter().enumerate() {
                let b = path[(i + 1) % path.len()];
                d.draw_line_v(*a, b, color);
            }
        }
    }
    let p = input.pointer.position;
    let color = if input.active_pointer().is_some() {
        Color::YELLOW
    } else {
        Color::GRAY
    };
    d.draw_line(p.x as i32 - 6, p.y as i32, p.x as i32 + 6, p.y as i32, color);
    d.draw_line(p.x as i32, p.y as i32 - 6, p.x as i32, p.y as i32 + 6, color);
}

fn render_debug_ui(d: &mut RaylibDrawHandle, playback: Option<&Playback>, progress: &ProgressStore) {
    let text = format!("DEBUG MODE (press F11 to toggle) | FPS: {}", d.get_fps());
    d.draw_text(&text, 10, 10, 10, Color::RAYWHITE);

    if let Some(p) = playback {
        let text = format!(
            "Slice {} frame {} | loop chances {} | release chances {}",
            p.current_slice, p.current_frame, p.loop_chances_to_use, p.release_chances_to_use
        );
        d.draw_text(&text, 10, 30, 10, Color::RAYWHITE);
        for (i, h) in p.hotspots.iter().enumerate() {
            let text = format!(
                "Region {}: touched {}/{} score {:.2}",
                h.region, h.touched_frames, h.played_frames, h.score
            );
            d.draw_text(&text, 10, 50 + 14 * i as i32, 10, Color::RAYWHITE);
        }
    }

    let text = format!(
        "Slices collected: {}/{} ({:.0}%)",
        progress.completed(),
        progress.total(),
        progress.percentage()
    );
    let bottom = d.get_screen_height() - 20;
    d.draw_text(&text, 10, bottom, 10, Color::RAYWHITE);
}

/// Draw the current frame into the render target and present it.
#[allow(clippy::too_many_arguments)]
pub fn render_system(
    mut rl: NonSendMut<RaylibHandle>,
    th: NonSend<RaylibThread>,
    mut target: NonSendMut<RenderTarget>,
    textures: NonSend<TextureStore>,
    window: Res<WindowSize>,
    input: Res<InputState>,
    progress: Res<ProgressStore>,
    playback: Option<Res<Playback>>,
    debug: Option<Res<DebugMode>>,
    indicators: Query<(&ScoreIndicator, Option<&Tint>)>,
) {
    let playback = playback.as_deref();
    let debug = debug.is_some();
    let dest = window.calculate_letterbox(target.frame_width, target.frame_height);

    let mut d = rl.begin_drawing(&th);
    d.clear_background(Color::BLACK);
    {
        let mut t = d.begin_texture_mode(&th, &mut target.texture);
        t.clear_background(Color::BLACK);
        if let Some(p) = playback {
            draw_frame(&mut t, p, &textures);
        }
        for (indicator, tint) in indicators.iter() {
            draw_indicator(&mut t, indicator, tint.copied().unwrap_or_default());
        }
        if let (true, Some(p)) = (debug, playback) {
            draw_debug_geometry(&mut t, p, &input);
        }
    }

    d.draw_texture_pro(
        &target.texture,
        target.source_rect(),
        dest,
        Vector2::zero(),
        0.0,
        Color::WHITE,
    );

    if debug {
        render_debug_ui(&mut d, playback, &progress);
    }
}
