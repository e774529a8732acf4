//! Scene lifecycle hooks.
//!
//! These systems are registered in the
//! [`SystemsStore`](crate::resources::systemsstore::SystemsStore) and run by the
//! game state observer:
//!
//! - [`setup`] (entering `Setup`) scans the requested scene directory, loads
//!   its textures and audio, validates the slice table and inserts the
//!   playback resources.
//! - [`enter_play`] (entering `Playing`) starts the track and enters the first
//!   slice.
//! - [`leave_scene`] (leaving `Playing`) releases everything the scene owns.
//! - [`quit_game`] (entering `Quitting`) makes sure progress is on disk.
//!
//! [`prepare_scene`] holds the part of `setup` that does not need a window.

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use log::{debug, error, info, warn};
use raylib::prelude::*;
use rustc_hash::FxHashMap;

use crate::components::persistent::Persistent;
use crate::components::scoreindicator::ScoreIndicator;
use crate::components::tint::Tint;
use crate::events::audio::AudioCmd;
use crate::resources::audioclock::AudioClock;
use crate::resources::framestore::{FrameStore, HotspotFrame};
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::input::InputState;
use crate::resources::playback::Playback;
use crate::resources::progress::ProgressStore;
use crate::resources::rendertarget::RenderTarget;
use crate::resources::scene::{
    CurrentScene, IndicatorPlacement, SceneAssets, SceneManifest, SceneRequest, scan_scene,
};
use crate::resources::screensize::ScreenSize;
use crate::resources::slicetable::SliceTable;
use crate::resources::texturestore::TextureStore;
use crate::resources::tickclock::TickClock;
use crate::systems::playback::apply_playback_effects;

const INDICATOR_COLOR: Color = Color {
    r: 255,
    g: 200,
    b: 40,
    a: 255,
};

/// Everything a scene needs to play, minus GPU and audio handles.
#[derive(Debug)]
pub struct PreparedScene {
    pub name: String,
    pub frames: FrameStore,
    /// Texture key and file of every image to load.
    pub textures: Vec<(String, PathBuf)>,
    pub slices: SliceTable,
    pub playback: Playback,
    pub frame_rate: u32,
    pub loads_to: Option<String>,
    pub indicators: Vec<IndicatorPlacement>,
}

fn primary_key(index: usize) -> String {
    format!("frame:{}", index)
}

fn hotspot_key(region: usize, frame: u32) -> String {
    format!("region{}:{}", region, frame)
}

/// Build the frame store and validated slice table of a scanned scene.
///
/// Fails when the manifest is missing or unreadable, or when the slice table
/// does not validate against the scanned frames and regions.
pub fn prepare_scene(
    assets: &SceneAssets,
    default_frame_rate: u32,
) -> Result<PreparedScene, String> {
    let manifest_path = assets.manifest_path();
    let mut manifest = SceneManifest::load_from_file(&manifest_path).map_err(|e| {
        format!(
            "Failed to load {} ({}); run --build-slices on the scene first",
            manifest_path.display(),
            e
        )
    })?;
    manifest.fill_slice_names(&assets.name);

    let mut textures = Vec::with_capacity(assets.frames.len());
    let mut primary = Vec::with_capacity(assets.frames.len());
    for (index, path) in assets.frames.iter().enumerate() {
        let key = primary_key(index);
        textures.push((key.clone(), path.clone()));
        primary.push(key);
    }
    let mut frames = FrameStore::new(primary);

    for (region, region_assets) in assets.regions.iter().enumerate() {
        let mut by_frame = FxHashMap::default();
        let mut bare = 0;
        for (&frame, path) in region_assets.sprites.iter() {
            // a region frame needs both its sprite and its hit geometry
            let Some(polygons) = region_assets
                .polygons
                .get(&frame)
                .filter(|polygons| !polygons.is_empty())
                .cloned()
            else {
                bare += 1;
                continue;
            };
            let key = hotspot_key(region, frame);
            textures.push((key.clone(), path.clone()));
            by_frame.insert(
                frame,
                HotspotFrame {
                    tex_key: key,
                    polygons,
                },
            );
        }
        let orphans = region_assets
            .polygons
            .keys()
            .filter(|f| !region_assets.sprites.contains_key(f))
            .count();
        if bare > 0 {
            debug!(
                "Region {}: {} sprites without collider frames ignored",
                region, bare
            );
        }
        if orphans > 0 {
            debug!(
                "Region {}: {} collider frames without a sprite ignored",
                region, orphans
            );
        }
        frames.push_region(by_frame);
    }

    let slices = SliceTable::new(manifest.slices, frames.region_count(), frames.frame_count())
        .map_err(|e| format!("Invalid slice table in {}: {}", manifest_path.display(), e))?;
    slices
        .check_start(manifest.start_slice)
        .map_err(|e| format!("Invalid slice table in {}: {}", manifest_path.display(), e))?;

    let frame_rate = manifest.frame_rate.unwrap_or(default_frame_rate).max(1);
    let playback = Playback::new(&slices, manifest.start_slice, frame_rate);

    let mut indicators = Vec::with_capacity(manifest.indicators.len());
    for placement in manifest.indicators {
        if placement.region < frames.region_count() {
            indicators.push(placement);
        } else {
            warn!(
                "Indicator for region {} skipped, scene has {} regions",
                placement.region,
                frames.region_count()
            );
        }
    }

    Ok(PreparedScene {
        name: assets.name.clone(),
        frames,
        textures,
        slices,
        playback,
        frame_rate,
        loads_to: manifest.loads_to,
        indicators,
    })
}

/// Load the requested scene (or the configured start scene).
///
/// Any fatal problem is logged and the game quits instead of entering
/// `Playing`.
#[allow(clippy::too_many_arguments)]
pub fn setup(
    mut commands: Commands,
    mut next_state: ResMut<NextGameState>,
    mut rl: NonSendMut<RaylibHandle>,
    th: NonSend<RaylibThread>,
    mut textures: NonSendMut<TextureStore>,
    mut target: NonSendMut<RenderTarget>,
    config: Res<GameConfig>,
    request: Option<Res<SceneRequest>>,
    mut progress: ResMut<ProgressStore>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    let name = request
        .as_deref()
        .map(|r| r.name.clone())
        .unwrap_or_else(|| config.start_scene.clone());
    commands.remove_resource::<SceneRequest>();
    let dir = config.scene_dir(&name);
    info!("Loading scene '{}' from {}", name, dir.display());

    let prepared = match scan_scene(&dir).and_then(|a| {
        prepare_scene(&a, config.frame_rate).map(|p| (p, a.audio.clone()))
    }) {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("Failed to load scene '{}': {}", name, e);
            next_state.set(GameStates::Quitting);
            return;
        }
    };
    let (scene, audio) = prepared;

    for (key, path) in scene.textures.iter() {
        let Some(path_str) = path.to_str() else {
            warn!("Skipping non UTF-8 path {}", path.display());
            continue;
        };
        match rl.load_texture(&th, path_str) {
            Ok(texture) => textures.insert(key.clone(), texture),
            Err(e) => warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    let Some((width, height)) = scene
        .frames
        .primary_frame(0)
        .and_then(|key| textures.get(key))
        .map(|t| (t.width, t.height))
    else {
        error!("Scene '{}': first frame could not be loaded", name);
        next_state.set(GameStates::Quitting);
        return;
    };
    match target.fit_to(&mut rl, &th, width as u32, height as u32) {
        Ok(true) => info!("Canvas resized to {}x{}", width, height),
        Ok(false) => {}
        Err(e) => {
            error!("{}", e);
            next_state.set(GameStates::Quitting);
            return;
        }
    }
    commands.insert_resource(ScreenSize {
        w: width,
        h: height,
    });

    let added = progress.ensure_keys(scene.slices.iter().map(|s| s.name.as_str()));
    if added > 0 {
        if let Err(e) = progress.flush() {
            error!("{}", e);
        }
    }

    let music_id = audio.and_then(|path| match path.to_str() {
        Some(path_str) => {
            audio_cmds.write(AudioCmd::LoadMusic {
                id: scene.name.clone(),
                path: path_str.to_string(),
            });
            Some(scene.name.clone())
        }
        None => {
            warn!("Skipping non UTF-8 audio path {}", path.display());
            None
        }
    });

    for placement in scene.indicators.iter() {
        commands.spawn((
            ScoreIndicator::new(
                placement.region,
                Vector2 {
                    x: placement.x,
                    y: placement.y,
                },
                placement.radius,
            ),
            Tint {
                color: INDICATOR_COLOR,
            },
        ));
    }

    info!(
        "Scene '{}' ready: {} slices, {} regions, {} fps",
        scene.name,
        scene.slices.len(),
        scene.frames.region_count(),
        scene.frame_rate
    );
    commands.insert_resource(CurrentScene {
        name: scene.name,
        dir,
        loads_to: scene.loads_to,
        music_id,
    });
    commands.insert_resource(TickClock::new(scene.frame_rate));
    commands.insert_resource(AudioClock::default());
    commands.insert_resource(scene.frames);
    commands.insert_resource(scene.slices);
    commands.insert_resource(scene.playback);

    next_state.set(GameStates::Playing);
}

/// Start the track and enter the first slice.
#[allow(clippy::too_many_arguments)]
pub fn enter_play(
    mut commands: Commands,
    playback: Option<ResMut<Playback>>,
    slices: Option<Res<SliceTable>>,
    scene: Option<Res<CurrentScene>>,
    clock: Option<ResMut<TickClock>>,
    mut input: ResMut<InputState>,
    mut progress: ResMut<ProgressStore>,
    mut audio_clock: ResMut<AudioClock>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    let (Some(mut playback), Some(slices), Some(scene)) = (playback, slices, scene) else {
        error!("enter_play: no scene loaded");
        return;
    };
    if let Some(id) = scene.music_id.as_ref() {
        audio_cmds.write(AudioCmd::PlayMusic { id: id.clone() });
    }
    let effects = playback.enter(&slices);
    apply_playback_effects(
        effects,
        &mut commands,
        &scene,
        &mut progress,
        &mut audio_clock,
        &mut audio_cmds,
    );
    if let Some(mut clock) = clock {
        clock.reset();
    }
    input.disarm();
}

/// Release the scene: entities, audio, textures and playback resources.
pub fn leave_scene(
    mut commands: Commands,
    query: Query<Entity, Without<Persistent>>,
    scene: Option<Res<CurrentScene>>,
    mut textures: NonSendMut<TextureStore>,
    mut audio_cmds: MessageWriter<AudioCmd>,
) {
    for entity in query.iter() {
        commands.entity(entity).despawn();
    }
    if let Some(id) = scene.as_ref().and_then(|s| s.music_id.clone()) {
        audio_cmds.write(AudioCmd::StopMusic { id });
    }
    audio_cmds.write(AudioCmd::UnloadAllMusic);
    debug!("Unloading {} textures", textures.len());
    textures.clear();

    commands.remove_resource::<Playback>();
    commands.remove_resource::<SliceTable>();
    commands.remove_resource::<FrameStore>();
    commands.remove_resource::<TickClock>();
    commands.remove_resource::<CurrentScene>();
    if let Some(scene) = scene {
        info!("Left scene '{}'", scene.name);
    }
}

pub fn quit_game(progress: Res<ProgressStore>) {
    info!(
        "Quitting with {}/{} slices collected",
        progress.completed(),
        progress.total()
    );
    if let Err(e) = progress.flush() {
        error!("{}", e);
    }
}

/// Per-frame game logic while playing: Escape leaves the player.
pub fn update(input: Res<InputState>, mut next_state: ResMut<NextGameState>) {
    if input.action_back.just_pressed {
        info!("Escape pressed, quitting");
        next_state.set(GameStates::Quitting);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::scene::{COLLIDERS_FILE, SCENE_MANIFEST};
    use crate::resources::slicetable::Slice;
    use std::fs;
    use std::path::Path;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn scene_dir(root: &Path) -> PathBuf {
        let dir = root.join("Intro");
        for i in 0..10 {
            touch(&dir.join("Frames").join(format!("Intro_{:04}.jpg", i)));
        }
        touch(&dir.join("ButtonFrames_0").join("Intro_button0_3.jpg"));
        touch(&dir.join("ButtonFrames_0").join("Intro_button0_5.jpg"));
        fs::write(
            dir.join("ButtonFrames_0").join(COLLIDERS_FILE),
            r#"[
                { "frame_number": 3, "points": [[0,0],[10,0],[10,10]] },
                { "frame_number": 7, "points": [[0,0],[10,0],[10,10]] }
            ]"#,
        )
        .unwrap();
        dir
    }

    fn write_manifest(dir: &Path, manifest: &SceneManifest) {
        manifest.save_to_file(dir.join(SCENE_MANIFEST)).unwrap();
    }

    fn two_slices() -> Vec<Slice> {
        let mut first = Slice::new("", 0, 4);
        first.next_slice = vec![1];
        let mut last = Slice::new("", 5, 9);
        last.is_last_slice = true;
        vec![first, last]
    }

    #[test]
    fn test_prepare_scene_builds_stores() {
        let root = tempfile::tempdir().unwrap();
        let dir = scene_dir(root.path());
        write_manifest(
            &dir,
            &SceneManifest {
                frame_rate: Some(30),
                start_slice: 0,
                loads_to: Some("Forest".into()),
                indicators: vec![
                    IndicatorPlacement {
                        region: 0,
                        x: 5.0,
                        y: 5.0,
                        radius: 24.0,
                    },
                    IndicatorPlacement {
                        region: 3,
                        x: 5.0,
                        y: 5.0,
                        radius: 24.0,
                    },
                ],
                slices: two_slices(),
            },
        );

        let assets = scan_scene(&dir).unwrap();
        let scene = prepare_scene(&assets, 24).unwrap();
        assert_eq!(scene.frames.frame_count(), 10);
        assert_eq!(scene.frames.region_count(), 1);
        assert_eq!(scene.textures.len(), 11);
        assert_eq!(scene.frame_rate, 30);
        assert_eq!(scene.loads_to.as_deref(), Some("Forest"));
        assert_eq!(scene.indicators.len(), 1);
        assert_eq!(scene.slices[1].name, "Intro_Slice 1");

        let frame = scene.frames.hotspot_frame(0, 3).unwrap();
        assert_eq!(frame.tex_key, "region0:3");
        assert_eq!(frame.polygons.len(), 1);
        assert!(scene.frames.hotspot_frame(0, 7).is_none());
        // sprite without polygons is neither drawn nor hit-tested
        assert!(scene.frames.hotspot_frame(0, 5).is_none());
        assert!(!scene.textures.iter().any(|(key, _)| key == "region0:5"));
    }

    #[test]
    fn test_prepare_scene_uses_default_frame_rate() {
        let root = tempfile::tempdir().unwrap();
        let dir = scene_dir(root.path());
        write_manifest(
            &dir,
            &SceneManifest {
                frame_rate: None,
                start_slice: 1,
                loads_to: None,
                indicators: Vec::new(),
                slices: two_slices(),
            },
        );
        let scene = prepare_scene(&scan_scene(&dir).unwrap(), 24).unwrap();
        assert_eq!(scene.frame_rate, 24);
        assert_eq!(scene.playback.current_slice, 1);
        assert_eq!(scene.playback.current_frame, 5);
    }

    #[test]
    fn test_prepare_scene_rejects_invalid_table() {
        let root = tempfile::tempdir().unwrap();
        let dir = scene_dir(root.path());
        let mut slices = two_slices();
        slices[1].last_frame = 20;
        write_manifest(
            &dir,
            &SceneManifest {
                frame_rate: None,
                start_slice: 0,
                loads_to: None,
                indicators: Vec::new(),
                slices,
            },
        );
        let err = prepare_scene(&scan_scene(&dir).unwrap(), 24).unwrap_err();
        assert!(err.contains("Invalid slice table"));
    }

    #[test]
    fn test_prepare_scene_without_manifest_fails() {
        let root = tempfile::tempdir().unwrap();
        let dir = scene_dir(root.path());
        let err = prepare_scene(&scan_scene(&dir).unwrap(), 24).unwrap_err();
        assert!(err.contains("--build-slices"));
    }

    #[test]
    fn test_update_quits_on_escape() {
        let mut world = World::new();
        world.insert_resource(NextGameState::new());
        let mut input = InputState::default();
        input.action_back.just_pressed = true;
        world.insert_resource(input);

        let mut schedule = Schedule::default();
        schedule.add_systems(update);
        schedule.run(&mut world);

        assert_eq!(
            world.resource::<NextGameState>().get(),
            &crate::resources::gamestate::NextGameStates::Pending(GameStates::Quitting)
        );
    }
}
