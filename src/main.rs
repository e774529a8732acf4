//! Flipbook player entry point.
//!
//! Plays interactive flipbook scenes: pre-rendered frames advanced at a fixed
//! rate in sync with an audio track, split into slices whose outcome depends
//! on how long the player touches the hotspot regions of each frame.
//!
//! Built on:
//! - **raylib** for windowing, textures, input and audio
//! - **bevy_ecs** for the world, resources, systems and observers
//!
//! # Main Loop
//!
//! 1. Load `config.ini`, open the window, create the ECS world and resources
//! 2. Start the audio thread and load the progress file
//! 3. Register observers and the state hooks, then enter `Setup`
//! 4. Each frame: input, state transitions, audio sync, playback ticks,
//!    score indicators, render
//! 5. Leave when the window closes or the game reaches `Quitting`
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scene Intro
//! cargo run -- --build-slices assets/scenes/Intro
//! ```

// Do not create console on Windows
#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod authoring;
mod components;
mod events;
mod game;
mod resources;
mod systems;

use crate::components::persistent::Persistent;
use crate::events::gamestate::{GameStateChangedEvent, observe_gamestate_change_event};
use crate::events::playback::{flipbook_finished_observer, slice_entered_observer};
use crate::events::switchdebug::switch_debug_observer;
use crate::resources::audio::{setup_audio, shutdown_audio};
use crate::resources::audioclock::AudioClock;
use crate::resources::gameconfig::GameConfig;
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::input::InputState;
use crate::resources::progress::ProgressStore;
use crate::resources::rendertarget::RenderTarget;
use crate::resources::scene::SceneRequest;
use crate::resources::screensize::ScreenSize;
use crate::resources::systemsstore::SystemsStore;
use crate::resources::texturestore::TextureStore;
use crate::resources::windowsize::WindowSize;
use crate::resources::worldtime::WorldTime;
use crate::systems::audio::{
    forward_audio_cmds, poll_audio_messages, update_audio_clock, update_bevy_audio_cmds,
    update_bevy_audio_messages,
};
use crate::systems::gameconfig::apply_gameconfig_changes;
use crate::systems::gamestate::{check_pending_state, state_is_playing};
use crate::systems::input::update_input_state;
use crate::systems::playback::{advance_tick_clock, playback_system};
use crate::systems::render::render_system;
use crate::systems::scoreindicator::score_indicator_system;
use crate::systems::time::update_world_time;
use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use clap::Parser;
use std::path::{Path, PathBuf};

/// Flipbook player
#[derive(Parser)]
#[command(version, about = "Interactive flipbook player")]
struct Cli {
    /// Configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// Scene to start with, overriding `[playback] start_scene`.
    #[arg(long, value_name = "NAME")]
    scene: Option<String>,

    /// Derive the slice table of a scene from its slices.txt and exit.
    #[arg(long, value_name = "SCENE_DIR")]
    build_slices: Option<PathBuf>,

    /// Add every slice of a scene to the progress file as not collected and exit.
    #[arg(long, value_name = "SCENE_DIR")]
    init_progress: Option<PathBuf>,

    /// Remove every slice of a scene from the progress file and exit.
    #[arg(long, value_name = "SCENE_DIR")]
    clear_progress: Option<PathBuf>,
}

fn run_tool<T: std::fmt::Display>(
    what: &str,
    dir: &Path,
    result: Result<T, Box<dyn std::error::Error>>,
) {
    match result {
        Ok(count) => println!("{}: {} slices in {}", what, count, dir.display()),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn register_hook<M>(
    world: &mut World,
    store: &mut SystemsStore,
    name: &str,
    system: impl IntoSystem<(), (), M> + 'static,
) {
    // registered systems are entities: keep them across scene changes
    let id = world.register_system(system);
    world.entity_mut(id.entity()).insert(Persistent);
    store.insert(name, id);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = GameConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        log::warn!("{}; using defaults", e);
    }

    // Early-exit authoring tools (no window/audio needed)
    if let Some(dir) = cli.build_slices {
        run_tool("Built", &dir, authoring::build_slices(&dir));
        return;
    }
    if let Some(dir) = cli.init_progress {
        run_tool(
            "Initialized",
            &dir,
            authoring::init_progress(&dir, &config.save_path),
        );
        return;
    }
    if let Some(dir) = cli.clear_progress {
        run_tool(
            "Cleared",
            &dir,
            authoring::clear_progress(&dir, &config.save_path),
        );
        return;
    }

    log::info!("Starting flipbook player");
    // --------------- Raylib window ---------------
    let (window_width, window_height) = config.window_size();
    let (mut rl, thread) = raylib::init()
        .size(window_width as i32, window_height as i32)
        .resizable()
        .title("Flipbook")
        .build();
    rl.set_target_fps(config.target_fps);
    // Escape is handled by the game
    rl.set_exit_key(None);

    // resized to the frame size of each scene on load
    let render_target = RenderTarget::new(&mut rl, &thread, window_width, window_height)
        .expect("Failed to create render target");

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    world.insert_resource(WorldTime::default());
    world.insert_resource(ScreenSize {
        w: window_width as i32,
        h: window_height as i32,
    });
    world.insert_resource(WindowSize {
        w: rl.get_screen_width(),
        h: rl.get_screen_height(),
    });
    world.insert_resource(InputState::default());
    world.insert_resource(AudioClock::default());
    world.insert_resource(ProgressStore::load(&config.save_path));
    if let Some(name) = cli.scene {
        world.insert_resource(SceneRequest { name });
    }
    world.insert_resource(config);

    // sets up AudioBridge and the audio message queues; must go before the hooks run
    setup_audio(&mut world);

    world.insert_resource(GameState::new());
    world.insert_resource(NextGameState::new());
    world.insert_non_send_resource(TextureStore::new());
    world.insert_non_send_resource(render_target);
    world.insert_non_send_resource(rl);
    world.insert_non_send_resource(thread);

    world.spawn((Observer::new(observe_gamestate_change_event), Persistent));
    world.spawn((Observer::new(switch_debug_observer), Persistent));
    world.spawn((Observer::new(slice_entered_observer), Persistent));
    world.spawn((Observer::new(flipbook_finished_observer), Persistent));

    // Game state systems store
    let mut systems_store = SystemsStore::new();
    register_hook(&mut world, &mut systems_store, "setup", game::setup);
    register_hook(&mut world, &mut systems_store, "enter_play", game::enter_play);
    register_hook(&mut world, &mut systems_store, "leave_scene", game::leave_scene);
    register_hook(&mut world, &mut systems_store, "quit_game", game::quit_game);
    world.insert_resource(systems_store);

    // Ensure the observers are registered before anything triggers events.
    world.flush();

    world.resource_mut::<NextGameState>().set(GameStates::Setup);
    world.trigger(GameStateChangedEvent {}); // enter Setup immediately
    world.flush();

    let mut update = Schedule::default();
    update.add_systems(apply_gameconfig_changes);
    update.add_systems(update_input_state);
    update.add_systems(check_pending_state.after(update_input_state));
    update.add_systems(
        (game::update)
            .run_if(state_is_playing)
            .after(update_input_state)
            .before(check_pending_state),
    );
    update.add_systems(
        (
            update_audio_clock,
            advance_tick_clock,
            playback_system.run_if(state_is_playing),
            score_indicator_system,
        )
            .chain()
            .after(check_pending_state),
    );
    update.add_systems(
        // audio systems must be together
        (
            // First, advance AudioCmd messages and forward them to the audio thread
            update_bevy_audio_cmds,
            forward_audio_cmds,
            // Then, pull audio thread messages and advance them
            poll_audio_messages,
            update_bevy_audio_messages,
        )
            .chain()
            .after(playback_system),
    );
    update.add_systems(render_system.after(score_indicator_system));

    update
        .initialize(&mut world)
        .expect("Failed to initialize schedule");

    // --------------- Main loop ---------------
    while !world
        .non_send_resource::<raylib::RaylibHandle>()
        .window_should_close()
        && world.resource::<GameState>().get() != &GameStates::Quitting
    {
        let dt = world
            .non_send_resource::<raylib::RaylibHandle>()
            .get_frame_time();
        update_world_time(&mut world, dt);

        update.run(&mut world);

        world.clear_trackers();

        // Update window size each frame (may change due to resize)
        let (new_w, new_h) = {
            let rl = world.non_send_resource::<raylib::RaylibHandle>();
            (rl.get_screen_width(), rl.get_screen_height())
        };
        {
            let mut window_size = world.resource_mut::<WindowSize>();
            window_size.w = new_w;
            window_size.h = new_h;
        }
    }
    if let Err(e) = world.resource::<ProgressStore>().flush() {
        log::error!("{}", e);
    }
    shutdown_audio(&mut world);
}
