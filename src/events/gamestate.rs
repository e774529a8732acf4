//! Game state transition event and observer.
//!
//! Systems request a change of [`GameStates`] by updating [`NextGameState`].
//! Emitting a [`GameStateChangedEvent`] then triggers the observer in this
//! module, which applies the transition to [`GameState`] and runs the exit and
//! enter hooks stored in [`crate::resources::systemsstore::SystemsStore`].
//!
//! Hooks by state:
//! - leaving `Playing`: `"leave_scene"`
//! - entering `Setup`: `"setup"` (loads the requested scene)
//! - entering `Playing`: `"enter_play"`
//! - entering `Quitting`: `"quit_game"`
use crate::resources::gamestate::NextGameStates::{Pending, Unchanged};
use crate::resources::gamestate::{GameState, GameStates, NextGameState};
use crate::resources::systemsstore::SystemsStore;
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, error, info, warn};

/// Event used to indicate that a pending game state transition should be
/// applied.
#[derive(Event, Debug, Clone, Copy)]
pub struct GameStateChangedEvent {}

/// Observer that applies a pending game state transition.
///
/// If [`NextGameState`] is pending, the new value is copied into
/// [`GameState`], the exit hook of the old state and the enter hook of the new
/// state are queued, and the request is cleared. Missing resources are logged.
pub fn observe_gamestate_change_event(
    _trigger: On<GameStateChangedEvent>,
    mut commands: Commands,
    mut next_game_state: Option<ResMut<NextGameState>>,
    mut game_state: Option<ResMut<GameState>>,
    systems_store: Res<SystemsStore>,
) {
    debug!("GameStateChangedEvent triggered");

    if let (Some(next_game_state), Some(game_state)) =
        (next_game_state.as_deref_mut(), game_state.as_deref_mut())
    {
        let next_state_value = next_game_state.get().clone();
        match next_state_value {
            Pending(new_state) => {
                let old_state = game_state.get().clone();
                info!("Transitioning from {:?} to {:?}", old_state, new_state);
                game_state.set(new_state.clone());
                next_game_state.reset();
                on_state_exit(&old_state, &mut commands, &systems_store);
                on_state_enter(&new_state, &mut commands, &systems_store);
            }
            Unchanged => {
                debug!("No state change pending.");
            }
        }
    } else {
        warn!(
            "One or more resources missing in observe_gamestate_change_event. next_state: {:?}, game_state: {:?}",
            next_game_state.is_some(),
            game_state.is_some()
        );
    }
}

fn run_hook(name: &str, commands: &mut Commands, systems_store: &SystemsStore) {
    match systems_store.get(name) {
        Some(id) => commands.run_system(*id),
        None => error!("System '{}' not found in SystemsStore", name),
    }
}

/// Internal: run state-specific "enter" systems for the given state.
fn on_state_enter(state: &GameStates, commands: &mut Commands, systems_store: &SystemsStore) {
    match state {
        GameStates::None => debug!("Entered None state"),
        GameStates::Setup => run_hook("setup", commands, systems_store),
        GameStates::Playing => run_hook("enter_play", commands, systems_store),
        GameStates::Quitting => run_hook("quit_game", commands, systems_store),
    }
}

/// Internal: run state-specific "exit" systems for the given state.
fn on_state_exit(state: &GameStates, commands: &mut Commands, systems_store: &SystemsStore) {
    match state {
        GameStates::Playing => run_hook("leave_scene", commands, systems_store),
        other => debug!("Exited {:?} state", other),
    }
}
