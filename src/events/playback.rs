//! Playback events and observers.
//!
//! - [`SliceEnteredEvent`] fires every time a slice is (re)entered: at scene
//!   start, after a pass, a failure or a loop.
//! - [`FlipbookFinishedEvent`] fires once when the terminal slice of a scene
//!   ends. Its observer requests the next scene, or quits when the scene has
//!   no follow-up.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, info};

use crate::resources::gamestate::{GameStates, NextGameState};
use crate::resources::playback::Playback;
use crate::resources::scene::SceneRequest;
use crate::resources::slicetable::SliceTable;

#[derive(Event, Debug, Clone, Copy)]
pub struct SliceEnteredEvent {
    pub index: usize,
}

#[derive(Event, Debug, Clone)]
pub struct FlipbookFinishedEvent {
    /// Scene to load next, if any.
    pub loads_to: Option<String>,
}

/// Log slice entries with the budgets they start with.
pub fn slice_entered_observer(
    trigger: On<SliceEnteredEvent>,
    slices: Option<Res<SliceTable>>,
    playback: Option<Res<Playback>>,
) {
    let index = trigger.event().index;
    let Some(slice) = slices.as_deref().and_then(|s| s.get(index)) else {
        debug!("Entered slice {}", index);
        return;
    };
    match playback.as_deref() {
        Some(p) => info!(
            "Entered slice {} '{}' (frames {}..={}, loop chances {}, release chances {})",
            index,
            slice.name,
            slice.first_frame,
            slice.last_frame,
            p.loop_chances_to_use,
            p.release_chances_to_use
        ),
        None => info!("Entered slice {} '{}'", index, slice.name),
    }
}

/// Move on to the next scene, or quit when there is none.
pub fn flipbook_finished_observer(
    trigger: On<FlipbookFinishedEvent>,
    mut commands: Commands,
    mut next_state: ResMut<NextGameState>,
) {
    match trigger.event().loads_to.as_deref() {
        Some(name) if !name.is_empty() => {
            info!("Scene finished, loading '{}'", name);
            commands.insert_resource(SceneRequest {
                name: name.to_string(),
            });
            next_state.set(GameStates::Setup);
        }
        _ => {
            info!("Scene finished with no follow-up, quitting");
            next_state.set(GameStates::Quitting);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::gamestate::NextGameStates;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(NextGameState::new());
        world.add_observer(flipbook_finished_observer);
        world.flush();
        world
    }

    #[test]
    fn test_finished_with_next_scene_requests_setup() {
        let mut world = world();
        world.trigger(FlipbookFinishedEvent {
            loads_to: Some("Forest".into()),
        });
        world.flush();
        assert_eq!(
            world.resource::<NextGameState>().get(),
            &NextGameStates::Pending(GameStates::Setup)
        );
        assert_eq!(world.resource::<SceneRequest>().name, "Forest");
    }

    #[test]
    fn test_finished_without_next_scene_quits() {
        let mut world = world();
        world.trigger(FlipbookFinishedEvent { loads_to: None });
        world.flush();
        assert_eq!(
            world.resource::<NextGameState>().get(),
            &NextGameStates::Pending(GameStates::Quitting)
        );
        assert!(!world.contains_resource::<SceneRequest>());
    }
}
