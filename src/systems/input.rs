//! Input systems.
//!
//! - [`update_input_state`] reads hardware input from Raylib each frame and
//!   writes the results into [`crate::resources::input::InputState`].
//! - F11 toggles the debug overlay via
//!   [`SwitchDebugEvent`](crate::events::switchdebug::SwitchDebugEvent).
use bevy_ecs::prelude::*;
use raylib::prelude::{MouseButton, RaylibHandle};

use crate::events::switchdebug::SwitchDebugEvent;
use crate::resources::input::{BoolState, InputState};
use crate::resources::screensize::ScreenSize;
use crate::resources::windowsize::WindowSize;

fn update_key(state: &mut BoolState, rl: &RaylibHandle) {
    state.active = rl.is_key_down(state.key_binding);
    state.just_pressed = rl.is_key_pressed(state.key_binding);
    state.just_released = rl.is_key_released(state.key_binding);
}

/// Poll Raylib for pointer and keyboard input and update `InputState`.
pub fn update_input_state(
    mut input: ResMut<InputState>,
    rl: NonSend<RaylibHandle>,
    window_size: Res<WindowSize>,
    screen_size: Res<ScreenSize>,
    mut commands: Commands,
) {
    update_key(&mut input.action_back, &rl);
    update_key(&mut input.mode_debug, &rl);
    if input.mode_debug.just_pressed {
        commands.trigger(SwitchDebugEvent {});
    }

    // first touch point wins over the mouse
    let (down, window_position) = if rl.get_touch_point_count() > 0 {
        (true, rl.get_touch_position(0))
    } else {
        (
            rl.is_mouse_button_down(MouseButton::MOUSE_BUTTON_LEFT),
            rl.get_mouse_position(),
        )
    };
    let position = window_size.window_to_game_pos(
        window_position,
        screen_size.w as u32,
        screen_size.h as u32,
    );
    input.update_pointer(down, window_position, position);
}
