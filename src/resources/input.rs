//! Per-frame input resource.
//!
//! Captures the pointer (left mouse button or first touch point) in frame
//! space and the few keys the player uses. Pointer input is only reported as
//! active once it has been armed: after a scene starts, a pointer that is
//! still resting where it was when the scene was entered is ignored, so a
//! touch left over from the previous scene does not count as a hit.
use bevy_ecs::prelude::*;
use raylib::prelude::*;

#[derive(Debug, Clone, Copy)]
/// Boolean key state with an associated keyboard binding.
pub struct BoolState {
    /// Whether the key is currently active/pressed this frame.
    pub active: bool,
    /// Whether the key was just pressed this frame.
    pub just_pressed: bool,
    /// Whether the key was just released this frame.
    pub just_released: bool,

    /// The key bound to this action.
    pub key_binding: KeyboardKey,
}

impl Default for BoolState {
    fn default() -> Self {
        Self::bound(KeyboardKey::KEY_NULL)
    }
}

impl BoolState {
    pub fn bound(key_binding: KeyboardKey) -> Self {
        Self {
            active: false,
            just_pressed: false,
            just_released: false,
            key_binding,
        }
    }
}

/// Pointer state for the current frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerState {
    /// Mouse button or touch is held.
    pub down: bool,
    /// Position in window pixels.
    pub window_position: Vector2,
    /// Position in frame space (letterbox removed).
    pub position: Vector2,
    armed: bool,
    armed_at: Option<Vector2>,
}

#[derive(Resource, Debug, Clone)]
pub struct InputState {
    pub pointer: PointerState,
    /// Leave the experience (default: Escape).
    pub action_back: BoolState,
    /// Toggle the debug overlay (default: F11).
    pub mode_debug: BoolState,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            pointer: PointerState {
                armed: true,
                ..PointerState::default()
            },
            action_back: BoolState::bound(KeyboardKey::KEY_ESCAPE),
            mode_debug: BoolState::bound(KeyboardKey::KEY_F11),
        }
    }
}

impl InputState {
    /// Frame-space pointer position while the pointer is held and armed.
    pub fn active_pointer(&self) -> Option<Vector2> {
        (self.pointer.down && self.pointer.armed).then_some(self.pointer.position)
    }

    /// Ignore the pointer until it leaves its current window position.
    pub fn disarm(&mut self) {
        self.pointer.armed = false;
        self.pointer.armed_at = Some(self.pointer.window_position);
    }

    pub fn is_armed(&self) -> bool {
        self.pointer.armed
    }

    /// Record this frame's pointer sample.
    pub fn update_pointer(&mut self, down: bool, window_position: Vector2, position: Vector2) {
        let pointer = &mut self.pointer;
        pointer.down = down;
        pointer.window_position = window_position;
        pointer.position = position;
        if !pointer.armed {
            let moved = pointer
                .armed_at
                .map(|at| at.x != window_position.x || at.y != window_position.y)
                .unwrap_or(true);
            if moved {
                pointer.armed = true;
                pointer.armed_at = None;
            }
        }
    }
}
