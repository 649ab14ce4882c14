//! The runtime control set and the concurrent key-state map the physics
//! tick reads every frame.
//!
//! Grounded on the teacher's `runtime::Key`/`KeyEvent` enum
//! (`src/runtime.rs`), generalized from "whichever keys a given terminal
//! game binds" down to the five controls this spec names. Decoding actual
//! keyboard events into this set is the windowing shell's job (§1's "Out of
//! scope" list); this module only owns the shared flag table the physics
//! tick polls.

use std::sync::atomic::{AtomicBool, Ordering};

/// The five controls the physics tick understands. `SPRINT` held selects
/// `Player::RUN` over `Player::WALK` for this frame's speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Left,
    Right,
    Up,
    Down,
    Sprint,
}

const CONTROL_COUNT: usize = 5;

fn index_of(control: Control) -> usize {
    match control {
        Control::Left => 0,
        Control::Right => 1,
        Control::Up => 2,
        Control::Down => 3,
        Control::Sprint => 4,
    }
}

/// A concurrent `Control -> bool` mapping: written only by the input
/// handler (decoding keyboard events), read only by the physics tick. Five
/// independent flags rather than a locked `HashMap`, since the control set
/// is fixed and small.
#[derive(Debug, Default)]
pub struct KeyState {
    flags: [AtomicBool; CONTROL_COUNT],
}

impl KeyState {
    pub fn new() -> KeyState {
        KeyState {
            flags: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    pub fn set(&self, control: Control, pressed: bool) {
        self.flags[index_of(control)].store(pressed, Ordering::Relaxed);
    }

    pub fn is_pressed(&self, control: Control) -> bool {
        self.flags[index_of(control)].load(Ordering::Relaxed)
    }

    /// `(dx, dy)` unit-ish direction from the currently held movement keys,
    /// each axis in `{-1, 0, 1}`. Both opposite keys held cancels to 0.
    pub fn movement_axis(&self) -> (f32, f32) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        if self.is_pressed(Control::Left) {
            dx -= 1.0;
        }
        if self.is_pressed(Control::Right) {
            dx += 1.0;
        }
        if self.is_pressed(Control::Up) {
            dy -= 1.0;
        }
        if self.is_pressed(Control::Down) {
            dy += 1.0;
        }
        (dx, dy)
    }

    pub fn sprinting(&self) -> bool {
        self.is_pressed(Control::Sprint)
    }
}
