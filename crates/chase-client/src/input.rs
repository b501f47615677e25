//! Held controls, sampled once per frame.

use std::collections::VecDeque;

/// What the player is holding this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub back: bool,
    pub strafe_left: bool,
    pub strafe_right: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub crouch: bool,
    /// Edge-triggered: starts a wave if none is playing.
    pub wave: bool,
}

impl InputState {
    pub fn forward() -> Self {
        Self {
            forward: true,
            ..Self::default()
        }
    }
}

/// Anything that can be asked for the current controls.
pub trait InputSource {
    fn poll(&mut self) -> InputState;
}

impl<F: FnMut() -> InputState> InputSource for F {
    fn poll(&mut self) -> InputState {
        self()
    }
}

/// Plays back a fixed list of frames, then holds nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    frames: VecDeque<InputState>,
}

impl ScriptedInput {
    pub fn new(frames: impl IntoIterator<Item = InputState>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// `input` held for `frames` frames.
    pub fn hold(input: InputState, frames: usize) -> Self {
        Self::new(std::iter::repeat_n(input, frames))
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> InputState {
        self.frames.pop_front().unwrap_or_default()
    }
}
