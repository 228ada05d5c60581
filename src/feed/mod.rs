//! Feed overlay - committed states, playback and the swipe state machine

mod controller;
mod playback;
mod state;

pub use controller::*;
pub use playback::*;
pub use state::*;
