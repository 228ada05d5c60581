//! Input handling - touch samples and swipe detection
//!
//! This module provides:
//! - Motion samples shared by real touch and remote scroll calls
//! - The swipe detector that turns samples into drag events
//! - A scripted gesture source for deterministic tests

#[cfg(test)]
mod scripted;
mod swipe;
mod touch;

#[cfg(test)]
pub use scripted::*;
pub use swipe::*;
pub use touch::*;
