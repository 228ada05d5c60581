//! Flick feed - a launcher-driven swipe overlay
//!
//! - `input`: touch samples and swipe detection
//! - `feed`: the open/closed overlay state machine and its playback
//! - `bridge`: the launcher binding, its control thread and socket server
//! - `config`: service configuration

pub mod bridge;
pub mod config;
pub mod error;
pub mod feed;
pub mod input;

pub use bridge::{BridgeCall, BridgeHandle, ControlLoop, LauncherFeed, LocalInput};
pub use config::{FeedConfig, RebindPolicy};
pub use error::{BridgeError, ConfigError, FeedError, HostError};
pub use feed::{FeedController, FeedEvent, FeedState};
