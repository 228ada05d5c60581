//! Error types for the feed overlay service

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the overlay state machine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("drag ended without an armed transition")]
    Unarmed,

    #[error("a drag is in progress")]
    DragInProgress,
}

/// Failures reported by the host window system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("surface attach failed: {0}")]
    Attach(String),

    #[error("surface detach failed: {0}")]
    Detach(String),
}

/// Errors raised while handling a remote call.
///
/// None of these cross the binding: the bridge logs them and keeps its
/// last good state.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("no client is bound")]
    NotBound,

    #[error("client {0} does not hold the binding")]
    NotOwner(u64),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] calloop::Error),

    #[error("control loop is gone")]
    Disconnected,

    #[error("socket {} is in use by another instance", .0.display())]
    SocketInUse(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
