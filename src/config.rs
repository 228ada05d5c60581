//! Service configuration
//!
//! Loaded from `$XDG_CONFIG_HOME/flick/feed.toml` (or
//! `~/.config/flick/feed.toml`). A missing default file means defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::input::SwipeConfig;

/// What a new bind does to a binding that is still in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebindPolicy {
    /// Detach the surface and reset the overlay before binding
    #[default]
    Detach,
    /// Keep surface and overlay state, only swap callback and layout
    Handoff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Socket the launcher connects to
    #[serde(default)]
    pub socket_path: Option<PathBuf>,

    /// Drag distance covering a full open/close (px)
    #[serde(default = "default_reference_extent")]
    pub reference_extent: f32,

    #[serde(default = "default_touch_slop")]
    pub touch_slop: f32,

    /// Release velocity that counts as a fling (px/ms)
    #[serde(default = "default_fling_velocity")]
    pub fling_velocity: f32,

    /// Programmatic close/open duration when the caller passes 0
    #[serde(default = "default_close_duration_ms")]
    pub close_duration_ms: u64,

    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    #[serde(default)]
    pub rebind_policy: RebindPolicy,
}

fn default_reference_extent() -> f32 { 1080.0 }
fn default_touch_slop() -> f32 { 8.0 }
fn default_fling_velocity() -> f32 { 1.0 }
fn default_close_duration_ms() -> u64 { 350 }
fn default_frame_interval_ms() -> u64 { 16 } // ~60 fps

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            socket_path: None,
            reference_extent: default_reference_extent(),
            touch_slop: default_touch_slop(),
            fling_velocity: default_fling_velocity(),
            close_duration_ms: default_close_duration_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            rebind_policy: RebindPolicy::default(),
        }
    }
}

impl FeedConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .ok()
            .map(|dir| dir.join("flick/feed.toml"))
    }

    /// Load `path`, or the default location when `None`. Only an
    /// explicitly requested file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => {
                    tracing::info!("No config location, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        match fs::read_to_string(&path) {
            Ok(contents) => {
                let config = Self::from_toml(&contents)?;
                tracing::info!("Loaded feed config from {:?}", path);
                Ok(config)
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No feed config at {:?}, using defaults", path);
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.reference_extent > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "reference_extent must be positive, got {}",
                self.reference_extent
            )));
        }
        if self.touch_slop < 0.0 {
            return Err(ConfigError::Invalid("touch_slop must not be negative".into()));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid("frame_interval_ms must be at least 1".into()));
        }
        Ok(())
    }

    /// Configured socket, else `$XDG_RUNTIME_DIR/flick-feed.sock`, else `/tmp`
    pub fn socket_path(&self) -> PathBuf {
        if let Some(path) = &self.socket_path {
            return path.clone();
        }
        std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
            .join("flick-feed.sock")
    }

    pub fn swipe_config(&self) -> SwipeConfig {
        SwipeConfig {
            touch_slop: self.touch_slop,
            fling_velocity: self.fling_velocity,
        }
    }

    pub fn close_duration(&self) -> Duration {
        Duration::from_millis(self.close_duration_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}
