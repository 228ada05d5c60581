//! Host window system seam
//!
//! The feed surface is added to and removed from the host window system
//! as the overlay opens and closes. What "adding" means is up to the
//! host; the bridge only tracks whether it is attached.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::HostError;

/// Surface layout handed over by the launcher on bind. Only the size is
/// interpreted here; everything else is passed through to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub trait SurfaceHost {
    fn attach(&mut self, layout: &LayoutParams) -> Result<(), HostError>;
    fn detach(&mut self) -> Result<(), HostError>;
}

/// Host for running without a window system: attach/detach are logged
#[derive(Debug, Default)]
pub struct HeadlessHost {
    attached: bool,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SurfaceHost for HeadlessHost {
    fn attach(&mut self, layout: &LayoutParams) -> Result<(), HostError> {
        self.attached = true;
        info!(width = ?layout.width, height = ?layout.height, "Feed surface attached");
        Ok(())
    }

    fn detach(&mut self) -> Result<(), HostError> {
        self.attached = false;
        info!("Feed surface detached");
        Ok(())
    }
}
