//! Wire protocol between the launcher and the feed service
//!
//! One JSON object per line in each direction. Requests and
//! notifications are tagged with a snake_case `type`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::host::LayoutParams;

/// Status reported once a bind succeeded
pub const STATUS_BOUND: i32 = 1;

/// Calls a launcher can make
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayRequest {
    WindowAttached {
        #[serde(default)]
        layout: LayoutParams,
        #[serde(default)]
        flags: i32,
    },
    WindowDetached {
        #[serde(default)]
        is_changing_configurations: bool,
    },
    StartScroll,
    OnScroll {
        progress: f32,
    },
    EndScroll,
    CloseOverlay {
        #[serde(default)]
        flags: i32,
    },
    OpenOverlay {
        #[serde(default)]
        flags: i32,
    },
    OnPause,
    OnResume,
    SetActivityState {
        #[serde(default)]
        flags: i32,
    },
    RequestVoiceDetection {
        #[serde(default)]
        start: bool,
    },
    HasOverlayContent,
    IsVoiceDetectionRunning,
    GetVoiceSearchLanguage,
    StartSearch {
        #[serde(default)]
        data: Option<Value>,
    },
    UnusedMethod,
}

impl OverlayRequest {
    /// Fixed answers for the query calls; `None` for calls that go to
    /// the control loop
    pub fn stub_reply(&self) -> Option<Value> {
        match self {
            OverlayRequest::HasOverlayContent => Some(json!(true)),
            OverlayRequest::IsVoiceDetectionRunning => Some(json!(false)),
            OverlayRequest::GetVoiceSearchLanguage => Some(json!("en")),
            OverlayRequest::StartSearch { .. } => Some(json!(false)),
            _ => None,
        }
    }
}

/// Messages pushed to the launcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayNotification {
    OverlayStatusChanged { status: i32 },
    OverlayScrollChanged { progress: f32 },
    Reply { value: Value },
    Error { message: String },
}

impl OverlayNotification {
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Split `closeOverlay`/`openOverlay` flags: bit 0 animates, the bits
/// from 2 up carry a duration in ms (0 = default)
pub fn decode_overlay_flags(flags: i32) -> (bool, Option<std::time::Duration>) {
    let animated = flags & 1 != 0;
    let duration_ms = (flags >> 2).max(0) as u64;
    let duration = (duration_ms > 0).then(|| std::time::Duration::from_millis(duration_ms));
    (animated, duration)
}
