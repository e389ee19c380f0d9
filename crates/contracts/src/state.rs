//! Lifecycle states shared between the channel and the watch face

use serde::{Deserialize, Serialize};

/// Data channel connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Whether the watch face is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityState {
    #[default]
    Hidden,
    Visible,
}

impl VisibilityState {
    pub fn is_visible(self) -> bool {
        self == VisibilityState::Visible
    }
}

impl From<bool> for VisibilityState {
    fn from(visible: bool) -> Self {
        if visible {
            VisibilityState::Visible
        } else {
            VisibilityState::Hidden
        }
    }
}

/// Interactive or low-power ambient rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientState {
    #[default]
    Interactive,
    Ambient,
}

impl AmbientState {
    pub fn is_ambient(self) -> bool {
        self == AmbientState::Ambient
    }
}

impl From<bool> for AmbientState {
    fn from(ambient: bool) -> Self {
        if ambient {
            AmbientState::Ambient
        } else {
            AmbientState::Interactive
        }
    }
}
