//! Save states and notifications

use serde::{Deserialize, Serialize};
use shared::error::AppError;

use crate::scope::ScopeKey;

/// Persistence state of one scoped value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    /// Nothing in flight (possibly an edit waiting for the debounce window)
    #[default]
    Idle,
    /// Persistence call in flight
    Saving,
    /// Last call succeeded
    Saved,
    /// Last call failed; the value was rolled back
    Error,
}

impl SaveState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Saved => "saved",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SaveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State transition broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEvent {
    pub key: ScopeKey,
    pub state: SaveState,
    /// Validation or persistence error behind the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AppError>,
}
