//! Error types for the crate's fallible boundaries.
//!
//! The simulation itself never fails: stale ids are no-ops. Errors only come
//! from session storage and from loading a tuning document.

use std::fmt;

/// Session storage failure
#[derive(Debug)]
pub enum SessionError {
    /// No storage backend is reachable (no window, storage disabled, private mode).
    Unavailable,
    /// The player never configured an avatar; the caller should route to setup.
    MissingAvatar,
    /// The backend rejected a write.
    WriteRejected {
        /// Storage key that failed.
        key: &'static str,
    },
    /// A stored record could not be encoded or decoded.
    Serde(serde_json::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Unavailable => write!(f, "session storage is unavailable"),
            SessionError::MissingAvatar => write!(f, "no player avatar configured"),
            SessionError::WriteRejected { key } => {
                write!(f, "session storage rejected write to '{}'", key)
            }
            SessionError::Serde(e) => write!(f, "session record encoding failed: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Serde(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(e: serde_json::Error) -> Self {
        SessionError::Serde(e)
    }
}

/// Rejected tuning document
#[derive(Debug)]
pub enum TuningError {
    /// JSON could not be parsed into a [`crate::Tuning`].
    Parse(serde_json::Error),
    /// The archetype table is empty, so nothing could ever spawn.
    NoArchetypes,
    /// A min/max pair is inverted.
    InvertedRange {
        /// Which value (for logging).
        name: String,
        min: f32,
        max: f32,
    },
    /// A period, cap or speed that must be positive is not.
    NotPositive {
        /// Which value (for logging).
        name: &'static str,
        value: f64,
    },
    /// A delay, radius or range bound that must not be negative is.
    Negative {
        /// Which value (for logging).
        name: String,
        value: f64,
    },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "invalid tuning JSON: {}", e),
            TuningError::NoArchetypes => write!(f, "tuning has no enemy archetypes"),
            TuningError::InvertedRange { name, min, max } => {
                write!(f, "range '{}' is inverted: min {} > max {}", name, min, max)
            }
            TuningError::NotPositive { name, value } => {
                write!(f, "'{}' must be positive, got {}", name, value)
            }
            TuningError::Negative { name, value } => {
                write!(f, "'{}' must not be negative, got {}", name, value)
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}
