//! Error types for the simulation core and tuning loader
//!
//! The simulation has no I/O, so `SimError` only ever reports caller
//! mistakes (bad `dt`) or broken internal invariants.

use std::fmt;

/// Errors surfaced by [`crate::sim::tick`]
#[derive(Clone, Debug, PartialEq)]
pub enum SimError {
    /// `dt` was negative, NaN or infinite. The session is left untouched.
    InvalidDt { dt: f32 },
    /// Post-tick check found an entity in an impossible state
    InvariantViolated { entity_id: u32, reason: Invariant },
}

/// Which entity invariant failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Invariant {
    NonPositiveRadius,
    NonFinitePosition,
    NonFiniteVelocity,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveRadius => write!(f, "radius must be positive"),
            Self::NonFinitePosition => write!(f, "position is not finite"),
            Self::NonFiniteVelocity => write!(f, "velocity is not finite"),
        }
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDt { dt } => {
                write!(f, "invalid tick duration {dt}: must be finite and >= 0")
            }
            Self::InvariantViolated { entity_id, reason } => {
                write!(f, "invariant violated on entity {entity_id}: {reason}")
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Errors from loading or validating a [`crate::Tuning`]
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "tuning parse error: {e}"),
            Self::Invalid { field, reason } => write!(f, "invalid tuning `{field}`: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}
