#![forbid(unsafe_code)]

//! Unified error type for the workspace facade.
//!
//! Loader rejections are not errors at this level: they come back inside
//! [`OpenOutcome::Rejected`](blade_stack::OpenOutcome::Rejected) so callers
//! can ignore them the way a fire-and-forget UI does.

use std::fmt;

use blade_core::{BladeType, ConfigError};

/// Errors surfaced by [`Workspace`](crate::Workspace).
#[derive(Debug)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    Config(ConfigError),
    /// The registry for this blade family is not mounted.
    RegistryMissing(BladeType),
    /// No blade with this id in the named registry.
    UnknownBlade { kind: BladeType, id: String },
}

/// Standard result type for the facade.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::RegistryMissing(kind) => write!(f, "{kind} blade registry is not mounted"),
            Self::UnknownBlade { kind, id } => write!(f, "no {kind} blade with id {id:?}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::RegistryMissing(_) | Self::UnknownBlade { .. } => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
