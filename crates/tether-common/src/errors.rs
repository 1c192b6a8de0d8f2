use std::path::PathBuf;

use crate::id::GroupId;
use crate::identity::Identity;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// A window identity could not be turned into a handle, locally or remotely.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("window not found: {0}")]
    NotFound(Identity),

    #[error("runtime unreachable: {0}")]
    RuntimeUnreachable(String),

    #[error("timed out resolving {0}")]
    Timeout(Identity),

    #[error("remote runtime error: {0}")]
    Remote(String),
}

/// Delivery of a `group-changed` event to a subscriber failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("subscriber closed: {0}")]
    Closed(String),

    #[error("subscriber rejected event: {0}")]
    Rejected(String),
}

/// A registry state that must never be reachable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("{window} is a member of both {first} and {second}")]
    DuplicateMembership {
        window: Identity,
        first: GroupId,
        second: GroupId,
    },

    #[error("group {group} has {size} member(s)")]
    UndersizedGroup { group: GroupId, size: usize },

    #[error("{window} points at {group} but is not one of its members")]
    DanglingGroupId { window: Identity, group: GroupId },

    #[error("{window} is a member of {group} but carries no group id")]
    MissingGroupId { window: Identity, group: GroupId },
}

/// The only failure a caller of a grouping operation can observe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupingError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<ResolutionError> for TetherError {
    fn from(err: ResolutionError) -> Self {
        TetherError::Grouping(GroupingError::Resolution(err))
    }
}
