pub mod errors;
pub mod events;
pub mod id;
pub mod identity;
pub mod mirror;

pub use errors::{
    ConfigError, GroupingError, InvariantViolation, ResolutionError, TetherError, TransportError,
};
pub use events::{
    BroadcastSink, ChangeReason, ChannelSink, EventSink, GroupChangedEvent, GroupSide,
};
pub use id::{new_id, GroupId};
pub use identity::Identity;
pub use mirror::GroupMirror;

pub type Result<T> = std::result::Result<T, TetherError>;
