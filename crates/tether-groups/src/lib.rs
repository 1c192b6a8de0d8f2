//! Window grouping for one runtime instance.
//!
//! The [`GroupRegistry`] owns group membership; the [`GroupingEngine`]
//! applies join / merge / leave on top of it, resolves windows owned by
//! other runtime instances through a [`RemoteRuntimeGateway`], and
//! publishes `group-changed` events to its subscribers.

pub mod directory;
pub mod engine;
pub mod gateway;
pub mod handle;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use directory::{LocalWindows, WindowDirectory};
pub use engine::GroupingEngine;
pub use gateway::RemoteRuntimeGateway;
pub use handle::{WindowHandle, WindowInfo};
pub use registry::GroupRegistry;
