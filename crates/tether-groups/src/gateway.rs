use async_trait::async_trait;
use tether_common::{Identity, ResolutionError};

use crate::handle::WindowHandle;

/// Access to peer runtime instances for windows this runtime does not own.
///
/// Every method is a network round-trip from the engine's point of view and
/// may suspend; the engine never holds registry state across these calls.
#[async_trait]
pub trait RemoteRuntimeGateway: Send + Sync {
    /// Build a proxy handle for a window owned by another runtime instance.
    async fn resolve_remote_window(
        &self,
        identity: &Identity,
    ) -> Result<WindowHandle, ResolutionError>;

    /// The other windows already grouped with `proxy` on its owning runtime.
    async fn list_group_members(
        &self,
        proxy: &WindowHandle,
    ) -> Result<Vec<WindowHandle>, ResolutionError>;

    /// Tell the owning runtime that `source` joined the group of `proxy`.
    /// Must be idempotent on the remote side.
    async fn register_proxy(
        &self,
        source: &WindowHandle,
        proxy: &WindowHandle,
    ) -> Result<(), ResolutionError>;

    /// Tell the owning runtime that `window` left the group it shared with
    /// `proxy`. Must be idempotent on the remote side.
    async fn release_proxy(
        &self,
        window: &Identity,
        proxy: &WindowHandle,
    ) -> Result<(), ResolutionError>;
}
