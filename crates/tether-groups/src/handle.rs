use tether_common::{GroupId, Identity};

/// What the window directory knows about a live local window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub identity: Identity,
    /// Platform-stable token, used only for group fingerprints.
    pub native_key: String,
}

impl WindowInfo {
    pub fn new(identity: Identity, native_key: impl Into<String>) -> Self {
        Self {
            identity,
            native_key: native_key.into(),
        }
    }
}

/// A window as seen by the grouping engine: local, or a proxy for a window
/// owned by another runtime instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowHandle {
    pub identity: Identity,
    pub group_id: Option<GroupId>,
    pub is_proxy: bool,
    pub native_key: String,
}

impl WindowHandle {
    pub fn local(info: WindowInfo) -> Self {
        Self {
            identity: info.identity,
            group_id: None,
            is_proxy: false,
            native_key: info.native_key,
        }
    }

    pub fn proxy(identity: Identity, native_key: impl Into<String>) -> Self {
        Self {
            identity,
            group_id: None,
            is_proxy: true,
            native_key: native_key.into(),
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.group_id.is_some()
    }
}
