//! Lookup of windows hosted by this runtime instance.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tether_common::Identity;

use crate::handle::WindowInfo;

/// Resolves identities to windows owned by the local runtime instance.
///
/// Window creation and destruction happen elsewhere; the engine only asks.
pub trait WindowDirectory: Send + Sync {
    fn lookup(&self, identity: &Identity) -> Option<WindowInfo>;
}

/// In-memory directory of open windows.
#[derive(Debug, Default)]
pub struct LocalWindows {
    windows: RwLock<HashMap<Identity, WindowInfo>>,
}

impl LocalWindows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open window. Reopening replaces the native key.
    pub fn open(&self, identity: Identity, native_key: impl Into<String>) {
        let info = WindowInfo::new(identity.clone(), native_key);
        self.windows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity, info);
    }

    /// Returns `true` if the window was open.
    pub fn close(&self, identity: &Identity) -> bool {
        self.windows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identity)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WindowDirectory for LocalWindows {
    fn lookup(&self, identity: &Identity) -> Option<WindowInfo> {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
    }
}
