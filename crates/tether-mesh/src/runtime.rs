//! One runtime instance: its open windows, grouping engine, and event feed.

use std::fmt;
use std::sync::Arc;

use tether_common::{BroadcastSink, GroupChangedEvent, Identity};
use tether_groups::{GroupingEngine, LocalWindows};
use tokio::sync::broadcast;
use tracing::debug;

pub struct Runtime {
    name: String,
    windows: Arc<LocalWindows>,
    engine: GroupingEngine,
    events: Arc<BroadcastSink>,
}

impl Runtime {
    pub(crate) fn new(
        name: String,
        windows: Arc<LocalWindows>,
        engine: GroupingEngine,
        events: Arc<BroadcastSink>,
    ) -> Self {
        Self {
            name,
            windows,
            engine,
            events,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn windows(&self) -> &LocalWindows {
        &self.windows
    }

    pub fn engine(&self) -> &GroupingEngine {
        &self.engine
    }

    /// Receive every `group-changed` event this runtime's engine publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<GroupChangedEvent> {
        self.events.subscribe()
    }

    /// Close a window hosted here, detaching it from its group first.
    /// Returns `false` if no such window was open.
    pub async fn close_window(&self, identity: &Identity) -> bool {
        if !self.windows.close(identity) {
            return false;
        }
        self.engine.window_closed(identity).await;
        debug!(runtime = %self.name, window = %identity, "window closed");
        true
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("name", &self.name)
            .field("open_windows", &self.windows.len())
            .finish_non_exhaustive()
    }
}
