use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::errors::TransportError;
use crate::id::GroupId;
use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeReason {
    Join,
    Leave,
    Merge,
    Disband,
}

/// Which half of the payload describes the group named by `group_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupSide {
    Source,
    Target,
}

/// A `group-changed` notification for one group touched by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChangedEvent {
    pub group_id: GroupId,
    pub reason: ChangeReason,
    pub side: GroupSide,
    pub source_group: Vec<Identity>,
    pub source_window: Identity,
    pub target_group: Vec<Identity>,
    pub target_window: Identity,
}

#[derive(Serialize)]
struct WireEvent<'a> {
    topic: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    event: &'a GroupChangedEvent,
}

impl GroupChangedEvent {
    /// Membership of the group this event was emitted for.
    pub fn members(&self) -> &[Identity] {
        match self.side {
            GroupSide::Source => &self.source_group,
            GroupSide::Target => &self.target_group,
        }
    }

    /// Serialize with the `topic`/`type` envelope fields clients expect.
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::to_value(WireEvent {
            topic: "window",
            kind: "group-changed",
            event: self,
        })
        .unwrap_or(serde_json::Value::Null)
    }
}

/// Receives `group-changed` events from the grouping engine.
///
/// Implementations must not block: the engine publishes while it holds the
/// registry lock so that events stay in mutation order.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &GroupChangedEvent) -> Result<(), TransportError>;
}

/// Fan-out sink backed by a tokio broadcast channel.
pub struct BroadcastSink {
    sender: broadcast::Sender<GroupChangedEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GroupChangedEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: &GroupChangedEvent) -> Result<(), TransportError> {
        // No subscribers is not a delivery failure.
        let _ = self.sender.send(event.clone());
        Ok(())
    }
}

/// Point-to-point sink for a single subscriber with a bounded queue.
pub struct ChannelSink {
    name: String,
    sender: mpsc::Sender<GroupChangedEvent>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>, capacity: usize) -> (Self, mpsc::Receiver<GroupChangedEvent>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                name: name.into(),
                sender,
            },
            receiver,
        )
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, event: &GroupChangedEvent) -> Result<(), TransportError> {
        self.sender.try_send(event.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                TransportError::Rejected(format!("{} queue full", self.name))
            }
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed(self.name.clone()),
        })
    }
}
