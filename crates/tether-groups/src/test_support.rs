//! Test doubles shared by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tether_common::{
    ChangeReason, EventSink, GroupChangedEvent, Identity, ResolutionError, TransportError,
};
use tokio::sync::Notify;

use crate::directory::LocalWindows;
use crate::engine::GroupingEngine;
use crate::gateway::RemoteRuntimeGateway;
use crate::handle::WindowHandle;

pub fn id(name: &str) -> Identity {
    Identity::new("app", name)
}

pub fn remote(name: &str) -> Identity {
    Identity::new("remote", name)
}

/// Sink that keeps every event it receives.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<GroupChangedEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<GroupChangedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reasons(&self) -> Vec<ChangeReason> {
        self.events().iter().map(|e| e.reason).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: &GroupChangedEvent) -> Result<(), TransportError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Sink that always fails.
pub struct BrokenSink;

impl EventSink for BrokenSink {
    fn publish(&self, _event: &GroupChangedEvent) -> Result<(), TransportError> {
        Err(TransportError::Closed("broken".into()))
    }
}

/// Scriptable remote runtime.
#[derive(Default)]
pub struct FakeGateway {
    windows: HashMap<Identity, String>,
    groups: HashMap<Identity, Vec<WindowHandle>>,
    gate: Option<Arc<Notify>>,
    hang: bool,
    fail_register: bool,
    closed: Mutex<HashSet<Identity>>,
    pub resolve_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub registrations: Mutex<Vec<(Identity, Identity)>>,
    pub releases: Mutex<Vec<(Identity, Identity)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, identity: Identity, native_key: &str) -> Self {
        self.windows.insert(identity, native_key.to_string());
        self
    }

    /// Windows already grouped with `identity` on the remote side.
    pub fn with_group(mut self, identity: Identity, others: &[(Identity, &str)]) -> Self {
        let members = others
            .iter()
            .map(|(id, key)| WindowHandle::proxy(id.clone(), *key))
            .collect();
        self.groups.insert(identity, members);
        self
    }

    /// Resolution waits until the gate is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Resolution never completes.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn failing_registration(mut self) -> Self {
        self.fail_register = true;
        self
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.lock().unwrap().len()
    }

    /// Distinct `(source, proxy)` registrations received so far.
    pub fn registered_pairs(&self) -> HashSet<(Identity, Identity)> {
        self.registrations.lock().unwrap().iter().cloned().collect()
    }

    pub fn released(&self) -> Vec<(Identity, Identity)> {
        self.releases.lock().unwrap().clone()
    }

    /// The remote window closes: later resolutions report it missing.
    pub fn close(&self, identity: Identity) {
        self.closed.lock().unwrap().insert(identity);
    }
}

#[async_trait]
impl RemoteRuntimeGateway for FakeGateway {
    async fn resolve_remote_window(
        &self,
        identity: &Identity,
    ) -> Result<WindowHandle, ResolutionError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.closed.lock().unwrap().contains(identity) {
            return Err(ResolutionError::NotFound(identity.clone()));
        }
        self.windows
            .get(identity)
            .map(|key| WindowHandle::proxy(identity.clone(), key.clone()))
            .ok_or_else(|| ResolutionError::RuntimeUnreachable(identity.owner_id.clone()))
    }

    async fn list_group_members(
        &self,
        proxy: &WindowHandle,
    ) -> Result<Vec<WindowHandle>, ResolutionError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.get(&proxy.identity).cloned().unwrap_or_default())
    }

    async fn register_proxy(
        &self,
        source: &WindowHandle,
        proxy: &WindowHandle,
    ) -> Result<(), ResolutionError> {
        if self.fail_register {
            return Err(ResolutionError::Remote("registration refused".into()));
        }
        self.registrations
            .lock()
            .unwrap()
            .push((source.identity.clone(), proxy.identity.clone()));
        Ok(())
    }

    async fn release_proxy(
        &self,
        window: &Identity,
        proxy: &WindowHandle,
    ) -> Result<(), ResolutionError> {
        self.releases
            .lock()
            .unwrap()
            .push((window.clone(), proxy.identity.clone()));
        Ok(())
    }
}

/// An engine over local windows `names`, recording its events.
pub async fn engine_with(names: &[&str]) -> (GroupingEngine, Arc<LocalWindows>, Arc<RecordingSink>) {
    let windows = Arc::new(LocalWindows::new());
    for name in names {
        windows.open(id(name), format!("0x{name}"));
    }
    let engine = GroupingEngine::new(windows.clone());
    let sink = Arc::new(RecordingSink::default());
    engine.subscribe(sink.clone()).await;
    (engine, windows, sink)
}

/// Like `engine_with`, plus a remote gateway.
pub async fn remote_engine_with(
    names: &[&str],
    gateway: Arc<FakeGateway>,
) -> (GroupingEngine, Arc<RecordingSink>) {
    let windows = Arc::new(LocalWindows::new());
    for name in names {
        windows.open(id(name), format!("0x{name}"));
    }
    let engine = GroupingEngine::new(windows).with_gateway(gateway);
    let sink = Arc::new(RecordingSink::default());
    engine.subscribe(sink.clone()).await;
    (engine, sink)
}
