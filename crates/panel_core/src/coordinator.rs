//! Binds user actions to node calls and folds the replies into session state.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::future::join_all;
use node_client::{NodeApi, NodeReply};
use shared::{domain::NodePort, error::PanelError};
use tokio::{
    sync::{broadcast, Mutex},
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, info};

use crate::{
    config::NodeDirectory,
    session::{ActionOutcome, NodeAvailability, PendingField, SessionChange, SessionState},
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Submit,
    Mine,
    Resolve,
    RefreshChain,
    RegisterPeers,
    ConnectAll,
    Scan,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Mine => "mine",
            Self::Resolve => "resolve",
            Self::RefreshChain => "refresh_chain",
            Self::RegisterPeers => "register_peers",
            Self::ConnectAll => "connect_all",
            Self::Scan => "scan",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Submit,
    Mine,
    Resolve,
    RefreshChain,
    RegisterPeers(Vec<String>),
    ConnectAll,
    Scan,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Submit => ActionKind::Submit,
            Self::Mine => ActionKind::Mine,
            Self::Resolve => ActionKind::Resolve,
            Self::RefreshChain => ActionKind::RefreshChain,
            Self::RegisterPeers(_) => ActionKind::RegisterPeers,
            Self::ConnectAll => ActionKind::ConnectAll,
            Self::Scan => ActionKind::Scan,
        }
    }
}

/// Published after an outcome lands in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    pub action: ActionKind,
    pub port: NodePort,
    pub changes: Vec<SessionChange>,
}

struct InflightAction {
    generation: u64,
    abort: AbortHandle,
}

pub struct Coordinator<N: NodeApi + 'static> {
    node: Arc<N>,
    directory: Arc<NodeDirectory>,
    session: Arc<Mutex<SessionState>>,
    inflight: Arc<std::sync::Mutex<HashMap<ActionKind, InflightAction>>>,
    generation: Arc<AtomicU64>,
    events: broadcast::Sender<SessionEvent>,
}

impl<N: NodeApi + 'static> Clone for Coordinator<N> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            directory: Arc::clone(&self.directory),
            session: Arc::clone(&self.session),
            inflight: Arc::clone(&self.inflight),
            generation: Arc::clone(&self.generation),
            events: self.events.clone(),
        }
    }
}

impl<N: NodeApi + 'static> Coordinator<N> {
    pub fn new(node: Arc<N>, directory: NodeDirectory) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let session = SessionState::new(directory.default_port());
        Self {
            node,
            directory: Arc::new(directory),
            session: Arc::new(Mutex::new(session)),
            inflight: Arc::new(std::sync::Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    pub fn directory(&self) -> &NodeDirectory {
        &self.directory
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    pub async fn select_port(&self, port: NodePort) -> Result<(), PanelError> {
        if !self.directory.contains(port) {
            return Err(PanelError::UnknownPort(port.0));
        }
        self.session.lock().await.selected_port = port;
        debug!(%port, "selected node");
        Ok(())
    }

    pub async fn update_pending_field(&self, field: PendingField, value: impl Into<String>) {
        self.session
            .lock()
            .await
            .pending_transaction
            .set(field, value);
    }

    pub async fn submit(&self) -> SessionEvent {
        let (port, pending) = {
            let session = self.session.lock().await;
            (session.selected_port, session.pending_transaction.clone())
        };
        let reply = self
            .node
            .submit_transaction(&pending.sender, &pending.recipient, &pending.amount, port)
            .await;
        self.commit(
            ActionKind::Submit,
            port,
            ActionOutcome::TransactionSubmitted(reply),
        )
        .await
    }

    pub async fn mine(&self) -> SessionEvent {
        let port = self.selected_port().await;
        let reply = self.node.mine(port).await;
        self.commit(ActionKind::Mine, port, ActionOutcome::BlockMined(reply))
            .await
    }

    pub async fn resolve(&self) -> SessionEvent {
        let port = self.selected_port().await;
        let reply = self.node.resolve_conflicts(port).await;
        if let NodeReply::Success(body) = &reply {
            info!(%port, replaced = body.replaced(), "conflict resolution finished");
        }
        self.commit(
            ActionKind::Resolve,
            port,
            ActionOutcome::ConflictsResolved(reply),
        )
        .await
    }

    pub async fn refresh_chain(&self) -> SessionEvent {
        let port = self.selected_port().await;
        let reply = self.node.fetch_chain(port).await;
        self.commit(
            ActionKind::RefreshChain,
            port,
            ActionOutcome::ChainFetched { port, reply },
        )
        .await
    }

    pub async fn register_peers(&self, nodes: &[String]) -> SessionEvent {
        let port = self.selected_port().await;
        let reply = self.node.register_peers(nodes, port).await;
        self.commit(
            ActionKind::RegisterPeers,
            port,
            ActionOutcome::PeersRegistered(reply),
        )
        .await
    }

    /// Registers every other candidate node on each candidate node.
    pub async fn connect_all(&self) -> SessionEvent {
        let origin = self.selected_port().await;
        let ports = self.directory.ports();
        let mut failures = Vec::new();
        for &port in ports {
            let peers: Vec<String> = ports
                .iter()
                .filter(|&&peer| peer != port)
                .map(|&peer| self.node.node_url(peer))
                .collect();
            if let NodeReply::Failure(failure) = self.node.register_peers(&peers, port).await {
                failures.push((port, failure));
            }
        }
        info!(
            nodes = ports.len(),
            failed = failures.len(),
            "finished connecting node mesh"
        );
        self.commit(
            ActionKind::ConnectAll,
            origin,
            ActionOutcome::MeshConnected {
                total: ports.len(),
                failures,
            },
        )
        .await
    }

    /// Probes every candidate node with one chain fetch each, concurrently.
    pub async fn scan(&self) -> SessionEvent {
        let origin = self.selected_port().await;
        let probes = self.directory.ports().iter().map(|&port| async move {
            let availability = match self.node.fetch_chain(port).await {
                NodeReply::Success(body) => NodeAvailability::Reachable {
                    blocks: body.chain.len(),
                },
                NodeReply::Failure(failure) => {
                    NodeAvailability::Unreachable(failure.display_text())
                }
            };
            (port, availability)
        });
        let results = join_all(probes).await;
        self.commit(ActionKind::Scan, origin, ActionOutcome::NodesScanned(results))
            .await
    }

    pub async fn run(&self, action: Action) -> SessionEvent {
        match action {
            Action::Submit => self.submit().await,
            Action::Mine => self.mine().await,
            Action::Resolve => self.resolve().await,
            Action::RefreshChain => self.refresh_chain().await,
            Action::RegisterPeers(nodes) => self.register_peers(&nodes).await,
            Action::ConnectAll => self.connect_all().await,
            Action::Scan => self.scan().await,
        }
    }

    /// Runs `action` in the background. An outstanding action of the same
    /// kind is aborted and its reply is never applied.
    pub fn dispatch(&self, action: Action) -> JoinHandle<SessionEvent> {
        let kind = action.kind();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let this = self.clone();
        let handle = tokio::spawn(async move {
            let event = this.run(action).await;
            this.finish(kind, generation);
            event
        });

        let superseded = inflight.insert(
            kind,
            InflightAction {
                generation,
                abort: handle.abort_handle(),
            },
        );
        if let Some(previous) = superseded {
            previous.abort.abort();
            debug!(action = kind.as_str(), "superseded outstanding action");
        }
        handle
    }

    pub fn is_inflight(&self, kind: ActionKind) -> bool {
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&kind)
    }

    fn finish(&self, kind: ActionKind, generation: u64) {
        let mut inflight = self
            .inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if inflight.get(&kind).map(|entry| entry.generation) == Some(generation) {
            inflight.remove(&kind);
        }
    }

    async fn selected_port(&self) -> NodePort {
        self.session.lock().await.selected_port
    }

    async fn commit(
        &self,
        action: ActionKind,
        port: NodePort,
        outcome: ActionOutcome,
    ) -> SessionEvent {
        let changes = self.session.lock().await.apply(outcome);
        let event = SessionEvent {
            action,
            port,
            changes,
        };
        let _ = self.events.send(event.clone());
        event
    }
}

#[cfg(test)]
#[path = "tests/coordinator_tests.rs"]
mod tests;
