//! Session state container and the reducer that folds node replies into it.

use std::{collections::BTreeMap, fmt, str::FromStr};

use node_client::NodeReply;
use shared::{
    domain::{Block, NodePort},
    error::{NodeFailure, PanelError},
    protocol::{
        ChainResponse, MessageResponse, MineResponse, NodeMessage, RegisterNodesResponse,
        ResolveResponse,
    },
};

pub const TRANSACTION_FALLBACK: &str = "Transaction added successfully!";
pub const MINE_FALLBACK: &str = "Block mined successfully!";
pub const RESOLVE_FALLBACK: &str = "Conflicts resolved successfully!";
pub const REGISTER_FALLBACK: &str = "Nodes registered successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingField {
    Sender,
    Recipient,
    Amount,
}

impl FromStr for PendingField {
    type Err = PanelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sender" => Ok(Self::Sender),
            "recipient" => Ok(Self::Recipient),
            "amount" => Ok(Self::Amount),
            other => Err(PanelError::UnknownField(other.to_string())),
        }
    }
}

/// Form buffer for the next transaction. Empty fields are valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingTransaction {
    pub sender: String,
    pub recipient: String,
    pub amount: String,
}

impl PendingTransaction {
    pub fn set(&mut self, field: PendingField, value: impl Into<String>) {
        let slot = match field {
            PendingField::Sender => &mut self.sender,
            PendingField::Recipient => &mut self.recipient,
            PendingField::Amount => &mut self.amount,
        };
        *slot = value.into();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub outcome: Outcome,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Success,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Failure,
            text: text.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failure
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Success => f.write_str(&self.text),
            Outcome::Failure => write!(f, "error: {}", self.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeAvailability {
    Reachable { blocks: usize },
    Unreachable(String),
}

/// Which session fields an outcome touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    Status,
    Chain,
    Availability,
}

#[derive(Debug, Clone)]
pub enum ActionOutcome {
    TransactionSubmitted(NodeReply<MessageResponse>),
    BlockMined(NodeReply<MineResponse>),
    ConflictsResolved(NodeReply<ResolveResponse>),
    ChainFetched {
        port: NodePort,
        reply: NodeReply<ChainResponse>,
    },
    PeersRegistered(NodeReply<RegisterNodesResponse>),
    MeshConnected {
        total: usize,
        failures: Vec<(NodePort, NodeFailure)>,
    },
    NodesScanned(Vec<(NodePort, NodeAvailability)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub selected_port: NodePort,
    pub pending_transaction: PendingTransaction,
    pub status: Option<StatusMessage>,
    pub chain_snapshot: Vec<Block>,
    /// Node the current snapshot was fetched from.
    pub chain_source: Option<NodePort>,
    pub node_availability: BTreeMap<NodePort, NodeAvailability>,
}

impl SessionState {
    pub fn new(selected_port: NodePort) -> Self {
        Self {
            selected_port,
            pending_transaction: PendingTransaction::default(),
            status: None,
            chain_snapshot: Vec::new(),
            chain_source: None,
            node_availability: BTreeMap::new(),
        }
    }

    pub fn apply(&mut self, outcome: ActionOutcome) -> Vec<SessionChange> {
        match outcome {
            ActionOutcome::TransactionSubmitted(reply) => {
                self.set_status(reply_status(&reply, TRANSACTION_FALLBACK))
            }
            ActionOutcome::BlockMined(reply) => {
                self.set_status(reply_status(&reply, MINE_FALLBACK))
            }
            ActionOutcome::ConflictsResolved(reply) => {
                self.set_status(reply_status(&reply, RESOLVE_FALLBACK))
            }
            ActionOutcome::PeersRegistered(reply) => {
                self.set_status(reply_status(&reply, REGISTER_FALLBACK))
            }
            ActionOutcome::ChainFetched { port, reply } => match reply {
                NodeReply::Success(body) => {
                    self.chain_snapshot = body.chain;
                    self.chain_source = Some(port);
                    vec![SessionChange::Chain]
                }
                NodeReply::Failure(failure) => {
                    self.set_status(StatusMessage::failure(failure.display_text()))
                }
            },
            ActionOutcome::MeshConnected { total, failures } => {
                let status = if failures.is_empty() {
                    StatusMessage::success(format!("Connected {total} nodes into a full mesh"))
                } else {
                    let failed = failures
                        .iter()
                        .map(|(port, failure)| format!("{port}: {}", failure.display_text()))
                        .collect::<Vec<_>>()
                        .join("; ");
                    StatusMessage::failure(format!(
                        "Registered peers on {} of {total} nodes ({failed})",
                        total - failures.len()
                    ))
                };
                self.set_status(status)
            }
            ActionOutcome::NodesScanned(results) => {
                let total = results.len();
                self.node_availability = results.into_iter().collect();
                let reachable = self
                    .node_availability
                    .values()
                    .filter(|availability| {
                        matches!(availability, NodeAvailability::Reachable { .. })
                    })
                    .count();
                let mut changes = self.set_status(StatusMessage::success(format!(
                    "{reachable} of {total} nodes reachable"
                )));
                changes.push(SessionChange::Availability);
                changes
            }
        }
    }

    fn set_status(&mut self, status: StatusMessage) -> Vec<SessionChange> {
        self.status = Some(status);
        vec![SessionChange::Status]
    }
}

fn reply_status<T: NodeMessage>(reply: &NodeReply<T>, fallback: &str) -> StatusMessage {
    match reply {
        NodeReply::Success(body) => StatusMessage::success(body.message().unwrap_or(fallback)),
        NodeReply::Failure(failure) => StatusMessage::failure(failure.display_text()),
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
