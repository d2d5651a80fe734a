use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{lenient_or_default, string_or_absent, Block, Transaction};

/// Response bodies that may carry a human-readable `message`.
pub trait NodeMessage {
    fn message(&self) -> Option<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterNodesResponse {
    #[serde(
        default,
        deserialize_with = "string_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub total_nodes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(
        default,
        deserialize_with = "string_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MineResponse {
    #[serde(
        default,
        deserialize_with = "string_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub index: Option<u64>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,
    #[serde(
        default,
        deserialize_with = "string_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_hash: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolveResponse {
    #[serde(
        default,
        deserialize_with = "string_or_absent",
        skip_serializing_if = "Option::is_none"
    )]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub chain: Option<Vec<Block>>,
    #[serde(
        default,
        deserialize_with = "lenient_or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub new_chain: Option<Vec<Block>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResolveResponse {
    /// The node reports a replaced chain under `new_chain`.
    pub fn replaced(&self) -> bool {
        self.new_chain.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub length: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

macro_rules! impl_node_message {
    ($($ty:ty),+ $(,)?) => {
        $(impl NodeMessage for $ty {
            fn message(&self) -> Option<&str> {
                self.message.as_deref()
            }
        })+
    };
}

impl_node_message!(
    RegisterNodesResponse,
    MessageResponse,
    MineResponse,
    ResolveResponse
);
