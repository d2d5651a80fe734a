use super::*;
use serde_json::{json, Map};
use shared::error::ErrorPayload;

fn message_reply(message: Option<&str>) -> NodeReply<MessageResponse> {
    NodeReply::Success(MessageResponse {
        message: message.map(str::to_string),
        extra: Map::new(),
    })
}

fn chain_of(indices: &[u64]) -> ChainResponse {
    let chain: Vec<Block> = indices
        .iter()
        .map(|index| Block {
            index: *index,
            previous_hash: Some(format!("hash-{index}")),
            proof: json!(index * 10),
            transactions: Vec::new(),
            timestamp: None,
        })
        .collect();
    ChainResponse {
        length: chain.len(),
        chain,
        extra: Map::new(),
    }
}

#[test]
fn pending_field_names_parse_case_insensitively() {
    assert_eq!("Sender".parse::<PendingField>().unwrap(), PendingField::Sender);
    assert_eq!(" amount ".parse::<PendingField>().unwrap(), PendingField::Amount);
    assert!(matches!(
        "memo".parse::<PendingField>(),
        Err(PanelError::UnknownField(field)) if field == "memo"
    ));
}

#[test]
fn pending_fields_are_set_independently() {
    let mut pending = PendingTransaction::default();
    pending.set(PendingField::Recipient, "B");
    assert_eq!(pending.sender, "");
    assert_eq!(pending.recipient, "B");
    assert_eq!(pending.amount, "");
}

#[test]
fn server_message_becomes_status_verbatim() {
    let mut state = SessionState::new(NodePort(5000));
    let changes = state.apply(ActionOutcome::TransactionSubmitted(message_reply(Some(
        "Transaction will be added to Block 3",
    ))));
    assert_eq!(changes, vec![SessionChange::Status]);
    assert_eq!(
        state.status,
        Some(StatusMessage::success("Transaction will be added to Block 3"))
    );
}

#[test]
fn missing_message_uses_action_fallback() {
    let mut state = SessionState::new(NodePort(5000));
    state.apply(ActionOutcome::TransactionSubmitted(message_reply(None)));
    assert_eq!(state.status, Some(StatusMessage::success(TRANSACTION_FALLBACK)));

    state.apply(ActionOutcome::ConflictsResolved(NodeReply::Success(
        ResolveResponse {
            message: None,
            chain: None,
            new_chain: None,
            extra: Map::new(),
        },
    )));
    assert_eq!(state.status, Some(StatusMessage::success(RESOLVE_FALLBACK)));
}

#[test]
fn failures_are_not_shown_with_success_fallback() {
    let mut state = SessionState::new(NodePort(5000));
    state.apply(ActionOutcome::BlockMined(NodeReply::Failure(
        NodeFailure::Transport("connection refused".into()),
    )));
    let status = state.status.clone().expect("status");
    assert!(status.is_failure());
    assert_eq!(status.text, "connection refused");
    assert_eq!(status.to_string(), "error: connection refused");
}

#[test]
fn mining_does_not_touch_chain_snapshot() {
    let mut state = SessionState::new(NodePort(5000));
    state.apply(ActionOutcome::ChainFetched {
        port: NodePort(5000),
        reply: NodeReply::Success(chain_of(&[1])),
    });
    state.apply(ActionOutcome::BlockMined(NodeReply::Success(MineResponse {
        message: Some("New block forged".into()),
        index: Some(2),
        transactions: Vec::new(),
        proof: Some(json!(35293)),
        previous_hash: Some("abc".into()),
        extra: Map::new(),
    })));
    assert_eq!(state.chain_snapshot.len(), 1);
    assert_eq!(state.status, Some(StatusMessage::success("New block forged")));
}

#[test]
fn chain_fetch_replaces_snapshot_wholesale() {
    let mut state = SessionState::new(NodePort(5000));
    state.apply(ActionOutcome::ChainFetched {
        port: NodePort(5000),
        reply: NodeReply::Success(chain_of(&[1, 2, 3])),
    });
    let changes = state.apply(ActionOutcome::ChainFetched {
        port: NodePort(5001),
        reply: NodeReply::Success(chain_of(&[1, 7])),
    });
    assert_eq!(changes, vec![SessionChange::Chain]);
    let indices: Vec<u64> = state.chain_snapshot.iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![1, 7]);
    assert_eq!(state.chain_source, Some(NodePort(5001)));
}

#[test]
fn failed_chain_fetch_keeps_previous_snapshot() {
    let mut state = SessionState::new(NodePort(5000));
    state.apply(ActionOutcome::ChainFetched {
        port: NodePort(5000),
        reply: NodeReply::Success(chain_of(&[1, 2])),
    });
    let changes = state.apply(ActionOutcome::ChainFetched {
        port: NodePort(5000),
        reply: NodeReply::Failure(NodeFailure::Application {
            status: 500,
            payload: ErrorPayload::Json(json!({"message": "chain unavailable"})),
        }),
    });
    assert_eq!(changes, vec![SessionChange::Status]);
    assert_eq!(state.chain_snapshot.len(), 2);
    assert_eq!(state.status, Some(StatusMessage::failure("chain unavailable")));
}

#[test]
fn mesh_summary_reports_failed_nodes() {
    let mut state = SessionState::new(NodePort(5000));
    state.apply(ActionOutcome::MeshConnected {
        total: 3,
        failures: vec![(NodePort(5002), NodeFailure::Transport("refused".into()))],
    });
    assert_eq!(
        state.status,
        Some(StatusMessage::failure(
            "Registered peers on 2 of 3 nodes (5002: refused)"
        ))
    );
}

#[test]
fn scan_records_availability_without_touching_chain() {
    let mut state = SessionState::new(NodePort(5000));
    let changes = state.apply(ActionOutcome::NodesScanned(vec![
        (NodePort(5000), NodeAvailability::Reachable { blocks: 4 }),
        (NodePort(5001), NodeAvailability::Unreachable("refused".into())),
    ]));
    assert_eq!(changes, vec![SessionChange::Status, SessionChange::Availability]);
    assert!(state.chain_snapshot.is_empty());
    assert_eq!(
        state.node_availability.get(&NodePort(5000)),
        Some(&NodeAvailability::Reachable { blocks: 4 })
    );
    assert_eq!(state.status, Some(StatusMessage::success("1 of 2 nodes reachable")));
}
