//! Plain-text rendering of the session for the terminal.

use panel_core::{
    render::{render_block, TransactionsView},
    NodeAvailability, NodeDirectory, SessionState, StatusMessage,
};

pub fn status_line(status: Option<&StatusMessage>) -> String {
    match status {
        Some(status) => format!("Status: {status}"),
        None => "Status: (no actions yet)".to_string(),
    }
}

pub fn ports_lines(directory: &NodeDirectory, state: &SessionState) -> Vec<String> {
    directory
        .ports()
        .iter()
        .map(|port| {
            let marker = if *port == state.selected_port { '*' } else { ' ' };
            let availability = match state.node_availability.get(port) {
                Some(NodeAvailability::Reachable { blocks }) => {
                    format!(" up, {blocks} blocks")
                }
                Some(NodeAvailability::Unreachable(reason)) => format!(" down ({reason})"),
                None => String::new(),
            };
            format!("{marker} {port}{availability}")
        })
        .collect()
}

pub fn chain_lines(state: &SessionState) -> Vec<String> {
    let mut lines = match state.chain_source {
        Some(port) => vec![format!(
            "Blockchain from node {port} ({} blocks)",
            state.chain_snapshot.len()
        )],
        None => vec!["Blockchain: not fetched yet".to_string()],
    };
    for block in &state.chain_snapshot {
        let view = render_block(block);
        lines.push(view.title);
        lines.push(format!("  Previous Hash: {}", view.previous_hash));
        lines.push(format!("  Proof: {}", view.proof));
        if let Some(timestamp) = view.timestamp {
            lines.push(format!("  Timestamp: {timestamp}"));
        }
        match view.transactions {
            TransactionsView::Empty => lines.push(format!("  {}", TransactionsView::Empty)),
            TransactionsView::Entries(entries) => {
                lines.extend(entries.iter().map(|entry| format!("  - {entry}")))
            }
        }
    }
    lines
}

pub fn session_lines(state: &SessionState) -> Vec<String> {
    let pending = &state.pending_transaction;
    let mut lines = vec![
        format!("Current node port: {}", state.selected_port),
        format!(
            "Pending transaction: sender='{}' recipient='{}' amount='{}'",
            pending.sender, pending.recipient, pending.amount
        ),
        status_line(state.status.as_ref()),
    ];
    lines.extend(chain_lines(state));
    lines
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
