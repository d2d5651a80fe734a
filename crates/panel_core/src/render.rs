//! Pure display helpers used by the view layer.

use std::fmt;

use chrono::{DateTime, SecondsFormat};
use serde_json::Value;
use shared::domain::{Block, Transaction};

pub const HASH_DISPLAY_LEN: usize = 10;
pub const NOT_AVAILABLE: &str = "N/A";
pub const NO_TRANSACTIONS: &str = "No transactions";
const ELLIPSIS: &str = "...";

/// Shortens a block hash for display. Absent or non-string hashes decode
/// as `None` and render as `N/A`.
pub fn truncate_hash(hash: Option<&str>) -> String {
    match hash {
        Some(hash) if hash.chars().count() > HASH_DISPLAY_LEN => {
            let head: String = hash.chars().take(HASH_DISPLAY_LEN).collect();
            format!("{head}{ELLIPSIS}")
        }
        Some(hash) => hash.to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Strings render without JSON quotes, everything else verbatim.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NOT_AVAILABLE.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionEntry {
    pub sender: String,
    pub recipient: String,
    pub amount: String,
}

impl fmt::Display for TransactionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sender: {} | Recipient: {} | Amount: {}",
            self.sender, self.recipient, self.amount
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionsView {
    Empty,
    Entries(Vec<TransactionEntry>),
}

impl fmt::Display for TransactionsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str(NO_TRANSACTIONS),
            Self::Entries(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{entry}")?;
                }
                Ok(())
            }
        }
    }
}

pub fn transactions_or_empty(transactions: &[Transaction]) -> TransactionsView {
    if transactions.is_empty() {
        return TransactionsView::Empty;
    }
    TransactionsView::Entries(
        transactions
            .iter()
            .map(|tx| TransactionEntry {
                sender: tx.sender.clone(),
                recipient: tx.recipient.clone(),
                amount: display_value(&tx.amount),
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockView {
    pub title: String,
    pub previous_hash: String,
    pub proof: String,
    pub timestamp: Option<String>,
    pub transactions: TransactionsView,
}

pub fn render_block(block: &Block) -> BlockView {
    BlockView {
        title: format!("Block #{}", block.index),
        previous_hash: truncate_hash(block.previous_hash.as_deref()),
        proof: display_value(&block.proof),
        timestamp: block.timestamp.and_then(format_timestamp),
        transactions: transactions_or_empty(&block.transactions),
    }
}

fn format_timestamp(seconds: f64) -> Option<String> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
        .map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
