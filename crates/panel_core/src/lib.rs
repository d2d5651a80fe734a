//! Session state, action coordination and display helpers for the node panel.

pub mod config;
pub mod coordinator;
pub mod render;
pub mod session;

pub use config::{load_settings, NodeDirectory, PanelSettings};
pub use coordinator::{Action, ActionKind, Coordinator, SessionEvent};
pub use session::{
    ActionOutcome, NodeAvailability, Outcome, PendingField, PendingTransaction, SessionChange,
    SessionState, StatusMessage,
};
