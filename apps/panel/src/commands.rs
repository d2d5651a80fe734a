//! REPL line parsing.

use anyhow::{anyhow, bail, Result};
use panel_core::{Action, PendingField};
use shared::domain::NodePort;

pub const HELP: &str = "\
Available commands:
  ports                    - List node ports (* marks the selected one)
  port <p>                 - Address the node on port <p>
  sender|recipient|amount <value>
                           - Fill a field of the pending transaction
  submit                   - Send the pending transaction
  mine                     - Mine a block on the selected node
  resolve                  - Run conflict resolution on the selected node
  chain                    - Fetch and show the selected node's chain
  register <url>...        - Register peer node URLs on the selected node
  connect-all              - Register every node with every other node
  scan                     - Probe which nodes are reachable
  show                     - Show the whole session
  status                   - Show the last status message
  help                     - Show this help message
  exit                     - Leave the panel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ports,
    SelectPort(NodePort),
    SetField(PendingField, String),
    Run(Action),
    Show,
    Status,
    Help,
    Exit,
}

/// Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    let command = match head.to_ascii_lowercase().as_str() {
        "ports" => ReplCommand::Ports,
        "port" => {
            if rest.is_empty() {
                bail!("usage: port <p>");
            }
            let port: u16 = rest
                .parse()
                .map_err(|_| anyhow!("'{rest}' is not a valid port number"))?;
            ReplCommand::SelectPort(NodePort(port))
        }
        field @ ("sender" | "recipient" | "amount") => {
            ReplCommand::SetField(field.parse()?, rest.to_string())
        }
        "submit" => ReplCommand::Run(Action::Submit),
        "mine" => ReplCommand::Run(Action::Mine),
        "resolve" => ReplCommand::Run(Action::Resolve),
        "chain" => ReplCommand::Run(Action::RefreshChain),
        "register" => {
            let nodes: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
            if nodes.is_empty() {
                bail!("usage: register <url>...");
            }
            ReplCommand::Run(Action::RegisterPeers(nodes))
        }
        "connect-all" => ReplCommand::Run(Action::ConnectAll),
        "scan" => ReplCommand::Run(Action::Scan),
        "show" => ReplCommand::Show,
        "status" => ReplCommand::Status,
        "help" => ReplCommand::Help,
        "exit" | "quit" => ReplCommand::Exit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };
    Ok(Some(command))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
