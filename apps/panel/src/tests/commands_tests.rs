use super::*;

fn parsed(line: &str) -> ReplCommand {
    parse_command(line)
        .expect("parse")
        .expect("non-empty command")
}

#[test]
fn blank_lines_are_ignored() {
    assert_eq!(parse_command("   ").expect("parse"), None);
}

#[test]
fn port_selection_parses_number() {
    assert_eq!(parsed("port 5003"), ReplCommand::SelectPort(NodePort(5003)));
    assert!(parse_command("port").is_err());
    assert!(parse_command("port abc").is_err());
    assert!(parse_command("port 70000").is_err());
}

#[test]
fn field_values_keep_inner_spaces_and_may_be_empty() {
    assert_eq!(
        parsed("sender  Alice Smith "),
        ReplCommand::SetField(PendingField::Sender, "Alice Smith".into())
    );
    assert_eq!(
        parsed("amount"),
        ReplCommand::SetField(PendingField::Amount, String::new())
    );
    assert_eq!(
        parsed("RECIPIENT B"),
        ReplCommand::SetField(PendingField::Recipient, "B".into())
    );
}

#[test]
fn ledger_actions_map_to_coordinator_actions() {
    assert_eq!(parsed("submit"), ReplCommand::Run(Action::Submit));
    assert_eq!(parsed("mine"), ReplCommand::Run(Action::Mine));
    assert_eq!(parsed("resolve"), ReplCommand::Run(Action::Resolve));
    assert_eq!(parsed("chain"), ReplCommand::Run(Action::RefreshChain));
    assert_eq!(parsed("connect-all"), ReplCommand::Run(Action::ConnectAll));
    assert_eq!(parsed("scan"), ReplCommand::Run(Action::Scan));
}

#[test]
fn register_requires_at_least_one_url() {
    assert_eq!(
        parsed("register http://127.0.0.1:5001 http://127.0.0.1:5002"),
        ReplCommand::Run(Action::RegisterPeers(vec![
            "http://127.0.0.1:5001".into(),
            "http://127.0.0.1:5002".into(),
        ]))
    );
    assert!(parse_command("register").is_err());
}

#[test]
fn unknown_commands_are_reported() {
    let err = parse_command("teleport").unwrap_err();
    assert!(err.to_string().contains("unknown command 'teleport'"));
}
