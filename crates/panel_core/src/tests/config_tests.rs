use super::*;

use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn default_directory_is_eight_sequential_ports_from_5000() {
    let directory = PanelSettings::default().node_directory().expect("directory");
    let ports: Vec<u16> = directory.ports().iter().map(|p| p.0).collect();
    assert_eq!(ports, (5000..=5007).collect::<Vec<_>>());
    assert_eq!(directory.default_port(), NodePort(5000));
    assert_eq!(directory, NodeDirectory::default());
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("panel.toml");
    fs::write(
        &path,
        "node_host = \"127.0.0.1\"\nbase_port = 6000\nport_count = 3\ndefault_port = 6002\n",
    )
    .expect("write settings");

    let settings = read_settings_file(&path).expect("read settings");
    assert_eq!(settings.node_host, "127.0.0.1");
    let directory = settings.node_directory().expect("directory");
    assert_eq!(
        directory.ports(),
        &[NodePort(6000), NodePort(6001), NodePort(6002)]
    );
    assert_eq!(directory.default_port(), NodePort(6002));
}

#[test]
fn missing_explicit_settings_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_settings(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("failed to read settings file"));
}

#[test]
fn malformed_settings_file_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("panel.toml");
    fs::write(&path, "base_port = \"five thousand\"").expect("write settings");
    let err = read_settings_file(&path).unwrap_err();
    assert!(err.to_string().contains("failed to parse settings file"));
}

#[test]
fn env_overrides_win_and_invalid_values_are_ignored() {
    let mut settings = PanelSettings::default();
    settings.apply_env_overrides(env(&[
        ("APP__NODE_HOST", "10.0.0.7"),
        ("APP__BASE_PORT", "7000"),
        ("APP__PORT_COUNT", "not-a-number"),
        ("APP__DEFAULT_PORT", "7003"),
    ]));
    assert_eq!(settings.node_host, "10.0.0.7");
    assert_eq!(settings.base_port, 7000);
    assert_eq!(settings.port_count, DEFAULT_PORT_COUNT);
    assert_eq!(settings.default_port, Some(7003));
}

#[test]
fn explicit_port_list_is_sorted_and_deduplicated() {
    let mut settings = PanelSettings::default();
    settings.apply_env_overrides(env(&[("APP__PORTS", "5005, 5001,5005")]));
    let directory = settings.node_directory().expect("directory");
    assert_eq!(directory.ports(), &[NodePort(5001), NodePort(5005)]);
    assert_eq!(directory.default_port(), NodePort(5001));
    assert!(!directory.contains(NodePort(5000)));
}

#[test]
fn default_port_must_be_a_candidate() {
    let settings = PanelSettings {
        default_port: Some(9000),
        ..PanelSettings::default()
    };
    assert!(matches!(
        settings.node_directory(),
        Err(PanelError::InvalidSettings(_))
    ));
}

#[test]
fn empty_or_overflowing_ranges_are_rejected() {
    let empty = PanelSettings {
        port_count: 0,
        ..PanelSettings::default()
    };
    assert!(empty.node_directory().is_err());

    let overflow = PanelSettings {
        base_port: 65534,
        port_count: 8,
        ..PanelSettings::default()
    };
    assert!(overflow.node_directory().is_err());
}

#[test]
fn generated_settings_round_trip_through_toml() {
    let rendered = toml::to_string_pretty(&PanelSettings::default()).expect("render");
    let parsed: PanelSettings = toml::from_str(&rendered).expect("parse");
    assert_eq!(parsed, PanelSettings::default());
}
