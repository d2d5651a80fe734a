use std::{fs, path::Path};

use anyhow::Context;
use node_client::DEFAULT_NODE_HOST;
use serde::{Deserialize, Serialize};
use shared::{domain::NodePort, error::PanelError};
use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "panel.toml";
pub const DEFAULT_BASE_PORT: u16 = 5000;
pub const DEFAULT_PORT_COUNT: u16 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub node_host: String,
    pub base_port: u16,
    pub port_count: u16,
    /// Explicit candidate ports. When non-empty, replaces the sequential
    /// range built from `base_port` and `port_count`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_port: Option<u16>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            node_host: DEFAULT_NODE_HOST.into(),
            base_port: DEFAULT_BASE_PORT,
            port_count: DEFAULT_PORT_COUNT,
            ports: Vec::new(),
            default_port: None,
        }
    }
}

/// Defaults, then the settings file, then `APP__*` environment overrides.
/// An explicit `path` must exist; the default file is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<PanelSettings> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
            read_settings_file(Path::new(DEFAULT_SETTINGS_FILE))?
        }
        None => PanelSettings::default(),
    };
    settings.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(settings)
}

pub fn read_settings_file(path: &Path) -> anyhow::Result<PanelSettings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))
}

impl PanelSettings {
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("APP__NODE_HOST") {
            self.node_host = v;
        }
        if let Some(v) = parse_env(&lookup, "APP__BASE_PORT") {
            self.base_port = v;
        }
        if let Some(v) = parse_env(&lookup, "APP__PORT_COUNT") {
            self.port_count = v;
        }
        if let Some(v) = parse_env(&lookup, "APP__DEFAULT_PORT") {
            self.default_port = Some(v);
        }
        if let Some(raw) = lookup("APP__PORTS") {
            let parsed: Result<Vec<u16>, _> = raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::parse)
                .collect();
            match parsed {
                Ok(ports) => self.ports = ports,
                Err(err) => warn!(value = %raw, error = %err, "ignoring invalid APP__PORTS"),
            }
        }
    }

    pub fn node_directory(&self) -> Result<NodeDirectory, PanelError> {
        let ports = if self.ports.is_empty() {
            let end = u32::from(self.base_port) + u32::from(self.port_count);
            if end > u32::from(u16::MAX) + 1 {
                return Err(PanelError::InvalidSettings(format!(
                    "{} ports starting at {} exceed the port range",
                    self.port_count, self.base_port
                )));
            }
            (0..self.port_count)
                .map(|offset| NodePort(self.base_port + offset))
                .collect()
        } else {
            self.ports.iter().copied().map(NodePort).collect()
        };
        let default_port = self.default_port.map(NodePort);
        NodeDirectory::new(ports, default_port)
    }
}

fn parse_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u16> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "ignoring invalid port override");
            None
        }
    }
}

/// Ordered, de-duplicated set of candidate node ports plus the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDirectory {
    ports: Vec<NodePort>,
    default_port: NodePort,
}

impl NodeDirectory {
    pub fn new(
        mut ports: Vec<NodePort>,
        default_port: Option<NodePort>,
    ) -> Result<Self, PanelError> {
        ports.sort();
        ports.dedup();
        let Some(first) = ports.first().copied() else {
            return Err(PanelError::InvalidSettings(
                "at least one node port is required".into(),
            ));
        };
        let default_port = default_port.unwrap_or(first);
        if !ports.contains(&default_port) {
            return Err(PanelError::InvalidSettings(format!(
                "default port {default_port} is not one of the node ports"
            )));
        }
        Ok(Self {
            ports,
            default_port,
        })
    }

    pub fn ports(&self) -> &[NodePort] {
        &self.ports
    }

    pub fn default_port(&self) -> NodePort {
        self.default_port
    }

    pub fn contains(&self, port: NodePort) -> bool {
        self.ports.contains(&port)
    }
}

impl Default for NodeDirectory {
    fn default() -> Self {
        Self {
            ports: (0..DEFAULT_PORT_COUNT)
                .map(|offset| NodePort(DEFAULT_BASE_PORT + offset))
                .collect(),
            default_port: NodePort(DEFAULT_BASE_PORT),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
