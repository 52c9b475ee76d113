//! Resolved deployment specification

use std::collections::BTreeMap;
use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// The four managed components
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Prometheus,
    NodeExporter,
    Promtail,
    Cadvisor,
}

/// Static metadata for a component kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Name used in the `stack_config` array
    pub json_name: &'static str,

    /// Stem of the compose and config template files
    pub file_stem: &'static str,

    /// Prefix of the component's `NMS_<PREFIX>_*` placeholders
    pub placeholder_prefix: &'static str,

    /// Container name managed by the runtime
    pub container_name: &'static str,

    /// Subdirectory under `data/`, if the component persists anything
    pub data_subdir: Option<&'static str>,

    /// Whether the component ships a config template besides its compose file
    pub has_config: bool,
}

const PROMETHEUS: ComponentInfo = ComponentInfo {
    json_name: "Prometheus",
    file_stem: "prometheus",
    placeholder_prefix: "PROMETHEUS",
    container_name: "nms-prometheus",
    data_subdir: Some("prometheus"),
    has_config: true,
};

const NODE_EXPORTER: ComponentInfo = ComponentInfo {
    json_name: "Node Exporter",
    file_stem: "node_exporter",
    placeholder_prefix: "NODE_EXPORTER",
    container_name: "nms-node-exporter",
    data_subdir: None,
    has_config: false,
};

const PROMTAIL: ComponentInfo = ComponentInfo {
    json_name: "Promtail",
    file_stem: "promtail",
    placeholder_prefix: "PROMTAIL",
    container_name: "nms-promtail",
    data_subdir: Some("promtail"),
    has_config: true,
};

const CADVISOR: ComponentInfo = ComponentInfo {
    json_name: "cAdvisor",
    file_stem: "cadvisor",
    placeholder_prefix: "CADVISOR",
    container_name: "nms-cadvisor",
    data_subdir: None,
    has_config: false,
};

impl ComponentKind {
    /// Every kind, in render order
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Prometheus,
        ComponentKind::NodeExporter,
        ComponentKind::Promtail,
        ComponentKind::Cadvisor,
    ];

    /// Kinds scraped by Prometheus as static `localhost` jobs
    pub const STATIC_JOBS: [ComponentKind; 2] = [ComponentKind::NodeExporter, ComponentKind::Cadvisor];

    pub fn info(&self) -> &'static ComponentInfo {
        match self {
            ComponentKind::Prometheus => &PROMETHEUS,
            ComponentKind::NodeExporter => &NODE_EXPORTER,
            ComponentKind::Promtail => &PROMTAIL,
            ComponentKind::Cadvisor => &CADVISOR,
        }
    }

    /// Look up a kind by its exact `stack_config` name
    pub fn from_json_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.info().json_name == name)
    }

    pub fn name_placeholder(&self) -> String {
        format!("NMS_{}_NAME", self.info().placeholder_prefix)
    }

    pub fn port_placeholder(&self) -> String {
        format!("NMS_{}_PORT", self.info().placeholder_prefix)
    }

    /// Container names of all managed components
    pub fn container_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|kind| kind.info().container_name).collect()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info().json_name)
    }
}

/// Remote endpoints and credentials the stack ships data to
#[derive(Debug)]
pub struct Connection {
    pub metrics_url: String,
    pub logs_url: String,
    pub org_name: String,
    pub api_user: String,
    pub api_password: SecretString,
}

/// One enabled component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub port: u16,

    /// Set for Prometheus only
    pub retention_time: Option<String>,
}

impl ComponentSpec {
    /// Prometheus retention used when the config names none
    pub const DEFAULT_RETENTION_TIME: &'static str = "15d";
}

/// One externally discovered endpoint to scrape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub service_name: String,
    pub label: String,
    pub ip: String,
    pub port: u16,
    pub path: String,
    pub protocol: String,

    /// Only emitted for `rpc-node` services
    pub network: String,
}

impl ServiceTarget {
    /// Label value that carries a `network` label into the scrape config
    pub const RPC_NODE_LABEL: &'static str = "rpc-node";

    pub fn emits_network(&self) -> bool {
        self.label == Self::RPC_NODE_LABEL
    }
}

/// Fully resolved desired state for one operation
#[derive(Debug)]
pub struct DeploymentSpec {
    pub host_label: String,
    pub connection: Connection,
    pub components: BTreeMap<ComponentKind, ComponentSpec>,
    pub services: Vec<ServiceTarget>,
}

impl DeploymentSpec {
    pub fn component(&self, kind: ComponentKind) -> Option<&ComponentSpec> {
        self.components.get(&kind)
    }

    pub fn is_enabled(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Enabled components in render order
    pub fn enabled(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.components.values()
    }
}
