//! JSON configuration resolver
//!
//! Turns the operator's JSON document into a [`DeploymentSpec`]. Required
//! fields are looked up by fixed path and never defaulted; the error names the
//! dotted path of the first missing field.

use std::collections::BTreeMap;
use std::path::Path;

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::spec::{ComponentKind, ComponentSpec, Connection, DeploymentSpec, ServiceTarget};
use crate::errors::ConfigError;

/// Read and resolve a configuration file
pub async fn resolve_file(path: &Path) -> Result<DeploymentSpec, ConfigError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    resolve(&bytes)
}

/// Resolve a configuration document
pub fn resolve(json: &[u8]) -> Result<DeploymentSpec, ConfigError> {
    let root: Value = serde_json::from_slice(json)?;

    let host_label = required_str(&root, "hostname", "hostname")?;

    let conn = root.get("connection_config").unwrap_or(&Value::Null);
    let connection = Connection {
        metrics_url: required_str(conn, "metricsUrl", "connection_config.metricsUrl")?,
        logs_url: required_str(conn, "logsUrl", "connection_config.logsUrl")?,
        org_name: required_str(conn, "orgName", "connection_config.orgName")?,
        api_user: required_str(conn, "apiUser", "connection_config.apiUser")?,
        api_password: SecretString::from(required_str(
            conn,
            "apiPassword",
            "connection_config.apiPassword",
        )?),
    };

    let components = resolve_components(&root)?;
    let services = resolve_services(&root)?;

    debug!(
        "Resolved configuration for {}: {} component(s), {} service target(s)",
        host_label,
        components.len(),
        services.len()
    );

    Ok(DeploymentSpec {
        host_label,
        connection,
        components,
        services,
    })
}

fn resolve_components(root: &Value) -> Result<BTreeMap<ComponentKind, ComponentSpec>, ConfigError> {
    let mut components = BTreeMap::new();

    for (i, entry) in array_at(root, "stack_config")?.iter().enumerate() {
        let Some(name) = entry.get("name").and_then(Value::as_str) else {
            warn!("Ignoring stack_config[{}]: no component name", i);
            continue;
        };
        let Some(kind) = ComponentKind::from_json_name(name) else {
            debug!("Ignoring unknown component '{}' in stack_config[{}]", name, i);
            continue;
        };
        if components.contains_key(&kind) {
            return Err(ConfigError::DuplicateComponent(name.to_string()));
        }

        let port = required_port(entry, &format!("stack_config[{i}].port"))?;
        let retention_time = match kind {
            ComponentKind::Prometheus => Some(prometheus_retention(
                entry,
                &format!("stack_config[{i}].logRetentionTime"),
            )?),
            _ => None,
        };

        components.insert(
            kind,
            ComponentSpec {
                kind,
                port,
                retention_time,
            },
        );
    }

    Ok(components)
}

fn resolve_services(root: &Value) -> Result<Vec<ServiceTarget>, ConfigError> {
    let mut services = Vec::new();

    for (i, entry) in array_at(root, "service_config")?.iter().enumerate() {
        let path = |field: &str| format!("service_config[{i}].{field}");

        let label = required_str(entry, "label", &path("label"))?;
        let network = if label == ServiceTarget::RPC_NODE_LABEL {
            required_str(entry, "network", &path("network"))?
        } else {
            let network = entry
                .get("network")
                .and_then(Value::as_str)
                .unwrap_or_default();
            plain(network, &path("network"))?.to_string()
        };

        services.push(ServiceTarget {
            service_name: required_str(entry, "serviceName", &path("serviceName"))?,
            ip: required_str(entry, "ip", &path("ip"))?,
            port: required_port(entry, &path("port"))?,
            path: required_str(entry, "path", &path("path"))?,
            protocol: required_str(entry, "protocol", &path("protocol"))?,
            label,
            network,
        });
    }

    Ok(services)
}

/// An optional array; absent or `null` yields an empty slice
fn array_at<'a>(root: &'a Value, key: &str) -> Result<&'a [Value], ConfigError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ConfigError::InvalidField {
            path: key.to_string(),
            reason: "expected an array".to_string(),
        }),
    }
}

fn required_str(parent: &Value, key: &str, path: &str) -> Result<String, ConfigError> {
    let value = parent
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingField(path.to_string()))?;
    Ok(plain(value, path)?.to_string())
}

/// Reject values that would break out of a single line of YAML or `.env`
fn plain<'a>(value: &'a str, path: &str) -> Result<&'a str, ConfigError> {
    if value.chars().any(char::is_control) {
        return Err(ConfigError::InvalidField {
            path: path.to_string(),
            reason: "contains a control character".to_string(),
        });
    }
    Ok(value)
}

/// Prometheus `logRetentionTime`; absent or `null` falls back to the default
fn prometheus_retention(entry: &Value, path: &str) -> Result<String, ConfigError> {
    match entry.get("logRetentionTime") {
        None | Some(Value::Null) => Ok(ComponentSpec::DEFAULT_RETENTION_TIME.to_string()),
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(plain(s, path)?.to_string()),
        Some(other) => Err(ConfigError::InvalidField {
            path: path.to_string(),
            reason: format!("{other} is not a retention duration"),
        }),
    }
}

fn required_port(parent: &Value, path: &str) -> Result<u16, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidField {
        path: path.to_string(),
        reason,
    };

    let raw = match parent.get("port") {
        None | Some(Value::Null) => return Err(ConfigError::MissingField(path.to_string())),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| invalid(format!("{n} is not a port number")))?,
        Some(Value::String(s)) if s.is_empty() => {
            return Err(ConfigError::MissingField(path.to_string()))
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid(format!("'{s}' is not a port number")))?,
        Some(other) => return Err(invalid(format!("{other} is not a port number"))),
    };

    match u16::try_from(raw) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(invalid(format!("{raw} is outside 1-65535"))),
    }
}
