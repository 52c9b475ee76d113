//! Template rendering and scrape target generation

pub mod targets;
pub mod template;

use std::path::Path;

use secrecy::ExposeSecret;

use crate::config::spec::DeploymentSpec;

pub use template::{RenderedDocument, Substitutions, Template, INSTALL_PATH_PLACEHOLDER};

/// Build the full ordered substitution set for a deployment
///
/// Every template of the bundle is rendered against this one superset.
pub fn substitutions_for(spec: &DeploymentSpec, install_path: &Path) -> Substitutions {
    let mut subs = Substitutions::new();

    for component in spec.enabled() {
        let info = component.kind.info();
        subs.push(component.kind.name_placeholder(), info.container_name);
        subs.push(component.kind.port_placeholder(), component.port.to_string());
        if let Some(retention) = &component.retention_time {
            subs.push(format!("NMS_{}_RETENTION_TIME", info.placeholder_prefix), retention.clone());
        }
    }

    subs.push("NMS_HOST_LABEL", spec.host_label.clone());
    subs.push("NMS_METRICS_URL", spec.connection.metrics_url.clone());
    subs.push("NMS_LOGS_URL", spec.connection.logs_url.clone());
    subs.push("NMS_ORG_NAME", spec.connection.org_name.clone());
    subs.push("NMS_API_USER", spec.connection.api_user.clone());
    subs.push("NMS_API_PASSWORD", spec.connection.api_password.expose_secret());
    subs.push(INSTALL_PATH_PLACEHOLDER, install_path.display().to_string());

    subs
}
