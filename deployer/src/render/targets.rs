//! Prometheus scrape job generation
//!
//! Jobs are appended to the rendered `prometheus.yml`, whose template ends
//! inside its `scrape_configs:` list. Output is append-only and mirrors input
//! order exactly.

use std::fmt::Write as _;

use crate::config::spec::{ComponentKind, DeploymentSpec, ServiceTarget};

/// Append a `localhost` job for a locally running component
pub fn append_static_job(mut doc: String, job_name: &str, port: u16) -> String {
    ensure_trailing_newline(&mut doc);
    let _ = write!(
        doc,
        "  - job_name: {}\n    \
         scheme: 'http'\n    \
         static_configs:\n      \
         - targets: [{}]\n",
        yaml_quote(job_name),
        yaml_quote(&format!("localhost:{port}"))
    );
    doc
}

/// Append one job per service target, in order
pub fn append_service_targets(mut doc: String, services: &[ServiceTarget]) -> String {
    for service in services {
        ensure_trailing_newline(&mut doc);
        let _ = write!(
            doc,
            "  - job_name: {}\n    \
             metrics_path: {}\n    \
             scheme: {}\n    \
             static_configs:\n      \
             - targets: [{}]\n        \
             labels:\n          \
             service: {}\n",
            yaml_quote(&service.service_name),
            yaml_quote(&service.path),
            yaml_quote(&service.protocol),
            yaml_quote(&format!("{}:{}", service.ip, service.port)),
            yaml_quote(&service.label)
        );
        if service.emits_network() {
            let _ = writeln!(doc, "          network: {}", yaml_quote(&service.network));
        }
    }
    doc
}

/// Append static jobs for enabled exporters, then every service target
pub fn append_all_targets(doc: String, spec: &DeploymentSpec) -> String {
    let doc = ComponentKind::STATIC_JOBS
        .iter()
        .filter_map(|kind| spec.component(*kind))
        .fold(doc, |doc, component| {
            append_static_job(doc, component.kind.info().file_stem, component.port)
        });
    append_service_targets(doc, &spec.services)
}

/// Single-quoted YAML scalar; `'` is escaped by doubling
pub fn yaml_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn ensure_trailing_newline(doc: &mut String) {
    if !doc.is_empty() && !doc.ends_with('\n') {
        doc.push('\n');
    }
}
