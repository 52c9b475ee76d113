//! Orchestrator tests against a real filesystem and fake runtime

use std::path::PathBuf;

use serde_json::{json, Value};
use tempfile::TempDir;

use nmsdeploy::deploy::bundle::LocalBundle;
use nmsdeploy::deploy::confirm::Confirm;
use nmsdeploy::deploy::fsm::StackState;
use nmsdeploy::deploy::{OperationOutcome, StackOrchestrator};
use nmsdeploy::errors::{ConfigError, DeployError, PreconditionError, RenderError};
use nmsdeploy::storage::layout::DeploymentTree;

use crate::common::*;

struct Harness {
    tmp: TempDir,
    tree: DeploymentTree,
    probe: FakeProbe,
    lifecycle: RecordingLifecycle,
    answer: Answer,
}

impl Harness {
    fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        write_bundle(&tmp.path().join("bundle"));
        let tree = DeploymentTree::new(tmp.path().join("nms"));
        Self {
            tmp,
            tree,
            probe: FakeProbe::new(false),
            lifecycle: RecordingLifecycle::default(),
            answer: Answer(true),
        }
    }

    fn orchestrator(&self) -> StackOrchestrator<'_> {
        StackOrchestrator::new(self.tree.clone(), &self.probe, &self.lifecycle, &self.answer)
    }

    fn orchestrator_with<'a>(&'a self, confirm: &'a dyn Confirm) -> StackOrchestrator<'a> {
        StackOrchestrator::new(self.tree.clone(), &self.probe, &self.lifecycle, confirm)
    }

    fn bundle(&self) -> LocalBundle {
        LocalBundle::new(self.bundle_dir())
    }

    fn bundle_dir(&self) -> PathBuf {
        self.tmp.path().join("bundle")
    }

    fn root(&self) -> PathBuf {
        self.tree.root.clone()
    }

    async fn install(&self, config: &Value) -> Result<OperationOutcome, DeployError> {
        let path = write_config(self.tmp.path(), "install.json", config);
        self.orchestrator().install(&path, &self.bundle()).await
    }

    async fn reconfigure(&self, config: &Value) -> Result<OperationOutcome, DeployError> {
        let path = write_config(self.tmp.path(), "reconfigure.json", config);
        self.orchestrator().reconfigure(&path, &self.bundle()).await
    }

    /// Install and mark the containers as running
    async fn installed(config: &Value) -> Self {
        let h = Self::new();
        h.install(config).await.unwrap();
        h.probe.set_running(true);
        h
    }
}

#[tokio::test]
async fn test_install_renders_enabled_components_only() {
    let h = Harness::new();
    let outcome = h.install(&default_config()).await.unwrap();

    assert_eq!(outcome.final_state, StackState::Installed);
    assert_eq!(outcome.root, h.root());
    assert_eq!(h.lifecycle.calls(), vec!["start"]);

    assert_eq!(entries(h.root()), vec!["configs", "data", "docker-compose", "scripts"]);
    assert_eq!(
        entries(h.root().join("docker-compose")),
        vec![".env", "node_exporter.yml", "prometheus.yml"]
    );
    assert_eq!(entries(h.root().join("configs")), vec!["prometheus.yml"]);
    assert_eq!(entries(h.root().join("data")), vec!["prometheus", "promtail"]);
    assert_eq!(entries(h.root().join("scripts")), vec!["nms-lifecycle.sh"]);

    let compose = read(h.root().join("docker-compose/prometheus.yml"));
    assert!(compose.contains("container_name: nms-prometheus"));
    assert!(compose.contains("\"9090:9090\""));
    assert!(compose.contains("retention.time=30d"));
    assert!(compose.contains(&format!("{}/data/prometheus:/prometheus", h.root().display())));
    assert!(!compose.contains("NMS_"));

    let env = read(h.root().join("docker-compose/.env"));
    assert_eq!(env, "HOST_LABEL=edge-01\nORG=acme\n");

    let prometheus = read(h.root().join("configs/prometheus.yml"));
    assert!(prometheus.contains("host: 'edge-01'"));
    assert!(prometheus.contains("- targets: ['localhost:9090']"));
    assert!(prometheus.contains("job_name: 'node_exporter'"));
    assert!(!prometheus.contains("job_name: 'cadvisor'"));

    assert_eq!(outcome.artifacts.artifacts.len(), 4);
    assert!(outcome.artifacts.get("configs/prometheus.yml").is_some());
    assert!(!h.tree.lock_path().exists());
}

#[tokio::test]
async fn test_install_refused_while_containers_run() {
    let h = Harness::new();
    h.probe.set_running(true);

    let err = h.install(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::Precondition(PreconditionError::ContainersRunning)));
    assert!(err.is_side_effect_free());
    assert!(!h.root().exists());
    assert!(h.lifecycle.calls().is_empty());
}

#[tokio::test]
async fn test_install_refused_over_existing_deployment() {
    let h = Harness::new();
    std::fs::create_dir_all(h.root()).unwrap();

    let err = h.install(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::Precondition(PreconditionError::DeploymentExists(_))));
    assert!(entries(h.root()).is_empty());
}

#[tokio::test]
async fn test_missing_api_password_writes_nothing() {
    let h = Harness::new();
    let mut config = default_config();
    config["connection_config"]
        .as_object_mut()
        .unwrap()
        .remove("apiPassword");

    match h.install(&config).await {
        Err(DeployError::Config(ConfigError::MissingField(path))) => {
            assert_eq!(path, "connection_config.apiPassword")
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!h.root().exists());
    assert!(!h.tree.lock_path().exists());
    assert!(h.lifecycle.calls().is_empty());
}

#[tokio::test]
async fn test_install_render_failure_moves_nothing_into_place() {
    let h = Harness::new();
    std::fs::write(
        h.bundle_dir().join("docker-compose/node_exporter.yml"),
        "services:\n  node-exporter:\n    container_name: NMS_NODE_EXPORTER_NAME\n    working_dir: NMS_INSTALL_PATH\n",
    )
    .unwrap();

    match h.install(&default_config()).await {
        Err(DeployError::Render(RenderError::MissingPlaceholder { placeholder, .. })) => {
            assert_eq!(placeholder, "NMS_NODE_EXPORTER_PORT")
        }
        other => panic!("unexpected result: {other:?}"),
    }

    assert!(entries(h.root().join("docker-compose")).is_empty());
    assert!(entries(h.root().join("configs")).is_empty());
    assert_eq!(entries(h.root()), vec!["configs", "data", "docker-compose", "scripts"]);
    assert!(h.lifecycle.calls().is_empty());
}

#[tokio::test]
async fn test_cancelled_install_has_no_side_effects() {
    let mut h = Harness::new();
    h.answer = Answer(false);

    let err = h.install(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::Cancelled));
    assert!(!h.root().exists());
}

#[tokio::test]
async fn test_lifecycle_failure_is_reported() {
    let mut h = Harness::new();
    h.lifecycle = RecordingLifecycle::failing();

    let err = h.install(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::External(_)));
    // Artifacts are already in place; nothing is rolled back
    assert!(h.root().join("configs/prometheus.yml").exists());
}

#[tokio::test]
async fn test_concurrent_operation_is_locked_out() {
    let h = Harness::installed(&default_config()).await;
    std::fs::write(h.tree.lock_path(), "pid=1\n").unwrap();

    let err = h.reconfigure(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::Precondition(PreconditionError::Locked(_))));
}

#[tokio::test]
async fn test_install_rechecks_tree_once_locked() {
    let h = Harness::new();
    let root = h.root();
    let other_install = AnswerAfter(move || {
        for dir in ["docker-compose", "configs", "data", "scripts"] {
            std::fs::create_dir_all(root.join(dir)).unwrap();
        }
        std::fs::write(root.join("configs/other.yml"), "theirs").unwrap();
    });

    let path = write_config(h.tmp.path(), "install.json", &default_config());
    let err = h
        .orchestrator_with(&other_install)
        .install(&path, &h.bundle())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Precondition(PreconditionError::DeploymentExists(_))));
    assert_eq!(entries(h.root().join("configs")), vec!["other.yml"]);
    assert_eq!(read(h.root().join("configs/other.yml")), "theirs");
    assert!(h.lifecycle.calls().is_empty());
    assert!(!h.tree.lock_path().exists());
}

#[tokio::test]
async fn test_reconfigure_rechecks_containers_once_locked() {
    let h = Harness::installed(&default_config()).await;
    let before = read(h.root().join("configs/prometheus.yml"));
    let probe = &h.probe;
    let stopped_meanwhile = AnswerAfter(move || probe.set_running(false));

    let path = write_config(h.tmp.path(), "reconfigure.json", &default_config());
    let err = h
        .orchestrator_with(&stopped_meanwhile)
        .reconfigure(&path, &h.bundle())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::Precondition(PreconditionError::NoContainersRunning)));
    assert_eq!(read(h.root().join("configs/prometheus.yml")), before);
    assert_eq!(h.lifecycle.calls(), vec!["start"]);
}

#[tokio::test]
async fn test_uninstall_rechecks_tree_once_locked() {
    let h = Harness::installed(&default_config()).await;
    let root = h.root();
    let removed_meanwhile = AnswerAfter(move || std::fs::remove_dir_all(&root).unwrap());

    let err = h.orchestrator_with(&removed_meanwhile).uninstall().await.unwrap_err();
    assert!(matches!(err, DeployError::Precondition(PreconditionError::InvalidDeployment(_))));
    assert_eq!(h.lifecycle.calls(), vec!["start"]);
    assert!(!h.tree.lock_path().exists());
}

#[tokio::test]
async fn test_reconfigure_preserves_data_and_swaps_components() {
    let h = Harness::installed(&default_config()).await;
    let wal = h.root().join("data/prometheus/wal-0001");
    std::fs::write(&wal, "samples").unwrap();
    std::fs::write(h.root().join("configs/stale.yml"), "old").unwrap();

    let config = config(
        json!([
            {"name": "Prometheus", "port": 9091},
            {"name": "Promtail", "port": 9080}
        ]),
        json!([]),
    );
    let outcome = h.reconfigure(&config).await.unwrap();

    assert_eq!(outcome.final_state, StackState::Installed);
    assert_eq!(read(wal), "samples");
    assert_eq!(
        entries(h.root().join("docker-compose")),
        vec![".env", "prometheus.yml", "promtail.yml"]
    );
    assert_eq!(entries(h.root().join("configs")), vec!["prometheus.yml", "promtail.yml"]);

    let prometheus = read(h.root().join("configs/prometheus.yml"));
    assert!(prometheus.contains("localhost:9091"));
    assert!(!prometheus.contains("node_exporter"));

    let promtail = read(h.root().join("configs/promtail.yml"));
    assert!(promtail.contains("password: s3cret"));

    // No retention configured: the default is substituted
    let compose = read(h.root().join("docker-compose/prometheus.yml"));
    assert!(compose.contains("retention.time=15d"));
    assert!(!compose.contains("NMS_"));

    assert_eq!(h.lifecycle.calls(), vec!["start", "start"]);
    assert_eq!(entries(h.root()), vec!["configs", "data", "docker-compose", "scripts"]);
}

#[tokio::test]
async fn test_reconfigure_twice_is_byte_identical() {
    let services = json!([
        service("geth", "rpc-node", "10.0.0.5"),
        service("gateway", "api", "10.0.0.6")
    ]);
    let config = config(
        json!([
            {"name": "Prometheus", "port": 9090},
            {"name": "cAdvisor", "port": 8080}
        ]),
        services,
    );
    let h = Harness::installed(&config).await;

    let first = h.reconfigure(&config).await.unwrap();
    let snapshot: Vec<(String, String)> = ["docker-compose/prometheus.yml", "docker-compose/cadvisor.yml", "configs/prometheus.yml"]
        .iter()
        .map(|p| (p.to_string(), read(h.root().join(p))))
        .collect();

    let second = h.reconfigure(&config).await.unwrap();
    for (path, contents) in snapshot {
        assert_eq!(read(h.root().join(&path)), contents, "{path} changed");
    }
    assert_eq!(first.artifacts, second.artifacts);
}

#[tokio::test]
async fn test_reconfigure_render_failure_leaves_live_tree() {
    let h = Harness::installed(&default_config()).await;
    let before = read(h.root().join("docker-compose/prometheus.yml"));

    std::fs::write(
        h.bundle_dir().join("docker-compose/prometheus.yml"),
        "container_name: NMS_PROMETHEUS_NAME\nvolume: NMS_INSTALL_PATH\n",
    )
    .unwrap();

    let err = h.reconfigure(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::Render(RenderError::MissingPlaceholder { .. })));
    assert_eq!(read(h.root().join("docker-compose/prometheus.yml")), before);
    assert_eq!(entries(h.root()), vec!["configs", "data", "docker-compose", "scripts"]);
    assert_eq!(h.lifecycle.calls(), vec!["start"]);
}

#[tokio::test]
async fn test_reconfigure_requires_running_containers() {
    let h = Harness::installed(&default_config()).await;
    h.probe.set_running(false);

    let err = h.reconfigure(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::Precondition(PreconditionError::NoContainersRunning)));
}

#[tokio::test]
async fn test_reconfigure_requires_valid_tree() {
    let h = Harness::new();
    h.probe.set_running(true);
    std::fs::create_dir_all(h.root().join("configs")).unwrap();

    let err = h.reconfigure(&default_config()).await.unwrap_err();
    assert!(matches!(err, DeployError::Precondition(PreconditionError::InvalidDeployment(_))));
}

#[tokio::test]
async fn test_uninstall_stops_then_removes() {
    let h = Harness::installed(&default_config()).await;

    let outcome = h.orchestrator().uninstall().await.unwrap();
    assert_eq!(outcome.final_state, StackState::Uninstalled);
    assert_eq!(h.lifecycle.calls(), vec!["start", "stop"]);
    assert!(!h.root().exists());
    assert!(!h.tree.lock_path().exists());
}

#[tokio::test]
async fn test_uninstall_keeps_tree_when_stop_fails() {
    let mut h = Harness::installed(&default_config()).await;
    h.lifecycle = RecordingLifecycle::failing();

    let err = h.orchestrator().uninstall().await.unwrap_err();
    assert!(matches!(err, DeployError::External(_)));
    assert!(h.root().exists());
}
