//! Lifecycle script and runtime probe tests using real subprocesses

#![cfg(unix)]

use std::time::Duration;

use nmsdeploy::app::options::{LifecycleOptions, ProbeOptions};
use nmsdeploy::errors::ExternalToolError;
use nmsdeploy::runtime::{DockerProbe, Lifecycle, RuntimeProbe, ScriptLifecycle};
use nmsdeploy::storage::layout::DeploymentTree;

async fn tree_with_script(body: &str) -> (tempfile::TempDir, DeploymentTree) {
    let tmp = tempfile::tempdir().unwrap();
    let tree = DeploymentTree::new(tmp.path().join("nms"));
    tree.create().await.unwrap();
    tree.scripts_dir()
        .file("nms-lifecycle.sh")
        .write_string(body)
        .await
        .unwrap();
    (tmp, tree)
}

#[tokio::test]
async fn test_script_runs_in_root_with_flags() {
    let (_tmp, tree) = tree_with_script("echo \"$1\" >> flags.log\n").await;
    let lifecycle = ScriptLifecycle::default();

    lifecycle.start_all(&tree).await.unwrap();
    lifecycle.stop_all(&tree).await.unwrap();

    let log = std::fs::read_to_string(tree.root().join("flags.log")).unwrap();
    assert_eq!(log, "--start-all\n--stop-all\n");
}

#[tokio::test]
async fn test_non_zero_exit_is_an_error() {
    let (_tmp, tree) = tree_with_script("echo 'no such service' >&2\nexit 3\n").await;

    match ScriptLifecycle::default().start_all(&tree).await {
        Err(ExternalToolError::Exit { code, stderr, .. }) => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "no such service");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_hung_script_times_out() {
    let (_tmp, tree) = tree_with_script("sleep 5\n").await;
    let lifecycle = ScriptLifecycle::new(LifecycleOptions {
        timeout: Duration::from_millis(200),
        ..Default::default()
    });

    let err = lifecycle.stop_all(&tree).await.unwrap_err();
    assert!(matches!(err, ExternalToolError::Timeout { .. }));
}

#[tokio::test]
async fn test_missing_runtime_binary_fails_to_spawn() {
    let probe = DockerProbe::new(ProbeOptions {
        runtime_binary: "/nonexistent/docker".to_string(),
        ..Default::default()
    });

    let err = probe.any_managed_container_running().await.unwrap_err();
    assert!(matches!(err, ExternalToolError::Spawn { .. }));
}
