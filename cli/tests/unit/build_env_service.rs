//! Unit tests for the build environment service.
//!
//! `FakeDocker` keeps the set of live containers, so every test can assert
//! that no execution container outlives the run.

#![allow(clippy::expect_used)]

use std::path::PathBuf;

use warrior4_tools::app::{EXIT_INTERRUPTED, exit_code};
use warrior4_tools::application::services::build_env::BuildEnv;
use warrior4_tools::domain::build_env::{
    CONTAINER_CACHE_DIR, CONTAINER_SOURCE_DIR, DEFAULT_CONTAINER_NAME, DEFAULT_IMAGE_NAME,
};
use warrior4_tools::domain::{BuildEnvError, BuildEnvNames, DeviceAccess, EntryPoint};
use warrior4_tools::infra::docker::DockerCli;
use warrior4_tools::infra::fs::LocalFs;

use crate::helpers::{
    FakeDocker, InterruptNow, NoInterrupt, NoopReporter, RecordingReporter, RecordingRunner,
};

fn env<'a>(docker: &'a FakeDocker, root: &std::path::Path) -> BuildEnv<'a, FakeDocker> {
    BuildEnv::new(docker, BuildEnvNames::default(), root.to_path_buf())
}

fn nbd0() -> DeviceAccess {
    DeviceAccess::Device(PathBuf::from("/dev/nbd0"))
}

// ── init / remove ────────────────────────────────────────────────────────────

#[tokio::test]
async fn init_builds_image_from_script_dockerfile() {
    let docker = FakeDocker::new();
    let dir = tempfile::tempdir().expect("tempdir");

    env(&docker, dir.path())
        .init(&NoopReporter)
        .await
        .expect("init");

    assert_eq!(
        docker.calls(),
        vec![format!("build {DEFAULT_IMAGE_NAME} script/Dockerfile")]
    );
    assert!(docker.has_image(DEFAULT_IMAGE_NAME));
}

#[tokio::test]
async fn remove_deletes_leftover_container_then_image() {
    let docker = FakeDocker::new()
        .with_image(DEFAULT_IMAGE_NAME)
        .with_container(DEFAULT_CONTAINER_NAME);
    let dir = tempfile::tempdir().expect("tempdir");

    env(&docker, dir.path())
        .remove(&NoopReporter)
        .await
        .expect("remove");

    assert!(!docker.has_container(DEFAULT_CONTAINER_NAME));
    assert!(!docker.has_image(DEFAULT_IMAGE_NAME));
    let calls = docker.calls();
    let rm_container = calls
        .iter()
        .position(|c| c.starts_with("container rm"))
        .expect("container removed");
    let rm_image = calls
        .iter()
        .position(|c| c.starts_with("image rm"))
        .expect("image removed");
    assert!(rm_container < rm_image);
}

#[tokio::test]
async fn remove_twice_succeeds_and_warns_second_time() {
    let docker = FakeDocker::new().with_image(DEFAULT_IMAGE_NAME);
    let dir = tempfile::tempdir().expect("tempdir");
    let env = env(&docker, dir.path());
    let reporter = RecordingReporter::default();

    env.remove(&reporter).await.expect("first remove");
    env.remove(&reporter).await.expect("second remove");

    let image_rms = docker
        .calls()
        .iter()
        .filter(|c| c.starts_with("image rm"))
        .count();
    assert_eq!(image_rms, 1);
    let warnings = reporter.warnings.lock().expect("lock");
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("not present"));
}

#[tokio::test]
async fn remove_propagates_image_in_use_failure() {
    let docker = FakeDocker {
        image_rm_exit: Some(1),
        ..FakeDocker::new().with_image(DEFAULT_IMAGE_NAME)
    };
    let dir = tempfile::tempdir().expect("tempdir");

    let err = env(&docker, dir.path())
        .remove(&NoopReporter)
        .await
        .expect_err("image in use");

    assert_eq!(exit_code(&err), 1);
    assert!(format!("{err:#}").contains(DEFAULT_IMAGE_NAME));
}

#[tokio::test]
async fn remove_fails_when_daemon_is_unreachable() {
    let runner = RecordingRunner::new()
        .with_code("", 1)
        .with_stderr(b"Cannot connect to the Docker daemon at tcp://10.255.255.1:2375.");
    let docker = DockerCli::new(runner.clone(), Some("tcp://10.255.255.1:2375".to_string()));
    let dir = tempfile::tempdir().expect("tempdir");
    let reporter = RecordingReporter::default();

    let err = BuildEnv::new(&docker, BuildEnvNames::default(), dir.path().to_path_buf())
        .remove(&reporter)
        .await
        .expect_err("daemon unreachable");

    assert_eq!(exit_code(&err), 1);
    assert!(reporter.warnings.lock().expect("lock").is_empty());
    assert!(
        runner
            .calls()
            .iter()
            .all(|(_, args)| !args.contains(&"rm".to_string()))
    );
}

// ── run: guaranteed cleanup ──────────────────────────────────────────────────

#[tokio::test]
async fn build_success_removes_container() {
    let docker = FakeDocker::new().with_image(DEFAULT_IMAGE_NAME);
    let dir = tempfile::tempdir().expect("tempdir");

    env(&docker, dir.path())
        .build(nbd0(), &LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect("build");

    assert!(!docker.has_container(DEFAULT_CONTAINER_NAME));
    assert_eq!(
        docker.calls().last().map(String::as_str),
        Some(format!("container rm {DEFAULT_CONTAINER_NAME}").as_str())
    );
}

#[tokio::test]
async fn build_failure_propagates_exit_code_and_removes_container() {
    let docker = FakeDocker {
        run_exit: 3,
        ..FakeDocker::new().with_image(DEFAULT_IMAGE_NAME)
    };
    let dir = tempfile::tempdir().expect("tempdir");

    let err = env(&docker, dir.path())
        .build(DeviceAccess::Privileged, &LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect_err("script failed");

    assert_eq!(exit_code(&err), 3);
    assert!(!docker.has_container(DEFAULT_CONTAINER_NAME));
}

#[tokio::test]
async fn interrupt_removes_container_and_exits_130() {
    let docker = FakeDocker {
        hang: true,
        ..FakeDocker::new().with_image(DEFAULT_IMAGE_NAME)
    };
    let dir = tempfile::tempdir().expect("tempdir");

    let err = env(&docker, dir.path())
        .apk(&LocalFs, &InterruptNow, &NoopReporter)
        .await
        .expect_err("interrupted");

    assert!(matches!(
        err.downcast_ref::<BuildEnvError>(),
        Some(BuildEnvError::Interrupted { .. })
    ));
    assert_eq!(exit_code(&err), EXIT_INTERRUPTED);
    assert!(!docker.has_container(DEFAULT_CONTAINER_NAME));
}

#[tokio::test]
async fn stale_container_is_removed_before_run() {
    let docker = FakeDocker::new()
        .with_image(DEFAULT_IMAGE_NAME)
        .with_container(DEFAULT_CONTAINER_NAME);
    let dir = tempfile::tempdir().expect("tempdir");

    // FakeDocker refuses a run whose name is taken, like docker does.
    env(&docker, dir.path())
        .apk(&LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect("apk after stale container");

    let calls = docker.calls();
    let first_rm = calls
        .iter()
        .position(|c| c.starts_with("container rm"))
        .expect("stale container removed");
    let run = calls
        .iter()
        .position(|c| c.starts_with("container run"))
        .expect("container ran");
    assert!(first_rm < run);
    assert!(!docker.has_container(DEFAULT_CONTAINER_NAME));
}

#[tokio::test]
async fn cleanup_failure_after_failed_run_keeps_run_error() {
    let docker = FakeDocker {
        run_exit: 2,
        container_rm_exit: Some(1),
        ..FakeDocker::new().with_image(DEFAULT_IMAGE_NAME)
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let reporter = RecordingReporter::default();

    let err = env(&docker, dir.path())
        .build(nbd0(), &LocalFs, &NoInterrupt, &reporter)
        .await
        .expect_err("run failed");

    assert_eq!(exit_code(&err), 2);
    let warnings = reporter.warnings.lock().expect("lock");
    assert!(warnings.iter().any(|w| w.contains("cleanup failed")));
}

#[tokio::test]
async fn cleanup_failure_after_successful_run_is_an_error() {
    let docker = FakeDocker {
        container_rm_exit: Some(1),
        ..FakeDocker::new().with_image(DEFAULT_IMAGE_NAME)
    };
    let dir = tempfile::tempdir().expect("tempdir");

    let err = env(&docker, dir.path())
        .apk(&LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect_err("cleanup failed");

    assert!(format!("{err:#}").contains("removing container"));
}

// ── run: container parameters ────────────────────────────────────────────────

#[tokio::test]
async fn run_creates_dependency_cache_directory() {
    let docker = FakeDocker::new().with_image(DEFAULT_IMAGE_NAME);
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(!dir.path().join("target/registry").exists());

    env(&docker, dir.path())
        .apk(&LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect("apk");

    assert!(dir.path().join("target/registry").is_dir());
}

#[tokio::test]
async fn run_mounts_source_and_cache_with_workdir() {
    let docker = FakeDocker::new().with_image(DEFAULT_IMAGE_NAME);
    let dir = tempfile::tempdir().expect("tempdir");

    env(&docker, dir.path())
        .build(nbd0(), &LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect("build");

    let specs = docker.run_specs.lock().expect("lock");
    let spec = specs.first().expect("one run");
    assert_eq!(spec.entry_point, EntryPoint::Build);
    assert_eq!(spec.workdir, CONTAINER_SOURCE_DIR);
    assert_eq!(spec.device, Some(nbd0()));
    assert_eq!(spec.mounts[0].source, dir.path());
    assert_eq!(spec.mounts[0].target, CONTAINER_SOURCE_DIR);
    assert_eq!(spec.mounts[1].source, dir.path().join("target/registry/"));
    assert_eq!(spec.mounts[1].target, CONTAINER_CACHE_DIR);
}

#[tokio::test]
async fn apk_gets_no_device_access() {
    let docker = FakeDocker::new().with_image(DEFAULT_IMAGE_NAME);
    let dir = tempfile::tempdir().expect("tempdir");

    env(&docker, dir.path())
        .apk(&LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect("apk");

    let specs = docker.run_specs.lock().expect("lock");
    let spec = specs.first().expect("one run");
    assert_eq!(spec.entry_point, EntryPoint::Apk);
    assert_eq!(spec.device, None);
    assert!(!spec.run_args().iter().any(|a| a.starts_with("--privileged")));
}

#[tokio::test]
async fn instance_suffix_isolates_names() {
    let docker = FakeDocker::new();
    let dir = tempfile::tempdir().expect("tempdir");
    let env = BuildEnv::new(
        &docker,
        BuildEnvNames::with_suffix("ci-7").expect("valid suffix"),
        dir.path().to_path_buf(),
    );

    env.init(&NoopReporter).await.expect("init");
    env.apk(&LocalFs, &NoInterrupt, &NoopReporter)
        .await
        .expect("apk");

    assert!(docker.has_image(&format!("{DEFAULT_IMAGE_NAME}-ci-7")));
    let specs = docker.run_specs.lock().expect("lock");
    assert_eq!(specs[0].name, format!("{DEFAULT_CONTAINER_NAME}-ci-7"));
}
