//! Unit tests for `DockerCli`: argument shapes and exit status handling.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use warrior4_tools::app::exit_code;
use warrior4_tools::application::ports::ContainerRuntime;
use warrior4_tools::domain::{BuildEnvNames, ContainerRunSpec, DeviceAccess, EntryPoint};
use warrior4_tools::infra::docker::DockerCli;

use crate::helpers::RecordingRunner;

fn args_of(runner: &RecordingRunner) -> Vec<Vec<String>> {
    runner
        .calls()
        .into_iter()
        .map(|(program, args)| {
            assert_eq!(program, "docker");
            args
        })
        .collect()
}

#[tokio::test]
async fn build_image_uses_dockerfile_tag_and_context() {
    let runner = RecordingRunner::new();
    let docker = DockerCli::new(runner.clone(), None);

    docker
        .build_image("img", "script/Dockerfile", Path::new("/src/warrior4-vm"))
        .await
        .expect("build");

    assert_eq!(
        args_of(&runner),
        [[
            "build",
            "--file",
            "script/Dockerfile",
            "--tag",
            "img",
            "/src/warrior4-vm"
        ]]
    );
}

#[tokio::test]
async fn host_is_prefixed_to_every_call() {
    let runner = RecordingRunner::new();
    let docker = DockerCli::new(runner.clone(), Some("ssh://builder".to_string()));

    docker
        .build_image("img", "script/Dockerfile", Path::new("/src"))
        .await
        .expect("build");
    docker.image_exists("img").await.expect("inspect");
    docker.remove_image("img").await.expect("rm image");
    docker.container_exists("c").await.expect("inspect");
    docker.remove_container("c").await.expect("rm container");

    let calls = args_of(&runner);
    assert_eq!(calls.len(), 5);
    for args in calls {
        assert_eq!(args[..2], ["--host", "ssh://builder"]);
    }
}

#[tokio::test]
async fn exists_maps_not_found_to_false() {
    let runner = RecordingRunner::new()
        .with_code("image inspect", 1)
        .with_code("container inspect", 1);
    let docker = DockerCli::new(runner.clone(), None);

    assert!(!docker.image_exists("img").await.expect("inspect"));
    assert!(!docker.container_exists("c").await.expect("inspect"));
    assert_eq!(
        args_of(&runner),
        [["image", "inspect", "img"], ["container", "inspect", "c"]]
    );
}

#[tokio::test]
async fn exists_fails_when_daemon_is_unreachable() {
    let runner = RecordingRunner::new()
        .with_code("inspect", 1)
        .with_stderr(b"Cannot connect to the Docker daemon at tcp://10.255.255.1:2375.");
    let docker = DockerCli::new(runner, Some("tcp://10.255.255.1:2375".to_string()));

    let err = docker.image_exists("img").await.expect_err("unreachable");
    assert_eq!(exit_code(&err), 1);
    assert!(format!("{err:#}").contains("Cannot connect to the Docker daemon"));

    docker
        .container_exists("c")
        .await
        .expect_err("unreachable");
}

#[tokio::test]
async fn exists_accepts_every_not_found_wording() {
    for stderr in [
        b"Error: No such image: img".as_slice(),
        b"Error: No such container: c".as_slice(),
        b"Error response from daemon: No such object: x".as_slice(),
    ] {
        let runner = RecordingRunner::new()
            .with_code("inspect", 1)
            .with_stderr(stderr);
        let docker = DockerCli::new(runner, None);
        assert!(!docker.image_exists("img").await.expect("absent"));
    }
}

#[tokio::test]
async fn remove_container_is_forced() {
    let runner = RecordingRunner::new();
    let docker = DockerCli::new(runner.clone(), None);

    docker.remove_container("c").await.expect("rm");

    assert_eq!(args_of(&runner), [["container", "rm", "--force", "c"]]);
}

#[tokio::test]
async fn remove_image_failure_carries_exit_code() {
    let runner = RecordingRunner::new().with_code("image rm", 1);
    let docker = DockerCli::new(runner, None);

    let err = docker.remove_image("img").await.expect_err("in use");

    assert_eq!(exit_code(&err), 1);
}

#[tokio::test]
async fn run_container_passes_mounts_workdir_device_and_command() {
    let runner = RecordingRunner::new();
    let docker = DockerCli::new(runner.clone(), None);
    let spec = ContainerRunSpec::new(
        &BuildEnvNames::default(),
        Path::new("/src"),
        EntryPoint::Build,
        Some(DeviceAccess::Device(PathBuf::from("/dev/nbd0"))),
    );

    docker.run_container(&spec).await.expect("run");

    assert_eq!(
        args_of(&runner),
        [[
            "container",
            "run",
            "--name",
            "warrior4-vm-build-env",
            "--mount",
            "type=bind,source=/src,target=/home/ubuntu/warrior4-vm/",
            "--mount",
            "type=bind,source=/src/target/registry/,target=/home/ubuntu/.cargo/registry/",
            "--workdir",
            "/home/ubuntu/warrior4-vm/",
            "--device",
            "/dev/nbd0",
            "warrior4-vm-ubuntu-build-env",
            "./script/build.sh",
        ]]
    );
}

#[tokio::test]
async fn run_container_propagates_script_exit_code() {
    let runner = RecordingRunner::new().with_code("container run", 42);
    let docker = DockerCli::new(runner, None);
    let spec = ContainerRunSpec::new(
        &BuildEnvNames::default(),
        Path::new("/src"),
        EntryPoint::Apk,
        None,
    );

    let err = docker.run_container(&spec).await.expect_err("script fails");

    assert_eq!(exit_code(&err), 42);
}
