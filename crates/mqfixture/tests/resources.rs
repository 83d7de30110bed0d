//! Image builds, networks, volumes and file copies.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod support;

use std::io::Read;

use mqfixture::{ContainerSpec, ContextFile};
use mqfixture_common::error::FixtureError;
use mqfixture_engine::backend::BuildMessage;
use support::Harness;

fn archive_entries(archive: &[u8]) -> Vec<(String, u32, String)> {
    let mut archive = tar::Archive::new(archive);
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().display().to_string();
            let mode = entry.header().mode().unwrap();
            let mut body = String::new();
            let _ = entry.read_to_string(&mut body).unwrap();
            (path, mode, body)
        })
        .collect()
}

#[tokio::test]
async fn build_image_tags_with_lowercase_test_name() {
    let h = Harness::new("TestBuildImage");
    h.engine.state().build_messages = vec![BuildMessage {
        stream: Some("Step 1/1 : FROM scratch\n".into()),
        error: None,
    }];

    let tag = h
        .fixture
        .build_image(&[ContextFile::new("Dockerfile", "FROM scratch")])
        .await
        .unwrap();

    assert_eq!(tag, "testbuildimage");
    let state = h.engine.state();
    assert_eq!(state.builds.len(), 1);
    assert_eq!(state.builds[0].0, "testbuildimage");
    assert_eq!(
        archive_entries(&state.builds[0].1),
        vec![("Dockerfile".to_string(), 0o600, "FROM scratch".to_string())]
    );
}

#[tokio::test]
async fn build_error_in_output_fails_the_build() {
    let h = Harness::new("TestBuildFails");
    h.engine.state().build_messages = vec![
        BuildMessage {
            stream: Some("Step 1/2 : FROM scratch\n".into()),
            error: None,
        },
        BuildMessage {
            stream: None,
            error: Some("COPY failed: no source files were specified".into()),
        },
    ];

    let err = h
        .fixture
        .build_image(&[ContextFile::new("Dockerfile", "FROM scratch\nCOPY missing /")])
        .await
        .unwrap_err();

    assert!(
        matches!(err, FixtureError::Build { ref message } if message.starts_with("COPY failed"))
    );
}

#[tokio::test]
async fn remove_image_swallows_engine_errors() {
    let h = Harness::new("TestRemoveImage");
    h.fixture.remove_image("testremoveimage").await;
    assert_eq!(h.engine.state().removed_images, vec!["testremoveimage"]);

    h.engine.state().fail_remove_image = true;
    h.fixture.remove_image("testremoveimage").await;
    assert_eq!(h.engine.state().removed_images.len(), 1);
}

#[tokio::test]
async fn network_is_named_after_test() {
    let h = Harness::new("TestNetwork");

    let id = h.fixture.create_network().await.unwrap();
    assert_eq!(h.engine.state().networks, vec!["TestNetwork"]);

    h.fixture.remove_network(&id).await.unwrap();
    assert!(h.engine.state().networks.is_empty());
    assert!(h.fixture.remove_network(&id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn volume_is_named_after_test_and_mountable() {
    let h = Harness::new("TestVolume");

    let volume = h.fixture.create_volume().await.unwrap();
    assert_eq!(volume.name, "TestVolume");
    assert_eq!(volume.driver, "local");

    let _ = h
        .fixture
        .create_and_start(ContainerSpec::new().mount(format!("{}:/mnt/mqm", volume.name)))
        .await
        .unwrap();
    assert!(
        h.engine.state().requests[0]
            .binds
            .contains(&"TestVolume:/mnt/mqm".to_string())
    );

    h.fixture.remove_volume(&volume.name).await.unwrap();
    assert!(h.engine.state().volumes.is_empty());
}

#[tokio::test]
async fn copy_from_container_returns_tar_archive() {
    let h = Harness::new("TestCopy");
    let handle = h.fixture.create_and_start(ContainerSpec::new()).await.unwrap();

    let archive = h
        .fixture
        .copy_from_container(&handle, "/var/mqm/errors/AMQERR01.LOG")
        .await
        .unwrap();

    let entries = archive_entries(&archive);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "AMQERR01.LOG");
}
