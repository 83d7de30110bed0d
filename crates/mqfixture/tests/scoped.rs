//! Scoped helpers always remove their container.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod support;

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use mqfixture::ContainerSpec;
use mqfixture_common::error::{FixtureError, Result};
use support::{ExecReply, Harness};

#[tokio::test]
async fn with_container_returns_body_value() {
    let h = Harness::new("TestScoped");
    h.engine
        .script_execs([ExecReply::Done(0, ""), ExecReply::Done(0, "QMNAME(QM1)")]);

    let out = h
        .fixture
        .with_container(ContainerSpec::new(), async |fx, handle| {
            fx.wait_ready(handle).await?;
            Ok(fx.exec(handle, "mqm", ["dspmq"]).await?.output)
        })
        .await
        .unwrap();

    assert_eq!(out, "QMNAME(QM1)");
    assert!(h.engine.state().live.is_empty());
    assert!(!h.fixture.termination_log_path().exists());
}

#[tokio::test]
async fn with_container_cleans_up_after_error() {
    let h = Harness::new("TestScopedError");

    let err = h
        .fixture
        .with_container(ContainerSpec::new(), async |_, _| -> Result<()> {
            Err(FixtureError::Config {
                message: "bad queue manager name".into(),
            })
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FixtureError::Config { .. }));
    assert!(h.engine.state().live.is_empty());
    assert!(h.engine.calls().contains(&"remove".to_string()));
}

#[tokio::test]
async fn with_container_skips_body_when_create_fails() {
    let h = Harness::new("TestScopedCreateFails");
    h.engine.state().fail_create = true;
    let mut ran = false;

    let err = h
        .fixture
        .with_container(ContainerSpec::new(), async |_, _| -> Result<()> {
            ran = true;
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, FixtureError::Engine { operation: "create_container", .. }));
    assert!(!ran);
    assert!(!h.fixture.termination_log_path().exists());
}

#[tokio::test]
async fn with_container_cleans_up_after_panic() {
    let h = Harness::new("TestScopedPanic");

    let outcome = AssertUnwindSafe(h.fixture.with_container(
        ContainerSpec::new(),
        async |_, _| -> Result<()> {
            panic!("assertion failed in test body");
        },
    ))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert!(h.engine.state().live.is_empty());
    assert!(!h.fixture.termination_log_path().exists());
}

#[tokio::test]
async fn run_one_shot_returns_exit_code_and_logs() {
    let h = Harness::new("TestOneShot");
    {
        let mut state = h.engine.state();
        state.wait_code = 1;
        state.logs = b"AMQ7026E: invalid license\n".to_vec();
    }

    let (code, logs) = h
        .fixture
        .run_one_shot(["runmqserver", "-v"], Some(Duration::from_secs(10)))
        .await
        .unwrap();

    assert_eq!(code, 1);
    assert_eq!(logs, "AMQ7026E: invalid license\n");
    let state = h.engine.state();
    assert_eq!(
        state.requests[0].entrypoint,
        Some(vec!["runmqserver".to_string(), "-v".to_string()])
    );
    assert!(state.live.is_empty());
}

#[tokio::test]
async fn run_one_shot_cleans_up_after_timeout() {
    let h = Harness::new("TestOneShotHangs");
    h.engine.state().wait_delay = Some(Duration::from_secs(5));

    let err = h
        .fixture
        .run_one_shot(["sleep", "infinity"], Some(Duration::from_millis(20)))
        .await
        .unwrap_err();

    assert!(matches!(err, FixtureError::Timeout { .. }));
    assert!(h.engine.state().live.is_empty());
}
