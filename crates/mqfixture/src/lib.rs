//! # mqfixture
//!
//! Disposable container fixtures for testing a messaging-server image.
//!
//! A [`Fixture`] owns the per-test resources around one test: it creates
//! and starts containers with the coverage and termination-log mounts in
//! place, runs commands inside them, waits for readiness or exit, builds
//! throwaway images, and tears everything down again while collecting
//! diagnostics.
//!
//! # Example
//!
//! ```rust,no_run
//! use mqfixture::{ContainerSpec, Fixture};
//! use mqfixture_common::config::FixtureConfig;
//! use mqfixture_common::types::TestRun;
//!
//! # async fn golden_path() -> mqfixture_common::error::Result<()> {
//! let fixture = Fixture::connect(FixtureConfig::from_env(), TestRun::new("TestGoldenPath"))?;
//! fixture
//!     .with_container(ContainerSpec::new().env("LICENSE", "accept"), async |fx, handle| {
//!         fx.wait_ready(handle).await?;
//!         let out = fx.exec(handle, "mqm", ["dspmq"]).await?;
//!         assert_eq!(out.exit_code, 0);
//!         Ok(())
//!     })
//!     .await
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod build;
pub mod cleanup;
pub mod coverage;
pub mod exec;
pub mod fixture;
pub mod logs;
pub mod resources;
pub mod scoped;
pub mod spec;
pub mod termination;

pub use cleanup::{CleanupReport, CleanupStep};
pub use fixture::{ContainerHandle, Fixture};
pub use mqfixture_engine::archive::ContextFile;
pub use mqfixture_engine::exec::ExecOutput;
pub use spec::ContainerSpec;
