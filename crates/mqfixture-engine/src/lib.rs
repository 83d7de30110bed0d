//! Container engine client for the mqfixture harness.
//!
//! The fixture controller talks to the container runtime exclusively
//! through the [`Engine`](backend::Engine) trait. [`DockerEngine`](backend::docker::DockerEngine)
//! implements it against the Docker Engine API.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod archive;
pub mod backend;
pub mod exec;

pub use backend::Engine;
