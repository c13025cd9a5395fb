//! Warrior4 build tooling — library behind `warrior4-env` and
//! `warrior4-package`, exposed for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod logging;
pub mod output;
