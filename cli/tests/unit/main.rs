//! Unit tests for the warrior4 tools
//!
//! These tests use mocked dependencies and run fast without external I/O.

mod build_env_service;
mod docker_adapter;
