//! Command implementations

pub mod env;
pub mod package;
