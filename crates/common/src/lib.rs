//! Shared building blocks for the auth workspace: wire types and logging setup.

pub mod types;
pub mod utils;
