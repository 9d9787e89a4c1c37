//! Utilities for exercising the executor without a real database.

/// Scripted in-memory driver
pub mod scripted;

/// Table and row builders for assertions
pub mod test_helpers;

pub use scripted::{Response, ScriptedConnection, ScriptedConnector};
pub use test_helpers::{create_test_row, create_test_table};
