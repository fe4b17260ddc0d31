//! Error types for vrp-core
//!
//! Provides unified error handling across the crate. Per spec §7, only
//! invariant violations (bugs in the core, not invalid inputs) are ever
//! surfaced as an `Err`; unsupported constructs and precondition violations
//! are handled by silently skipping constraint emission.

use thiserror::Error;

/// Main error type for vrp-core operations
#[derive(Debug, Error)]
pub enum VrpError {
    /// Graph construction reached a vertex/constraint variant it does not
    /// know how to handle (§7 category 3).
    #[error("invariant violation while building graph: {0}")]
    Build(String),

    /// The solver reached a state the fixpoint algorithm does not expect,
    /// e.g. a vertex of unexpected kind reached during SCC resolution
    /// (§7 category 3).
    #[error("invariant violation while solving: {0}")]
    Solve(String),

    /// A comparison token the σ-node inverter does not recognise
    /// (§4.1, §7 category 3).
    #[error("unknown comparison token: {0}")]
    UnknownToken(String),
}

impl VrpError {
    pub fn build(msg: impl Into<String>) -> Self {
        VrpError::Build(msg.into())
    }

    pub fn solve(msg: impl Into<String>) -> Self {
        VrpError::Solve(msg.into())
    }
}

/// Result type alias for vrp-core operations
pub type Result<T> = std::result::Result<T, VrpError>;
