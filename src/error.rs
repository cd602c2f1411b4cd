//! Failure modes of diagram operations.

use std::fmt;

use thiserror::Error;

/// Why a bounded operation gave up.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AbortReason {
    /// The wall-clock deadline passed.
    Deadline,
    /// The operation allocated more nodes than its budget allows.
    NodeBudget,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Deadline => write!(f, "deadline exceeded"),
            AbortReason::NodeBudget => write!(f, "node budget exceeded"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DdError {
    /// The store reached its configured node limit even after collection.
    #[error("node store exhausted: limit of {limit} nodes reached")]
    StoreExhausted { limit: usize },

    /// A bounded operation hit its deadline or node budget.
    #[error("operation aborted: {0}")]
    Aborted(AbortReason),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The variable order changed under a running computation.
    ///
    /// Never returned from the public API; the computation is restarted.
    #[error("variable order changed during the operation")]
    Reordered,

    /// A bounded side-cache filled up.
    ///
    /// Never returned from the public API; the computation is restarted
    /// with a larger cache.
    #[error("bounded side-cache overflow")]
    CacheOverflow,
}

impl DdError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, DdError::Aborted(_))
    }

    /// Whether the failure only asks for the computation to be restarted.
    pub(crate) fn is_restart(&self) -> bool {
        matches!(self, DdError::Reordered | DdError::CacheOverflow)
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DdError::InvalidArgument(msg.into())
    }
}

pub type DdResult<T> = Result<T, DdError>;
