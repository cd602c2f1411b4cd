//! Resource limits for bounded operations.

use std::time::{Duration, Instant};

use crate::bdd::Bdd;
use crate::error::{AbortReason, DdError, DdResult};

/// Limits of a bounded operation: an absolute deadline and/or a budget of
/// newly allocated nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub deadline: Option<Instant>,
    pub node_budget: Option<usize>,
}

impl Limits {
    /// No limits at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_node_budget(mut self, nodes: usize) -> Self {
        self.node_budget = Some(nodes);
        self
    }

    pub fn is_unlimited(&self) -> bool {
        self.deadline.is_none() && self.node_budget.is_none()
    }
}

/// Limits bound to one attempt of an operation.
///
/// The node budget counts allocations made since the attempt started.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    deadline: Option<Instant>,
    max_allocated: Option<u64>,
}

impl Budget {
    pub fn start(bdd: &Bdd, limits: &Limits) -> Self {
        Self {
            deadline: limits.deadline,
            max_allocated: limits.node_budget.map(|n| bdd.allocated().saturating_add(n as u64)),
        }
    }

    pub fn unlimited() -> Self {
        Self {
            deadline: None,
            max_allocated: None,
        }
    }

    /// Checked on every recursive call of a bounded operation.
    pub fn check(&self, bdd: &Bdd) -> DdResult<()> {
        if let Some(max) = self.max_allocated {
            if bdd.allocated() > max {
                return Err(DdError::Aborted(AbortReason::NodeBudget));
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(DdError::Aborted(AbortReason::Deadline));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        assert!(Limits::none().is_unlimited());
        let limits = Limits::none().with_node_budget(10);
        assert_eq!(limits.node_budget, Some(10));
        assert!(!limits.is_unlimited());
    }

    #[test]
    fn test_expired_deadline() {
        let bdd = Bdd::default();
        let limits = Limits::none().with_deadline(Instant::now());
        let budget = Budget::start(&bdd, &limits);
        assert_eq!(budget.check(&bdd), Err(DdError::Aborted(AbortReason::Deadline)));
        assert_eq!(Budget::unlimited().check(&bdd), Ok(()));
    }

    #[test]
    fn test_node_budget() {
        let bdd = Bdd::default();
        let budget = Budget::start(&bdd, &Limits::none().with_node_budget(1));
        assert_eq!(budget.check(&bdd), Ok(()));
        bdd.mk_var(2);
        assert_eq!(budget.check(&bdd), Err(DdError::Aborted(AbortReason::NodeBudget)));
    }
}
