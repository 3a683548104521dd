//! Payment vectors aligned with an allocation's winners.

use serde::Serialize;

use super::ids::AgentId;

/// Payments charged to the winners of an allocation.
///
/// `agents[i]` pays `amounts[i]`; the order is the allocation's winner order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payments {
    agents: Vec<AgentId>,
    amounts: Vec<f64>,
    iterations: usize,
}

impl Payments {
    /// Build a payment vector. `agents` and `amounts` must have equal length.
    #[must_use]
    pub fn new(agents: Vec<AgentId>, amounts: Vec<f64>) -> Self {
        debug_assert_eq!(agents.len(), amounts.len());
        Self {
            agents,
            amounts,
            iterations: 0,
        }
    }

    /// No winners, no payments.
    #[must_use]
    pub fn none() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// Record how many constraint-generation rounds produced the vector.
    #[must_use]
    pub const fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Paying agents.
    #[must_use]
    pub fn agents(&self) -> &[AgentId] {
        &self.agents
    }

    /// Amounts, aligned with [`Payments::agents`].
    #[must_use]
    pub fn amounts(&self) -> &[f64] {
        &self.amounts
    }

    /// Amount charged to `agent`.
    #[must_use]
    pub fn of(&self, agent: AgentId) -> Option<f64> {
        self.agents
            .iter()
            .position(|a| *a == agent)
            .map(|i| self.amounts[i])
    }

    /// Seller revenue.
    #[must_use]
    pub fn revenue(&self) -> f64 {
        self.amounts.iter().sum()
    }

    /// Constraint-generation rounds (0 for rules without iteration).
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of paying agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// True when nobody pays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}
