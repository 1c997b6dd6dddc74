//! Service layer for business logic with dependency injection.
//!
//! Services accept any [`graft_core::CommitSource`], so they run against a
//! real repository or an in-memory mock in tests.

pub mod debt;
pub mod hierarchy;
pub mod topology;

#[cfg(test)]
pub mod test_mocks;

pub use debt::{DebtOutcome, DebtService};
pub use hierarchy::HierarchyService;
pub use topology::{TopologyResult, TopologyService};
