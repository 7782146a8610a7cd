//! The five-stage agent chain.
//!
//! An "agent" here is a named prompt template bound to a role description,
//! not a stateful entity. The chain runs the five roles in a fixed order
//! over one document; there is no branching and no feedback.

pub mod chain;
pub mod roles;

pub use chain::{AgentChain, ChainOutcome};
pub use roles::AgentRole;
