//! # Baynet Core
//!
//! Exact inference over discrete Bayesian networks by enumeration.
//!
//! A [`BayesianNetwork`] is built once and shared behind an `Arc`. Each
//! [`EnumerationQuery`] owns its own per-event state, takes a
//! [`QueryDescriptor`] naming the evidence and outcome events, and computes
//! `P(outcome | evidence)` by summing the joint distribution over every hidden
//! assignment.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use baynet_core::{BayesianNetwork, BayesianQuery, EnumerationQuery};
//!
//! let mut net = BayesianNetwork::new();
//! let rain = net.add_boolean_event("rain")?;
//! net.add_line(rain, 0.2, 0, &[])?;
//! net.add_line(rain, 0.8, 1, &[])?;
//!
//! let mut query = EnumerationQuery::new(Arc::new(net));
//! query.define_outcome("rain", "true")?;
//! let p = query.execute()?;
//! ```

#![forbid(unsafe_code)]

pub mod engine;

// Re-export commonly used types
pub use engine::batch::execute_batch;
pub use engine::errors::ExecError;
pub use engine::event_state::{EventRole, EventState};
pub use engine::network::{BayesianEvent, BayesianNetwork, EventId, ProbabilityTable, TableLine};
pub use engine::query::{
    BayesianQuery, EnumerationQuery, QueryConfig, QueryDescriptor, QueryPhase,
};
