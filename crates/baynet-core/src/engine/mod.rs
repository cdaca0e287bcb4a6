//! The inference engine for discrete Bayesian networks.
//!
//! This module provides:
//! - **errors**: Error types for construction and query failures
//! - **network**: Events, conditional probability tables and the network graph
//! - **event_state**: Per-query mutable state wrapped around each event
//! - **enumeration**: Odometer iteration over joint assignments
//! - **query**: Query descriptors and the exact enumeration query session
//! - **batch**: Independent sessions over one shared network

pub mod batch;
pub mod enumeration;
pub mod errors;
pub mod event_state;
pub mod network;
pub mod query;
