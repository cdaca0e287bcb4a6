//! Independent queries over one shared network.
//!
//! Each descriptor gets its own [`EnumerationQuery`] and therefore its own
//! event states; only the immutable network is shared. With the `rayon` feature
//! the sessions run in parallel. Results are returned in input order either way.

use std::sync::Arc;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::engine::errors::ExecError;
use crate::engine::network::BayesianNetwork;
use crate::engine::query::{BayesianQuery, EnumerationQuery, QueryConfig, QueryDescriptor};

/// Runs every descriptor against `network`, one session per descriptor.
pub fn execute_batch(
    network: &Arc<BayesianNetwork>,
    descriptors: &[QueryDescriptor],
    config: QueryConfig,
) -> Vec<Result<f64, ExecError>> {
    #[cfg(feature = "rayon")]
    {
        descriptors
            .par_iter()
            .map(|descriptor| execute_one(network, descriptor, config))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        descriptors
            .iter()
            .map(|descriptor| execute_one(network, descriptor, config))
            .collect()
    }
}

fn execute_one(
    network: &Arc<BayesianNetwork>,
    descriptor: &QueryDescriptor,
    config: QueryConfig,
) -> Result<f64, ExecError> {
    let mut query = EnumerationQuery::with_config(Arc::clone(network), config)?;
    query.set_descriptor(descriptor.clone())?;
    query.execute()
}
