//! Ordered connector registry with bearer filtering.

use super::Connector;
use crate::bearer::BearerSet;
use std::sync::Arc;

/// The connectors a manager may use, in priority order.
///
/// Priority is registration order; `eligible` preserves it.
#[derive(Debug, Clone)]
pub(crate) struct ConnectorRegistry {
    connectors: Vec<Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub(crate) fn new(connectors: Vec<Arc<dyn Connector>>) -> Self {
        Self { connectors }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// The connectors serving a bearer in `bearers`, in priority order.
    pub(crate) fn eligible(&self, bearers: BearerSet) -> Vec<Arc<dyn Connector>> {
        self.connectors
            .iter()
            .filter(|connector| bearers.contains(connector.bearer()))
            .cloned()
            .collect()
    }
}
