//! Bundle of ports implementing a geocoding provider.

use std::sync::Arc;

use crate::ports::{AddressPort, RoutingPort};

/// Ports of one geocoding provider, handed to the service at construction.
#[derive(Clone)]
pub struct Gateway {
    /// Short provider name used in logs.
    pub name: &'static str,
    /// Implementation for address autocomplete and resolution.
    pub address_port: Arc<dyn AddressPort>,
    /// Implementation for live travel distances.
    pub routing_port: Arc<dyn RoutingPort>,
}

impl Gateway {
    /// Build a gateway from its ports.
    #[must_use]
    pub fn new(
        name: &'static str,
        address_port: Arc<dyn AddressPort>,
        routing_port: Arc<dyn RoutingPort>,
    ) -> Self {
        Self {
            name,
            address_port,
            routing_port,
        }
    }
}
