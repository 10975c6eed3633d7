//! Service-discovery seam.
//!
//! Resolving a symbolic service name to concrete endpoints is an external
//! concern; the registry only consumes this interface.

use std::collections::HashMap;

use async_trait::async_trait;

use a2a_proto::{A2aError, A2aResult};

/// Resolves a symbolic service name to one or more endpoint base URLs.
#[async_trait]
pub trait ServiceDiscovery: Send + Sync + 'static {
    /// The endpoints currently backing `service_name`.
    async fn resolve(&self, service_name: &str) -> A2aResult<Vec<String>>;
}

/// Table-backed discovery for fixtures and static deployments.
#[derive(Debug, Default, Clone)]
pub struct StaticDiscovery {
    services: HashMap<String, Vec<String>>,
}

impl StaticDiscovery {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service with its endpoints.
    pub fn with_service(
        mut self,
        name: impl Into<String>,
        endpoints: Vec<String>,
    ) -> Self {
        self.services.insert(name.into(), endpoints);
        self
    }
}

#[async_trait]
impl ServiceDiscovery for StaticDiscovery {
    async fn resolve(&self, service_name: &str) -> A2aResult<Vec<String>> {
        self.services
            .get(service_name)
            .cloned()
            .ok_or_else(|| A2aError::discovery(format!("unknown service: {service_name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_table_resolves() {
        let discovery = StaticDiscovery::new()
            .with_service("review", vec!["http://10.0.0.1:8089/".into()]);

        let endpoints = discovery.resolve("review").await.unwrap();
        assert_eq!(endpoints, vec!["http://10.0.0.1:8089/"]);

        let err = discovery.resolve("missing").await.unwrap_err();
        assert!(matches!(err, A2aError::Discovery(_)));
    }
}
