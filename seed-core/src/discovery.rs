use crate::error::SeedError;
use crate::overlay::{Node, Upstream};
use std::collections::HashMap;
use tracing::debug;

/// Discovery backend: resolves an upstream's service reference to nodes.
///
/// Implementations see the typed upstream view, which carries the discovery
/// type, service name and lookup arguments of the entity.
pub trait Discoverer: Send + Sync {
    fn discover(&self, upstream: &Upstream) -> Result<Vec<Node>, SeedError>;
}

/// Discovery table held in memory: discovery type → service name → nodes.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscoverer {
    services: HashMap<String, HashMap<String, Vec<Node>>>,
}

impl StaticDiscoverer {
    pub fn new(services: HashMap<String, HashMap<String, Vec<Node>>>) -> Self {
        Self { services }
    }

    /// Register (or replace) the nodes of one service.
    pub fn insert(&mut self, discovery_type: &str, service: &str, nodes: Vec<Node>) {
        self.services
            .entry(discovery_type.to_owned())
            .or_default()
            .insert(service.to_owned(), nodes);
    }

    pub fn len(&self) -> usize {
        self.services.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Discoverer for StaticDiscoverer {
    fn discover(&self, upstream: &Upstream) -> Result<Vec<Node>, SeedError> {
        let nodes = self
            .services
            .get(&upstream.discovery_type)
            .and_then(|by_name| by_name.get(&upstream.service_name))
            .ok_or_else(|| SeedError::ServiceNotFound {
                discovery_type: upstream.discovery_type.clone(),
                service: upstream.service_name.clone(),
            })?;
        debug!(
            discovery_type = %upstream.discovery_type,
            service = %upstream.service_name,
            nodes = nodes.len(),
            "service resolved"
        );
        Ok(nodes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upstream(discovery_type: &str, service: &str) -> Upstream {
        Upstream {
            discovery_type: discovery_type.into(),
            service_name: service.into(),
            ..Default::default()
        }
    }

    #[test]
    fn resolves_registered_service() {
        let mut d = StaticDiscoverer::default();
        d.insert("nacos", "svc-a", vec![Node::new("10.0.0.1", 8080, 1)]);
        assert_eq!(d.len(), 1);
        let nodes = d.discover(&upstream("nacos", "svc-a")).unwrap();
        assert_eq!(nodes, vec![Node::new("10.0.0.1", 8080, 1)]);
    }

    #[test]
    fn discovery_type_scopes_the_lookup() {
        let mut d = StaticDiscoverer::default();
        d.insert("nacos", "svc-a", vec![Node::new("a", 1, 1)]);
        let err = d.discover(&upstream("dns", "svc-a")).unwrap_err();
        assert!(matches!(err, SeedError::ServiceNotFound { .. }));
        assert_eq!(err.to_string(), "service not found: dns/svc-a");
    }

    #[test]
    fn empty_table_resolves_nothing() {
        let d = StaticDiscoverer::new(HashMap::new());
        assert!(d.is_empty());
        assert!(d.discover(&upstream("", "svc")).is_err());
    }
}
