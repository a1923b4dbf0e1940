use std::fmt;

/// Entity kind, selected by the name of the collection a document lives in.
///
/// Collections follow the gateway's etcd layout:
/// ```text
/// /apisix/routes/{route_id}
/// /apisix/upstreams/{upstream_id}
/// /apisix/services/{service_id}
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EntityKind {
    #[default]
    Route,
    Upstream,
    Service,
}

impl EntityKind {
    /// Kind from a collection name or prefix (`/apisix/routes`, `upstreams`, ...).
    ///
    /// Anything that does not end in a known collection name is a route.
    pub fn from_collection(collection: &str) -> Self {
        let collection = collection.trim_end_matches('/');
        if collection.ends_with("routes") {
            EntityKind::Route
        } else if collection.ends_with("upstreams") {
            EntityKind::Upstream
        } else if collection.ends_with("services") {
            EntityKind::Service
        } else {
            EntityKind::Route
        }
    }

    /// Kind from a full key (`/apisix/routes/1`) or relative path (`routes/1.json`).
    ///
    /// The collection is the segment before the last one.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim_end_matches('/');
        let collection = key
            .rsplit_once('/')
            .map(|(head, _)| head)
            .unwrap_or_default();
        Self::from_collection(collection)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Route => "route",
            EntityKind::Upstream => "upstream",
            EntityKind::Service => "service",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
