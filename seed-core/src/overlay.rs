use crate::projection::{Field, Overlay, Projection, Suppression};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value, json};

// Sample route labels:
// "labels": {
//     "discovery_type": "nacos",
//     "service_name": "test-service",
//     "discovery_args.namespace_id": "test_name",
//     "discovery_args.group_name": "group_name",
//     "service_grpc_port": "10001"
// }

/// Route-level discovery labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Labels {
    #[serde(default, deserialize_with = "null_as_default")]
    pub discovery_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub service_name: String,

    #[serde(
        default,
        rename = "discovery_args.namespace_id",
        deserialize_with = "null_as_default"
    )]
    pub discovery_args_namespace_id: String,

    #[serde(
        default,
        rename = "discovery_args.group_name",
        deserialize_with = "null_as_default"
    )]
    pub discovery_args_group_name: String,

    /// Numeric string; when set, every resolved node is rewritten to this port.
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_grpc_port: String,
}

/// Lookup parameters handed to the discovery backend.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiscoveryArgs {
    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub group_name: String,

    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Upstream shape shared by all three entity kinds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Upstream {
    #[serde(default, deserialize_with = "opaque_nodes")]
    pub nodes: Option<Nodes>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub discovery_type: String,

    #[serde(default)]
    pub discovery_args: Option<DiscoveryArgs>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub service_name: String,
}

/// A resolved backend node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub host: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub port: u16,
}

/// The node field of an upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum Nodes {
    /// Passed through untouched; whatever the operator wrote.
    Opaque(Value),
    /// Concrete list supplied by the discovery resolver.
    Resolved(Vec<Node>),
}

fn default_weight() -> u32 {
    1
}

/// Treat an explicit `null` the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Raw node values are never interpreted, only carried.
fn opaque_nodes<'de, D>(deserializer: D) -> Result<Option<Nodes>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.map(Nodes::Opaque))
}

impl Node {
    pub fn new(host: impl Into<String>, port: u16, weight: u32) -> Self {
        Self {
            host: host.into(),
            weight,
            port,
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "host": self.host,
            "weight": self.weight,
            "port": self.port,
        })
    }
}

impl Nodes {
    pub fn is_zero(&self) -> bool {
        matches!(self, Nodes::Opaque(Value::Null))
    }

    /// Concrete node list, if discovery has resolved one.
    pub fn resolved(&self) -> Option<&[Node]> {
        match self {
            Nodes::Resolved(nodes) => Some(nodes),
            Nodes::Opaque(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Nodes::Opaque(value) => value.clone(),
            Nodes::Resolved(nodes) => Value::Array(nodes.iter().map(Node::to_value).collect()),
        }
    }
}

impl From<Vec<Node>> for Nodes {
    fn from(nodes: Vec<Node>) -> Self {
        Nodes::Resolved(nodes)
    }
}

impl Upstream {
    /// Whether the upstream asks for service discovery.
    pub fn wants_discovery(&self) -> bool {
        !self.service_name.is_empty()
    }
}

impl Overlay for Labels {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::string("discovery_type", &self.discovery_type),
            Field::string("service_name", &self.service_name),
            Field::string("discovery_args.namespace_id", &self.discovery_args_namespace_id),
            Field::string("discovery_args.group_name", &self.discovery_args_group_name),
            Field::string("service_grpc_port", &self.service_grpc_port),
        ]
    }
}

impl Overlay for DiscoveryArgs {
    fn fields(&self) -> Vec<Field<'_>> {
        let metadata = match &self.metadata {
            Some(map) => Projection::Value(Value::Object(map.clone())),
            None => Projection::Zero,
        };
        vec![
            Field::string("namespace_id", &self.namespace_id),
            Field::string("group_name", &self.group_name),
            Field::new("metadata", metadata),
        ]
    }
}

impl Overlay for Upstream {
    fn fields(&self) -> Vec<Field<'_>> {
        let nodes = match &self.nodes {
            Some(nodes) if !nodes.is_zero() => Projection::Value(nodes.to_value()),
            _ => Projection::Zero,
        };
        // A present-but-empty block still counts as set.
        let discovery_args = match &self.discovery_args {
            Some(args) => Projection::Nested(args, Suppression::NONE),
            None => Projection::Zero,
        };
        vec![
            Field::new("nodes", nodes),
            Field::string("discovery_type", &self.discovery_type),
            Field::new("discovery_args", discovery_args),
            Field::string("service_name", &self.service_name),
        ]
    }
}
