use crate::document::Document;
use crate::error::SeedError;
use crate::kind::EntityKind;
use crate::overlay::{DiscoveryArgs, Labels, Node, Nodes, Upstream, null_as_default};
use crate::projection::{Field, Overlay, Projection, Suppression, reconcile};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Typed overlay of one entity kind.
///
/// Hooks run at the two ends of the entity lifecycle: right after parsing
/// and right before the overlay is projected back into the document.
pub trait EntityOverlay: Overlay + DeserializeOwned {
    const KIND: EntityKind;

    fn upstream(&self) -> &Upstream;

    fn upstream_mut(&mut self) -> &mut Upstream;

    fn after_parse(&mut self, _document: &Document) {}

    fn before_marshal(&mut self, _document: &Document) -> Result<(), SeedError> {
        Ok(())
    }
}

/// Route overlay: discovery labels plus the inline upstream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteOverlay {
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Labels,

    #[serde(default, deserialize_with = "null_as_default")]
    pub upstream: Upstream,
}

/// Service overlay: the inline upstream only.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceOverlay {
    #[serde(default, deserialize_with = "null_as_default")]
    pub upstream: Upstream,
}

/// Upstream overlay: the upstream fields sit at the top level of the document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct UpstreamOverlay {
    pub upstream: Upstream,
}

impl Overlay for RouteOverlay {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("labels", Projection::nested(&self.labels, Suppression::NONE)),
            Field::new("upstream", Projection::nested(&self.upstream, Suppression::UPSTREAM)),
        ]
    }
}

impl Overlay for ServiceOverlay {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::new(
            "upstream",
            Projection::nested(&self.upstream, Suppression::UPSTREAM),
        )]
    }
}

impl Overlay for UpstreamOverlay {
    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::new(
            "",
            Projection::embedded(&self.upstream, Suppression::UPSTREAM),
        )]
    }
}

impl RouteOverlay {
    /// Copy the route's discovery labels into its upstream so the route
    /// drives an implicit upstream definition.
    fn propagate_discovery(&mut self, id: &str) {
        if self.labels.service_name.is_empty() {
            return;
        }
        info!(
            route_id = %id,
            service = %self.labels.service_name,
            "upstream nodes of route will be synced with service"
        );
        self.upstream.service_name = self.labels.service_name.clone();
        self.upstream.discovery_type = self.labels.discovery_type.clone();
        self.upstream.discovery_args = Some(DiscoveryArgs {
            namespace_id: self.labels.discovery_args_namespace_id.clone(),
            group_name: self.labels.discovery_args_group_name.clone(),
            metadata: None,
        });
    }

    /// Rewrite every resolved node to the gRPC port label.
    ///
    /// Opaque or absent nodes are left alone; the port is not even parsed.
    fn override_grpc_port(&mut self, id: Option<&str>) -> Result<(), SeedError> {
        let port = &self.labels.service_grpc_port;
        if port.is_empty() {
            return Ok(());
        }
        let Some(Nodes::Resolved(nodes)) = &self.upstream.nodes else {
            return Ok(());
        };

        let grpc_port: u16 = port.parse().map_err(|source| SeedError::PortParse {
            id: id.map(str::to_owned),
            port: port.clone(),
            source,
        })?;

        let rewritten: Vec<Node> = nodes
            .iter()
            .map(|n| {
                debug!(
                    route_id = id.unwrap_or_default(),
                    host = %n.host,
                    port = grpc_port,
                    "updated gRPC port for node"
                );
                Node {
                    host: n.host.clone(),
                    weight: n.weight,
                    port: grpc_port,
                }
            })
            .collect();
        self.upstream.nodes = Some(Nodes::Resolved(rewritten));
        Ok(())
    }
}

impl EntityOverlay for RouteOverlay {
    const KIND: EntityKind = EntityKind::Route;

    fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    fn upstream_mut(&mut self) -> &mut Upstream {
        &mut self.upstream
    }

    fn after_parse(&mut self, document: &Document) {
        if let Some(id) = document.id() {
            self.propagate_discovery(id);
        }
    }

    fn before_marshal(&mut self, document: &Document) -> Result<(), SeedError> {
        self.override_grpc_port(document.id())
    }
}

impl EntityOverlay for ServiceOverlay {
    const KIND: EntityKind = EntityKind::Service;

    fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    fn upstream_mut(&mut self) -> &mut Upstream {
        &mut self.upstream
    }
}

impl EntityOverlay for UpstreamOverlay {
    const KIND: EntityKind = EntityKind::Upstream;

    fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    fn upstream_mut(&mut self) -> &mut Upstream {
        &mut self.upstream
    }
}

/// A parsed entity: typed overlay, full document, and the parse-time node flag.
#[derive(Debug, Clone)]
pub struct Conf<O> {
    overlay: O,
    document: Document,
    has_nodes_attr: bool,
}

pub type RouteConf = Conf<RouteOverlay>;
pub type ServiceConf = Conf<ServiceOverlay>;
pub type UpstreamConf = Conf<UpstreamOverlay>;

impl<O: EntityOverlay> Conf<O> {
    /// Decode the raw bytes into both the overlay and the document.
    pub fn parse(raw: &[u8]) -> Result<Self, SeedError> {
        let decode_err = |source| SeedError::Decode {
            kind: O::KIND,
            source,
        };
        let mut overlay: O = serde_json::from_slice(raw).map_err(decode_err)?;
        let document = Document::from_slice(raw).map_err(decode_err)?;

        overlay.after_parse(&document);

        // Captured before any injection can touch the node field.
        let has_nodes_attr = overlay.upstream().nodes.is_some();

        Ok(Self {
            overlay,
            document,
            has_nodes_attr,
        })
    }

    pub fn kind(&self) -> EntityKind {
        O::KIND
    }

    pub fn id(&self) -> Option<&str> {
        self.document.id()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn upstream(&self) -> &Upstream {
        self.overlay.upstream()
    }

    /// Replace the upstream node field. No shape validation is done.
    pub fn inject(&mut self, nodes: Nodes) {
        self.overlay.upstream_mut().nodes = Some(nodes);
    }

    /// Whether the raw input carried a non-null upstream node field.
    pub fn has_nodes_attr(&self) -> bool {
        self.has_nodes_attr
    }

    /// Project the overlay into the document and encode it.
    ///
    /// Terminal: the entity is consumed.
    pub fn marshal(mut self) -> Result<Vec<u8>, SeedError> {
        self.overlay.before_marshal(&self.document)?;
        reconcile(&self.overlay, Suppression::NONE, self.document.as_map_mut());
        self.document.to_vec().map_err(SeedError::Encode)
    }
}

/// One gateway entity of any kind.
#[derive(Debug, Clone)]
pub enum Entity {
    Route(RouteConf),
    Upstream(UpstreamConf),
    Service(ServiceConf),
}

macro_rules! dispatch {
    ($self:expr, $conf:ident => $body:expr) => {
        match $self {
            Entity::Route($conf) => $body,
            Entity::Upstream($conf) => $body,
            Entity::Service($conf) => $body,
        }
    };
}

impl Entity {
    /// Parse raw bytes as the given kind.
    pub fn parse(raw: &[u8], kind: EntityKind) -> Result<Self, SeedError> {
        Ok(match kind {
            EntityKind::Route => Entity::Route(Conf::parse(raw)?),
            EntityKind::Upstream => Entity::Upstream(Conf::parse(raw)?),
            EntityKind::Service => Entity::Service(Conf::parse(raw)?),
        })
    }

    /// Parse raw bytes stored under the given collection name.
    pub fn parse_in(raw: &[u8], collection: &str) -> Result<Self, SeedError> {
        Self::parse(raw, EntityKind::from_collection(collection))
    }

    pub fn kind(&self) -> EntityKind {
        dispatch!(self, c => c.kind())
    }

    pub fn id(&self) -> Option<&str> {
        dispatch!(self, c => c.id())
    }

    pub fn document(&self) -> &Document {
        dispatch!(self, c => c.document())
    }

    pub fn upstream(&self) -> &Upstream {
        dispatch!(self, c => c.upstream())
    }

    pub fn inject(&mut self, nodes: Nodes) {
        dispatch!(self, c => c.inject(nodes))
    }

    pub fn has_nodes_attr(&self) -> bool {
        dispatch!(self, c => c.has_nodes_attr())
    }

    pub fn marshal(self) -> Result<Vec<u8>, SeedError> {
        dispatch!(self, c => c.marshal())
    }
}
