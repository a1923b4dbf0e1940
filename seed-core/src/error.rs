use crate::kind::EntityKind;
use thiserror::Error;

/// Unified error type for ando-seed.
#[derive(Error, Debug)]
pub enum SeedError {
    #[error("failed to decode {kind} document: {source}")]
    Decode {
        kind: EntityKind,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "invalid grpc port configuration: {port:?} is not a valid port number (0-65535) for route {}: {source}",
        .id.as_deref().unwrap_or("<unknown>")
    )]
    PortParse {
        id: Option<String>,
        port: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("service not found: {discovery_type}/{service}")]
    ServiceNotFound {
        discovery_type: String,
        service: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeedError {
    /// Entity id carried by the error, if any.
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            SeedError::PortParse { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    /// Short machine-friendly label, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            SeedError::Decode { .. } => "decode",
            SeedError::PortParse { .. } => "port_parse",
            SeedError::Encode(_) => "encode",
            SeedError::ServiceNotFound { .. } => "service_not_found",
            SeedError::Io(_) => "io",
        }
    }
}
