//! Schema-preserving overlay engine for gateway configuration documents.
//!
//! A raw route, upstream or service document is decoded twice: once into a
//! small typed overlay used for discovery logic, once into an open
//! [`Document`] that keeps every field. Before encoding, the overlay is
//! projected back onto the document so unknown fields round-trip untouched.

pub mod config;
pub mod discovery;
pub mod document;
pub mod entity;
pub mod error;
pub mod kind;
pub mod overlay;
pub mod projection;

pub use config::SeedConfig;
pub use discovery::{Discoverer, StaticDiscoverer};
pub use document::Document;
pub use entity::{Conf, Entity, RouteConf, ServiceConf, UpstreamConf};
pub use error::SeedError;
pub use kind::EntityKind;
pub use overlay::{DiscoveryArgs, Labels, Node, Nodes, Upstream};
