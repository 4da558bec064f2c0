//! Node runtime: the serialized ledger owner, peer gossip and the HTTP surface.

pub mod api;
pub mod config;
pub mod gossip;
pub mod node;

pub use node::{Node, NodeOptions};
