// arbor-api: Async Rust client for remote tree services

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::TreeClient;
pub use error::Error;
pub use models::{NodeResponse, TreeResponse};
pub use transport::{TlsMode, TransportConfig};
