// keenmqtt-api: Async Rust client for the Keenetic RCI management API

pub mod auth;
pub mod client;
pub mod error;
pub mod hotspot;
pub mod models;
pub mod policy;
pub mod transport;

pub use auth::Credentials;
pub use client::RouterClient;
pub use error::Error;
pub use models::{Host, HostPolicy, Policy, PolicyPermit};
pub use transport::TransportConfig;
