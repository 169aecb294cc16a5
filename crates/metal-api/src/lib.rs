// metal-api: Async Rust client for the metal-stack bare-metal API (v1 REST + v2)

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
mod resources;
pub mod transport;
pub mod v2;

pub use auth::Credentials;
pub use client::MetalClient;
pub use error::Error;
pub use resources::PowerAction;
pub use transport::TransportConfig;
pub use v2::{V2Client, V2Version};
