//! Remote operation channel: gateway trait, HTTP transport, identity

pub mod auth;
pub mod gateway;
pub mod http;
pub mod mock;

pub use auth::{Anonymous, AuthState, IdentityProvider, StaticToken};
pub use gateway::{decode_envelope, ConformanceApi, Gateway};
pub use http::HttpGateway;
