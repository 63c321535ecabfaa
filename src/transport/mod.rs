//! HTTP transport to the Vertex AI REST endpoint.

pub mod http;

pub use http::{HttpTransport, TransportError};
