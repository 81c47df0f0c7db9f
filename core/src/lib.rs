//! Blocking client for the DatabunkerPro data-privacy and tokenization API.
//!
//! # Overview
//! Every call goes through one `Gateway`: it builds the HTTP request
//! (method, `/v2` path, `X-Bunker-*` headers, JSON body), hands it to a
//! `Transport` for a single blocking exchange, and turns the response into
//! either the decoded JSON object or an `ApiError`.
//!
//! # Design
//! - `ClientConfig` is built once and read-only afterwards.
//! - Request and response bodies are schema-less `Payload` maps; the remote
//!   service owns domain validation.
//! - `DatabunkerClient` exposes `build_*` methods alongside the executing
//!   ones, so callers can run the network round-trip themselves.
//! - No retries, no caching: one call is one exchange.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod transport;
pub mod types;

pub use client::DatabunkerClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use gateway::{parse_response, Gateway};
pub use http::{encode_segment, HttpMethod, HttpRequest, HttpResponse, RequestDescriptor};
pub use transport::{Transport, UreqTransport};
pub use types::{to_payload, CallOptions, Payload};
