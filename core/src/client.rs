//! Endpoint wrappers for the DatabunkerPro API.
//!
//! # Design
//! Each operation has a `build_*` method that produces the `HttpRequest`
//! without touching the network, and an executing method that sends it
//! through the gateway. Identifier segments (mode, identity, token) are
//! always percent-encoded before they reach the path.

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::http::{encode_segment, HttpMethod, HttpRequest, RequestDescriptor};
use crate::transport::{Transport, UreqTransport};
use crate::types::{CallOptions, Payload};

/// Blocking client for the DatabunkerPro API.
///
/// Holds only the read-only configuration and the transport, so one
/// instance can be shared across threads.
#[derive(Debug, Clone)]
pub struct DatabunkerClient<T: Transport = UreqTransport> {
    gateway: Gateway<T>,
}

impl DatabunkerClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            gateway: Gateway::new(config),
        }
    }

    /// Client configured from `DATABUNKER_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }
}

impl<T: Transport> DatabunkerClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            gateway: Gateway::with_transport(config, transport),
        }
    }

    pub fn gateway(&self) -> &Gateway<T> {
        &self.gateway
    }

    fn build(&self, descriptor: RequestDescriptor, opts: &CallOptions) -> Result<HttpRequest, ApiError> {
        self.gateway.build_request(&descriptor, opts)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn build_create_user(&self, profile: &Payload, opts: &CallOptions) -> Result<HttpRequest, ApiError> {
        self.build(
            RequestDescriptor::new(HttpMethod::Post, "/user").with_body(profile.clone()),
            opts,
        )
    }

    /// Create a user from `profile`. The response carries the new user
    /// `token`.
    pub fn create_user(&self, profile: &Payload, opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_create_user(profile, opts)?)
    }

    pub fn build_create_users_bulk(
        &self,
        records: &[Payload],
        opts: &CallOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut body = Payload::new();
        body.insert(
            "records".to_string(),
            Value::Array(records.iter().cloned().map(Value::Object).collect()),
        );
        self.build(
            RequestDescriptor::new(HttpMethod::Post, "/users/bulk").with_body(body),
            opts,
        )
    }

    /// Create several users in one request. Each record holds a `profile`
    /// and optional group/role fields; `opts.extra` carries global settings
    /// such as `finaltime` and `slidingtime`.
    pub fn create_users_bulk(&self, records: &[Payload], opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_create_users_bulk(records, opts)?)
    }

    pub fn build_get_user(&self, mode: &str, identity: &str, opts: &CallOptions) -> Result<HttpRequest, ApiError> {
        self.build(RequestDescriptor::new(HttpMethod::Get, user_path(mode, identity)).with_route(USER_ROUTE), opts)
    }

    /// Fetch a user by `mode` (`token`, `email`, `phone`, `login`, ...).
    pub fn get_user(&self, mode: &str, identity: &str, opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_get_user(mode, identity, opts)?)
    }

    pub fn build_update_user(
        &self,
        mode: &str,
        identity: &str,
        profile: &Payload,
        opts: &CallOptions,
    ) -> Result<HttpRequest, ApiError> {
        self.build(
            RequestDescriptor::new(HttpMethod::Put, user_path(mode, identity))
                .with_route(USER_ROUTE)
                .with_body(profile.clone()),
            opts,
        )
    }

    pub fn update_user(
        &self,
        mode: &str,
        identity: &str,
        profile: &Payload,
        opts: &CallOptions,
    ) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_update_user(mode, identity, profile, opts)?)
    }

    pub fn build_delete_user(&self, mode: &str, identity: &str, opts: &CallOptions) -> Result<HttpRequest, ApiError> {
        self.build(RequestDescriptor::new(HttpMethod::Delete, user_path(mode, identity)).with_route(USER_ROUTE), opts)
    }

    pub fn delete_user(&self, mode: &str, identity: &str, opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_delete_user(mode, identity, opts)?)
    }

    // -----------------------------------------------------------------------
    // System
    // -----------------------------------------------------------------------

    pub fn build_get_system_stats(&self, opts: &CallOptions) -> Result<HttpRequest, ApiError> {
        self.build(RequestDescriptor::new(HttpMethod::Get, "/system/stats"), opts)
    }

    pub fn get_system_stats(&self, opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_get_system_stats(opts)?)
    }

    // -----------------------------------------------------------------------
    // Tokens
    // -----------------------------------------------------------------------

    pub fn build_create_token(
        &self,
        token_type: &str,
        record: &str,
        opts: &CallOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut body = Payload::new();
        body.insert("tokentype".to_string(), Value::from(token_type));
        body.insert("record".to_string(), Value::from(record));
        self.build(RequestDescriptor::new(HttpMethod::Post, "/token").with_body(body), opts)
    }

    /// Tokenize a sensitive `record` (for example a card number) as
    /// `token_type`.
    pub fn create_token(&self, token_type: &str, record: &str, opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_create_token(token_type, record, opts)?)
    }

    pub fn build_get_token(&self, token: &str, opts: &CallOptions) -> Result<HttpRequest, ApiError> {
        self.build(RequestDescriptor::new(HttpMethod::Get, token_path(token)).with_route(TOKEN_ROUTE), opts)
    }

    pub fn get_token(&self, token: &str, opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_get_token(token, opts)?)
    }

    pub fn build_delete_token(&self, token: &str, opts: &CallOptions) -> Result<HttpRequest, ApiError> {
        self.build(RequestDescriptor::new(HttpMethod::Delete, token_path(token)).with_route(TOKEN_ROUTE), opts)
    }

    pub fn delete_token(&self, token: &str, opts: &CallOptions) -> Result<Payload, ApiError> {
        self.gateway.send(self.build_delete_token(token, opts)?)
    }
}

const USER_ROUTE: &str = "/user/{mode}/{identity}";
const TOKEN_ROUTE: &str = "/token/{token}";

fn user_path(mode: &str, identity: &str) -> String {
    format!("/user/{}/{}", encode_segment(mode), encode_segment(identity))
}

fn token_path(token: &str) -> String {
    format!("/token/{}", encode_segment(token))
}
