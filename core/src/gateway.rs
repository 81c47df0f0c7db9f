//! Request gateway: every API call passes through here.
//!
//! # Design
//! `Gateway` holds the read-only `ClientConfig` and a `Transport`. A call is
//! split into `build_request` (descriptor + options into a transport-ready
//! `HttpRequest`), the transport exchange, and `parse_response` (status and
//! envelope checks). There is no retry: one call is one exchange.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, RequestDescriptor};
use crate::transport::{Transport, UreqTransport};
use crate::types::{CallOptions, Payload};

pub const API_PREFIX: &str = "/v2";

pub const HEADER_TOKEN: &str = "X-Bunker-Token";
pub const HEADER_TENANT: &str = "X-Bunker-Tenant";
pub const HEADER_GROUP_ID: &str = "X-Bunker-GroupId";
pub const HEADER_CAPTCHA: &str = "X-Captcha-Code";

const STATUS_FIELD: &str = "status";
const MESSAGE_FIELD: &str = "message";
const STATUS_ERROR: &str = "error";
const REQUEST_METADATA_FIELD: &str = "request_metadata";
const FALLBACK_MESSAGE: &str = "API request failed";

#[derive(Debug, Clone)]
pub struct Gateway<T: Transport = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl Gateway<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> Gateway<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the outbound request for `descriptor`.
    ///
    /// The body is the descriptor body with `options.extra` merged on top and
    /// `options.request_metadata` under `"request_metadata"`. It is omitted
    /// entirely when none of the three are present.
    pub fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        options: &CallOptions,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if !self.config.api_token().is_empty() {
            headers.push((HEADER_TOKEN.to_string(), self.config.api_token().to_string()));
        }
        if !self.config.tenant_name().is_empty() {
            headers.push((HEADER_TENANT.to_string(), self.config.tenant_name().to_string()));
        }
        if let Some(group_id) = options.group_id.as_deref().or(self.config.group_id()) {
            headers.push((HEADER_GROUP_ID.to_string(), group_id.to_string()));
        }
        if let Some(code) = options.captcha_code.as_deref().or(self.config.captcha_code()) {
            headers.push((HEADER_CAPTCHA.to_string(), code.to_string()));
        }

        let body = match merge_body(descriptor.body.as_ref(), options) {
            Some(body) => Some(
                serde_json::to_string(&body).map_err(|e| ApiError::Serialization(e.to_string()))?,
            ),
            None => None,
        };

        Ok(HttpRequest {
            method: descriptor.method,
            path: format!("{}{API_PREFIX}{}", self.config.base_url(), descriptor.path),
            route: format!("{API_PREFIX}{}", descriptor.route),
            headers,
            body,
        })
    }

    /// Execute an already built request.
    ///
    /// Only the route template is logged; the URL carries user identifiers.
    pub fn send(&self, request: HttpRequest) -> Result<Payload, ApiError> {
        debug!(method = %request.method, route = %request.route, "sending request");
        let response = self.transport.execute(&request).map_err(|e| {
            warn!(method = %request.method, route = %request.route, "request failed");
            e
        })?;
        debug!(
            method = %request.method,
            route = %request.route,
            status = response.status,
            "received response"
        );
        parse_response(response)
    }

    pub fn call(
        &self,
        descriptor: &RequestDescriptor,
        options: &CallOptions,
    ) -> Result<Payload, ApiError> {
        self.send(self.build_request(descriptor, options)?)
    }
}

fn merge_body(body: Option<&Payload>, options: &CallOptions) -> Option<Payload> {
    if body.is_none() && options.extra.is_empty() && options.request_metadata.is_none() {
        return None;
    }
    let mut merged = body.cloned().unwrap_or_default();
    for (key, value) in &options.extra {
        merged.insert(key.clone(), value.clone());
    }
    if let Some(metadata) = &options.request_metadata {
        merged.insert(
            REQUEST_METADATA_FIELD.to_string(),
            Value::Object(metadata.clone()),
        );
    }
    Some(merged)
}

/// Map a response onto the three outcomes: payload, `Api` or `Parse`.
pub fn parse_response(response: HttpResponse) -> Result<Payload, ApiError> {
    let decoded = serde_json::from_slice::<Value>(&response.body);

    if !response.is_success() {
        let message = match &decoded {
            Ok(Value::Object(map)) => message_of(map),
            _ => Some(response.text().trim().to_string()).filter(|text| !text.is_empty()),
        };
        return Err(ApiError::Api {
            status: response.status,
            message: message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        });
    }

    let payload = match decoded {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(ApiError::Parse("expected a JSON object".to_string())),
        Err(e) => return Err(ApiError::Parse(e.to_string())),
    };

    if payload.get(STATUS_FIELD).and_then(Value::as_str) == Some(STATUS_ERROR) {
        return Err(ApiError::Api {
            status: response.status,
            message: message_of(&payload).unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        });
    }

    Ok(payload)
}

fn message_of(map: &Payload) -> Option<String> {
    match map.get(MESSAGE_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
