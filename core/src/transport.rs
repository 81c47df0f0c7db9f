//! Transport seam between the gateway and the network.
//!
//! # Design
//! The gateway only knows how to turn descriptors into `HttpRequest` values
//! and `HttpResponse` values into payloads. A `Transport` performs the one
//! blocking exchange in between. `UreqTransport` is the default; tests and
//! embedders can supply their own.

use std::fmt;
use std::time::Duration;

use ureq::{Agent, RequestBuilder};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one HTTP exchange and returns the response as data.
///
/// Non-2xx statuses must be returned as `Ok(HttpResponse)`; only failures to
/// complete the exchange are errors.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq` agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Agent with no timeout.
    pub fn new() -> Self {
        Self::from_agent(
            Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent(),
        )
    }

    /// Agent whose whole exchange is bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::from_agent(
            Agent::config_builder()
                .http_status_as_error(false)
                .timeout_global(Some(timeout))
                .build()
                .new_agent(),
        )
    }

    /// Wrap a preconfigured agent. It must not treat HTTP status codes as
    /// errors, otherwise error bodies are lost.
    pub fn from_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_headers<B>(mut builder: RequestBuilder<B>, headers: &[(String, String)]) -> RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.path.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref();

        let result = match (request.method, body) {
            (HttpMethod::Get, None) => apply_headers(self.agent.get(url), headers).call(),
            (HttpMethod::Get, Some(body)) => {
                apply_headers(self.agent.get(url).force_send_body(), headers).send(body.as_bytes())
            }
            (HttpMethod::Delete, None) => apply_headers(self.agent.delete(url), headers).call(),
            (HttpMethod::Delete, Some(body)) => {
                apply_headers(self.agent.delete(url).force_send_body(), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, Some(body)) => {
                apply_headers(self.agent.post(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Post, None) => apply_headers(self.agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => {
                apply_headers(self.agent.put(url), headers).send(body.as_bytes())
            }
            (HttpMethod::Put, None) => apply_headers(self.agent.put(url), headers).send_empty(),
        };

        let mut response = result
            .map_err(|e| ApiError::Connection(format!("{} {url}: {e}", request.method)))?;

        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Unbounded; bulk responses can exceed ureq's default limit.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| ApiError::Connection(format!("reading response body: {e}")))?;

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    /// Answer one request on a raw socket with `status_line` and `body`.
    fn serve_once(status_line: &'static str, body: Vec<u8>) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            let preamble = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(preamble.as_bytes()).unwrap();
            stream.write_all(&body).unwrap();
        });
        port
    }

    fn get(port: u16) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("http://127.0.0.1:{port}/v2/system/stats"),
            route: "/v2/system/stats".to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn non_utf8_body_is_returned_as_bytes() {
        let port = serve_once("200 OK", vec![0xFF, 0xFE, b'{', b'}']);
        let response = UreqTransport::with_timeout(Duration::from_secs(5))
            .execute(&get(port))
            .unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, vec![0xFF, 0xFE, b'{', b'}']);
    }

    #[test]
    fn body_larger_than_ten_mib_is_read_in_full() {
        let filler = "x".repeat(11 * 1024 * 1024);
        let body = format!(r#"{{"status":"ok","filler":"{filler}"}}"#).into_bytes();
        let expected_len = body.len();
        let port = serve_once("200 OK", body);
        let response = UreqTransport::with_timeout(Duration::from_secs(30))
            .execute(&get(port))
            .unwrap();
        assert_eq!(response.body.len(), expected_len);
    }

    #[test]
    fn error_status_is_data_not_an_error() {
        let port = serve_once("503 Service Unavailable", b"maintenance".to_vec());
        let response = UreqTransport::new().execute(&get(port)).unwrap();
        assert_eq!(response.status, 503);
        assert_eq!(response.text(), "maintenance");
    }

    #[test]
    fn unreachable_host_is_a_connection_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let request = HttpRequest {
            method: HttpMethod::Get,
            path: format!("http://127.0.0.1:{port}/v2/system/stats"),
            route: "/v2/system/stats".to_string(),
            headers: Vec::new(),
            body: None,
        };
        let err = UreqTransport::with_timeout(Duration::from_secs(5))
            .execute(&request)
            .unwrap_err();
        assert!(matches!(err, ApiError::Connection(ref m) if m.contains("GET")));
    }
}
