//! Client configuration.

use std::fmt;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://pro.databunker.org";

pub const ENV_API_URL: &str = "DATABUNKER_API_URL";
pub const ENV_API_TOKEN: &str = "DATABUNKER_API_TOKEN";
pub const ENV_TENANT_NAME: &str = "DATABUNKER_TENANT_NAME";
pub const ENV_GROUP_ID: &str = "DATABUNKER_GROUP_ID";

/// Connection settings shared by every call made through one client.
///
/// Built once and never mutated. An empty `api_token` or `tenant_name`
/// means the matching header is not sent.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    api_token: String,
    tenant_name: String,
    group_id: Option<String>,
    captcha_code: Option<String>,
}

impl ClientConfig {
    /// Validate `base_url` and strip any trailing slash.
    pub fn new(
        base_url: &str,
        api_token: impl Into<String>,
        tenant_name: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let parsed = Url::parse(trimmed)
            .map_err(|e| ApiError::Config(format!("invalid base URL {trimmed:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "base URL must use http or https, got {:?}",
                parsed.scheme()
            )));
        }
        Ok(Self {
            base_url: trimmed.to_string(),
            api_token: api_token.into(),
            tenant_name: tenant_name.into(),
            group_id: None,
            captcha_code: None,
        })
    }

    /// Load from `DATABUNKER_API_URL`, `DATABUNKER_API_TOKEN`,
    /// `DATABUNKER_TENANT_NAME` and `DATABUNKER_GROUP_ID`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_API_URL)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let config = Self::new(
            &base_url,
            lookup(ENV_API_TOKEN).unwrap_or_default(),
            lookup(ENV_TENANT_NAME).unwrap_or_default(),
        )?;
        Ok(match lookup(ENV_GROUP_ID).filter(|v| !v.is_empty()) {
            Some(group_id) => config.with_group_id(group_id),
            None => config,
        })
    }

    pub fn with_group_id(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    pub fn with_captcha_code(mut self, code: impl Into<String>) -> Self {
        self.captcha_code = Some(code.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_token(&self) -> &str {
        &self.api_token
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn captcha_code(&self) -> Option<&str> {
        self.captcha_code.as_deref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.api_token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_token", &token)
            .field("tenant_name", &self.tenant_name)
            .field("group_id", &self.group_id)
            .field("captcha_code", &self.captcha_code)
            .finish()
    }
}
