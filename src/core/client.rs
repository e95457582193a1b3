use crate::config::toml_config::ApiConfig;
use crate::core::auth::TokenSet;
use crate::domain::endpoint::{ApiBase, HttpMethod};
use crate::domain::ports::{ApiRequest, ApiResponse, ApiTransport, ConfigProvider};
use crate::utils::error::{ConnectorError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

const MAX_ERROR_BODY_LEN: usize = 300;

/// `reqwest` backed transport for the MySkoda API.
pub struct SkodaClient {
    client: Client,
    base: ApiBase,
    tokens: Option<TokenSet>,
    allow_disabled: bool,
}

impl SkodaClient {
    pub fn new(base: ApiBase, tokens: Option<TokenSet>) -> Result<Self> {
        let defaults = ApiConfig::default();
        Ok(Self {
            client: build_http_client(defaults.timeout_seconds, &defaults.user_agent)?,
            base,
            tokens,
            allow_disabled: false,
        })
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let tokens = config
            .access_token()
            .map(|token| TokenSet::new(token.to_string(), None, None));
        Ok(Self {
            client: build_http_client(config.timeout_seconds(), config.user_agent())?,
            base: config.api_base(),
            tokens,
            allow_disabled: config.allow_disabled_endpoints(),
        })
    }

    pub fn with_tokens(mut self, tokens: TokenSet) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn allow_disabled_endpoints(mut self, allow: bool) -> Self {
        self.allow_disabled = allow;
        self
    }

    pub fn base(&self) -> &ApiBase {
        &self.base
    }
}

fn build_http_client(timeout_seconds: u64, user_agent: &str) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .user_agent(user_agent)
        .build()?)
}

/// Decodes a response body. A JSON content type must parse; without a
/// content type, JSON is tried first and anything else is kept as text.
fn parse_body(text: &str, content_type: Option<&str>) -> Result<Option<Value>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    match content_type {
        Some(content_type) if content_type.contains("json") => {
            Ok(Some(serde_json::from_str(text)?))
        }
        Some(_) => Ok(Some(Value::String(text.to_string()))),
        None => Ok(Some(
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        )),
    }
}

#[async_trait]
impl ApiTransport for SkodaClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let endpoint = request.endpoint;
        let spec = endpoint.spec();

        if spec.disabled && !self.allow_disabled {
            tracing::warn!("Refusing to call disabled endpoint {}", endpoint);
            return Err(ConnectorError::EndpointDisabled {
                endpoint: endpoint.name().to_string(),
            });
        }

        let url = endpoint.url(&self.base, request.vin.as_deref())?;
        let mut builder = self.client.request(spec.method.into(), url.clone());

        if let Some(tokens) = &self.tokens {
            if tokens.is_expired(Utc::now()) {
                return Err(ConnectorError::TokenExpired);
            }
            builder = builder.header(header::AUTHORIZATION, tokens.bearer());
        }

        match &request.body {
            Some(body) => builder = builder.json(body),
            None if spec.method != HttpMethod::Get => {
                builder = builder.header(header::CONTENT_LENGTH, 0)
            }
            None => {}
        }

        tracing::debug!("{} {}", spec.method, url);
        let response = builder.send().await?;
        let status = response.status();
        tracing::debug!("{} responded with {}", endpoint, status);

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ConnectorError::Unauthorized {
                endpoint: endpoint.name().to_string(),
            });
        }
        if !status.is_success() {
            return Err(ConnectorError::ApiStatus {
                endpoint: endpoint.name().to_string(),
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_LEN).collect(),
            });
        }

        Ok(ApiResponse {
            endpoint,
            status: status.as_u16(),
            body: parse_body(&text, content_type.as_deref())?,
        })
    }
}
