use crate::domain::endpoint::{ApiBase, Endpoint};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_base(&self) -> ApiBase;
    fn access_token(&self) -> Option<&str>;
    fn timeout_seconds(&self) -> u64;
    fn user_agent(&self) -> &str;
    fn allow_disabled_endpoints(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub vin: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            vin: None,
            body: None,
        }
    }

    pub fn for_vehicle(endpoint: Endpoint, vin: impl Into<String>) -> Self {
        Self {
            endpoint,
            vin: Some(vin.into()),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub endpoint: Endpoint,
    pub status: u16,
    /// `None` for empty bodies, which commands commonly return.
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn into_json(self) -> Value {
        self.body.unwrap_or(Value::Null)
    }
}

#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}
