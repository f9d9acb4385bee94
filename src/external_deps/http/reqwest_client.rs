//! Reqwest-based implementation of the `HttpAdapter` trait.
//!
//! Keeps one `reqwest::Client` per proxy endpoint. Clients are built lazily
//! from the adapter options and dropped whenever an option changes.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use super::{HttpAdapter, HttpRequest, HttpResponse, TransportError};
use crate::core::{Adapter, AdapterError, AdapterResult, OptionsBag};

/// Reqwest-backed transport.
///
/// Options: `timeout_secs` (default 10) and `user_agent` (sent when the
/// request carries none).
#[derive(Debug)]
pub struct ReqwestHttpAdapter {
    options: OptionsBag,
    clients: Mutex<HashMap<Option<String>, Client>>,
}

impl ReqwestHttpAdapter {
    pub const TIMEOUT_SECS: &'static str = "timeout_secs";
    pub const USER_AGENT: &'static str = "user_agent";

    pub fn new() -> Self {
        let mut options = OptionsBag::new();
        options.set(Self::TIMEOUT_SECS, json!(10));
        Self {
            options,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Wrap an existing reqwest client for direct (non-proxied) requests.
    /// Proxied requests and any later option change still build fresh clients.
    pub fn from_client(client: Client) -> Self {
        let mut adapter = Self::new();
        adapter.clients.get_mut().insert(None, client);
        adapter
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.options.get_u64(Self::TIMEOUT_SECS).unwrap_or(10))
    }

    async fn client(&self, proxy: Option<&str>) -> Result<Client, TransportError> {
        let mut guard = self.clients.lock().await;
        let key = proxy.map(|p| p.to_string());
        if let Some(client) = guard.get(&key) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder().timeout(self.timeout());
        if let Some(agent) = self.options.get_str(Self::USER_AGENT) {
            builder = builder.user_agent(agent);
        }
        if let Some(endpoint) = proxy {
            let proxy = reqwest::Proxy::all(endpoint)
                .map_err(|err| TransportError::Transport(err.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|err| TransportError::Transport(err.to_string()))?;
        guard.insert(key, client.clone());
        Ok(client)
    }
}

impl Default for ReqwestHttpAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for ReqwestHttpAdapter {
    fn type_name(&self) -> &'static str {
        "reqwest"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }

    fn set_option(&mut self, name: &str, value: Value) -> AdapterResult<()> {
        if name == Self::TIMEOUT_SECS && value.as_u64().is_none() {
            return Err(AdapterError::InvalidArgument(format!(
                "{name} must be a non-negative integer, got {value}"
            )));
        }
        self.options.set(name, value);
        self.clients.get_mut().clear();
        Ok(())
    }
}

#[async_trait]
impl HttpAdapter for ReqwestHttpAdapter {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let client = self.client(request.proxy.as_deref()).await?;

        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| TransportError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|err| TransportError::Transport(err.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_numeric_timeout() {
        let mut adapter = ReqwestHttpAdapter::new();
        assert!(matches!(
            adapter.set_option(ReqwestHttpAdapter::TIMEOUT_SECS, json!("soon")),
            Err(AdapterError::InvalidArgument(_))
        ));
        assert_eq!(adapter.timeout(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn caches_client_per_proxy_until_options_change() {
        let mut adapter = ReqwestHttpAdapter::new();
        adapter.client(None).await.unwrap();
        adapter.client(Some("http://127.0.0.1:3128")).await.unwrap();
        assert_eq!(adapter.clients.lock().await.len(), 2);

        adapter
            .set_option(ReqwestHttpAdapter::TIMEOUT_SECS, json!(2))
            .unwrap();
        assert!(adapter.clients.lock().await.is_empty());
        assert_eq!(adapter.timeout(), Duration::from_secs(2));
    }
}
