//! HTTP transport adapters.
//!
//! The tracker never talks to a client library directly; it builds an
//! [`HttpRequest`] and hands it to whichever [`HttpAdapter`] the [`Http`]
//! facade currently holds.

mod reqwest_client;

pub use reqwest_client::ReqwestHttpAdapter;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use http::Method;
use once_cell::sync::Lazy;
use serde_json::{Value, json};
use thiserror::Error;
use url::Url;

use crate::core::{
    Adapter, AdapterError, AdapterFamily, AdapterResult, AdapterSpec, Facade, Options, OptionsBag,
};

/// Google Analytics collection endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "https://www.google-analytics.com/collect";

/// Facade option naming the collection endpoint.
pub const ENDPOINT_OPTION: &str = "endpoint";

/// Outgoing request handed to a transport adapter.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub proxy: Option<String>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            proxy: None,
        }
    }

    /// POST with an `application/x-www-form-urlencoded` body.
    pub fn form(url: Url, body: impl Into<Bytes>) -> Self {
        let mut request = Self::new(Method::POST, url);
        request.headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        request.body = Some(body.into());
        request
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

/// Response returned by a transport adapter.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http transport error: {0}")]
    Transport(String),
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),
}

/// Transport capability.
#[async_trait]
pub trait HttpAdapter: Adapter {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Transport that drops every request and reports `204 No Content`.
#[derive(Debug, Default)]
pub struct NullHttpAdapter {
    options: OptionsBag,
}

impl NullHttpAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Adapter for NullHttpAdapter {
    fn type_name(&self) -> &'static str {
        "null"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }
}

#[async_trait]
impl HttpAdapter for NullHttpAdapter {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        log::debug!("null transport dropped {} {}", request.method, request.url);
        Ok(HttpResponse {
            status: 204,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        })
    }
}

fn reqwest_adapter() -> Box<dyn HttpAdapter> {
    Box::new(ReqwestHttpAdapter::new())
}

fn null_adapter() -> Box<dyn HttpAdapter> {
    Box::new(NullHttpAdapter::new())
}

/// Registered transports.
pub static HTTP_ADAPTERS: Lazy<AdapterFamily<dyn HttpAdapter>> = Lazy::new(|| {
    let mut defaults = Options::new();
    defaults.insert(ENDPOINT_OPTION.into(), json!(DEFAULT_ENDPOINT));
    AdapterFamily::new("http")
        .with_default_adapter("reqwest")
        .with_default_options(defaults)
        .register("reqwest", reqwest_adapter)
        .register("null", null_adapter)
});

/// Front object holding the active transport.
#[derive(Debug)]
pub struct Http {
    facade: Facade<dyn HttpAdapter>,
}

impl Http {
    pub fn new() -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::new(&HTTP_ADAPTERS)?,
        })
    }

    pub fn with_options(
        options: Options,
        adapter: Option<AdapterSpec<dyn HttpAdapter>>,
    ) -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::with_options(&HTTP_ADAPTERS, options, adapter)?,
        })
    }

    pub fn with_adapter(adapter: impl Into<AdapterSpec<dyn HttpAdapter>>) -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::with_adapter(&HTTP_ADAPTERS, adapter)?,
        })
    }

    pub fn facade(&self) -> &Facade<dyn HttpAdapter> {
        &self.facade
    }

    pub fn facade_mut(&mut self) -> &mut Facade<dyn HttpAdapter> {
        &mut self.facade
    }

    pub fn set_adapter(
        &mut self,
        adapter: impl Into<AdapterSpec<dyn HttpAdapter>>,
    ) -> AdapterResult<&mut Self> {
        self.facade.set_adapter(adapter)?;
        Ok(self)
    }

    pub fn get_adapter(&self) -> Option<&dyn HttpAdapter> {
        self.facade.get_adapter()
    }

    /// Collection endpoint from the facade options, or [`DEFAULT_ENDPOINT`].
    pub fn endpoint(&self) -> &str {
        self.facade
            .get_option(ENDPOINT_OPTION)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_ENDPOINT)
    }

    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.facade.adapter("send")?.send(request).await
    }
}
