//! Hit forwarding.
//!
//! Wires the HTTP, bot-info and proxy facades together: each hit is screened
//! for bots, its client fields are validated, and the remaining payload is
//! posted to the collection endpoint.

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderValue, USER_AGENT};
use rand::Rng;
use serde_json::Value;
use std::net::IpAddr;
use thiserror::Error;
use tokio::sync::Mutex;
use url::{Url, form_urlencoded};

use crate::config::{AdapterConfig, ConfigError, TrackerConfig};
use crate::core::{Adapter, AdapterError, AdapterSpec, Facade};
use crate::external_deps::http::{Http, HttpAdapter, HttpRequest, TransportError};
use crate::modules::bot_info::{BotInfo, BotInfoAdapter, BotVerdict};
use crate::modules::proxy::{Proxy, ProxyAdapter};
use crate::validate::{IpAddress, Url as UrlValidator, Validator};

/// Result alias used by the tracker.
pub type TrackerResult<T> = Result<T, TrackerError>;

#[derive(Debug, Error)]
pub enum TrackerError {
	#[error("adapter error: {0}")]
	Adapter(#[from] AdapterError),
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),
	#[error("url parse error: {0}")]
	Url(#[from] url::ParseError),
	#[error("header conversion failed: {0}")]
	InvalidHeader(String),
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),
}

/// A single measurement to forward.
///
/// Parameters are passed through untouched, in insertion order. The client
/// fields become the `ua`, `uip` and `dr` parameters once validated.
#[derive(Debug, Clone, Default)]
pub struct Hit {
	params: Vec<(String, String)>,
	user_agent: Option<String>,
	client_ip: Option<String>,
	referrer: Option<String>,
}

impl Hit {
	pub fn new() -> Self {
		Self::default()
	}

	/// Page view for `path` (`t=pageview`, `dp=<path>`).
	pub fn pageview(path: impl Into<String>) -> Self {
		Self::new().with_param("t", "pageview").with_param("dp", path)
	}

	/// Event hit (`t=event`, `ec`, `ea`).
	pub fn event(category: impl Into<String>, action: impl Into<String>) -> Self {
		Self::new()
			.with_param("t", "event")
			.with_param("ec", category)
			.with_param("ea", action)
	}

	pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.push((name.into(), value.into()));
		self
	}

	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
		self.client_ip = Some(ip.into());
		self
	}

	pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
		self.referrer = Some(referrer.into());
		self
	}

	pub fn params(&self) -> &[(String, String)] {
		&self.params
	}

	pub fn has_param(&self, name: &str) -> bool {
		self.params.iter().any(|(key, _)| key == name)
	}

	pub fn user_agent(&self) -> Option<&str> {
		self.user_agent.as_deref()
	}

	pub fn client_ip(&self) -> Option<&str> {
		self.client_ip.as_deref()
	}

	pub fn referrer(&self) -> Option<&str> {
		self.referrer.as_deref()
	}
}

/// What happened to a hit.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
	/// Posted to the endpoint; `status` is whatever the endpoint answered.
	Sent { status: u16, sent_at: DateTime<Utc> },
	/// Dropped because the bot-info source flagged the client.
	SkippedBot(BotVerdict),
}

impl TrackOutcome {
	pub fn is_sent(&self) -> bool {
		matches!(self, TrackOutcome::Sent { .. })
	}
}

/// Fluent builder for [`Tracker`].
pub struct TrackerBuilder {
	config: TrackerConfig,
	http_adapter: Option<Box<dyn HttpAdapter>>,
	bot_info_adapter: Option<Box<dyn BotInfoAdapter>>,
	proxy_adapter: Option<Box<dyn ProxyAdapter>>,
}

impl TrackerBuilder {
	pub fn new() -> Self {
		Self {
			config: TrackerConfig::default(),
			http_adapter: None,
			bot_info_adapter: None,
			proxy_adapter: None,
		}
	}

	pub fn with_config(mut self, config: TrackerConfig) -> Self {
		self.config = config;
		self
	}

	/// Uses `adapter` instead of the one named in the `http` config section.
	pub fn with_http_adapter(mut self, adapter: Box<dyn HttpAdapter>) -> Self {
		self.http_adapter = Some(adapter);
		self
	}

	pub fn with_bot_info_adapter(mut self, adapter: Box<dyn BotInfoAdapter>) -> Self {
		self.bot_info_adapter = Some(adapter);
		self
	}

	pub fn with_proxy_adapter(mut self, adapter: Box<dyn ProxyAdapter>) -> Self {
		self.proxy_adapter = Some(adapter);
		self
	}

	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.config.endpoint = Some(endpoint.into());
		self
	}

	pub fn with_tracking_id(mut self, tracking_id: impl Into<String>) -> Self {
		self.config.tracking_id = Some(tracking_id.into());
		self
	}

	pub fn disable_bot_filter(mut self) -> Self {
		self.config.filter_bots = false;
		self
	}

	pub fn build(self) -> TrackerResult<Tracker> {
		self.config.validate()?;

		let mut http = Http::with_options(
			Default::default(),
			adapter_spec(&self.config.http, self.http_adapter),
		)?;
		apply_adapter_options(http.facade_mut(), &self.config.http)?;

		let mut bot_info = BotInfo::with_options(
			Default::default(),
			adapter_spec(&self.config.bot_info, self.bot_info_adapter),
		)?;
		apply_adapter_options(bot_info.facade_mut(), &self.config.bot_info)?;

		let mut proxy = Proxy::with_options(
			Default::default(),
			adapter_spec(&self.config.proxy, self.proxy_adapter),
		)?;
		apply_adapter_options(proxy.facade_mut(), &self.config.proxy)?;

		let endpoint = match &self.config.endpoint {
			Some(endpoint) => Url::parse(endpoint)?,
			None => Url::parse(http.endpoint())?,
		};

		log::debug!(
			"tracker ready: endpoint={} bot_filter={} proxy={}",
			endpoint,
			self.config.filter_bots,
			proxy.is_configured()
		);

		Ok(Tracker {
			config: self.config,
			endpoint,
			http,
			bot_info,
			proxy: Mutex::new(proxy),
		})
	}
}

impl Default for TrackerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

fn adapter_spec<A: Adapter + ?Sized>(
	section: &AdapterConfig,
	instance: Option<Box<A>>,
) -> Option<AdapterSpec<A>> {
	match instance {
		Some(adapter) => Some(AdapterSpec::Instance(adapter)),
		None => section.adapter.clone().map(AdapterSpec::Named),
	}
}

fn apply_adapter_options<A: Adapter + ?Sized + 'static>(
	facade: &mut Facade<A>,
	section: &AdapterConfig,
) -> Result<(), AdapterError> {
	if section.options.is_empty() {
		return Ok(());
	}
	facade
		.adapter_mut("set_options")?
		.set_options(section.options.clone())
}

/// Forwards hits to the collection endpoint.
pub struct Tracker {
	config: TrackerConfig,
	endpoint: Url,
	http: Http,
	bot_info: BotInfo,
	proxy: Mutex<Proxy>,
}

impl Tracker {
	/// Tracker with the default adapters and no tracking id.
	pub fn new() -> TrackerResult<Self> {
		TrackerBuilder::new().build()
	}

	pub fn builder() -> TrackerBuilder {
		TrackerBuilder::new()
	}

	pub fn from_config(config: TrackerConfig) -> TrackerResult<Self> {
		TrackerBuilder::new().with_config(config).build()
	}

	pub fn config(&self) -> &TrackerConfig {
		&self.config
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	pub fn http(&self) -> &Http {
		&self.http
	}

	pub fn bot_info(&self) -> &BotInfo {
		&self.bot_info
	}

	pub fn proxy(&self) -> &Mutex<Proxy> {
		&self.proxy
	}

	/// Screens, validates and forwards one hit.
	pub async fn track(&self, hit: &Hit) -> TrackerResult<TrackOutcome> {
		if self.config.filter_bots
			&& let Some(user_agent) = hit.user_agent()
		{
			let ip = hit.client_ip().and_then(|raw| raw.trim().parse::<IpAddr>().ok());
			if let Some(verdict) = self.bot_info.lookup(user_agent, ip)?
				&& verdict.is_bot
			{
				log::debug!(
					"skipping hit from bot (source={}, matched={:?})",
					verdict.source,
					verdict.matched
				);
				return Ok(TrackOutcome::SkippedBot(verdict));
			}
		}

		let client_ip = checked_field(IpAddress::new(), "client ip", hit.client_ip());
		let referrer = checked_field(UrlValidator::new(), "referrer", hit.referrer());

		let body = self.encode(hit, client_ip.as_deref(), referrer.as_deref());
		let mut headers = HeaderMap::new();
		if let Some(user_agent) = hit.user_agent() {
			let value = HeaderValue::from_str(user_agent)
				.map_err(|err| TrackerError::InvalidHeader(err.to_string()))?;
			headers.insert(USER_AGENT, value);
		}

		let proxy = {
			let mut guard = self.proxy.lock().await;
			if guard.is_configured() {
				guard.next_proxy()?
			} else {
				None
			}
		};

		let request = HttpRequest::form(self.endpoint.clone(), body)
			.with_headers(headers)
			.with_proxy(proxy.clone());
		let result = self.http.send(&request).await;

		if let Some(endpoint) = proxy.as_deref() {
			let mut guard = self.proxy.lock().await;
			match &result {
				Ok(_) => guard.report_success(endpoint)?,
				Err(err) => {
					log::warn!("hit via proxy {} failed: {}", endpoint, err);
					guard.report_failure(endpoint)?;
				}
			}
		}

		let response = result?;
		if !response.is_success() {
			log::warn!("collection endpoint answered {}", response.status);
		}
		log::debug!("hit sent to {} ({})", self.endpoint, response.status);

		Ok(TrackOutcome::Sent {
			status: response.status,
			sent_at: Utc::now(),
		})
	}

	fn encode(&self, hit: &Hit, client_ip: Option<&str>, referrer: Option<&str>) -> String {
		let mut form = form_urlencoded::Serializer::new(String::new());
		if !hit.has_param("v") {
			form.append_pair("v", "1");
		}
		if !hit.has_param("tid")
			&& let Some(tracking_id) = &self.config.tracking_id
		{
			form.append_pair("tid", tracking_id);
		}
		for (name, value) in hit.params() {
			form.append_pair(name, value);
		}
		if let Some(ip) = client_ip {
			form.append_pair("uip", ip);
		}
		if let Some(referrer) = referrer {
			form.append_pair("dr", referrer);
		}
		if let Some(user_agent) = hit.user_agent() {
			form.append_pair("ua", user_agent);
		}
		let cache_buster: u32 = rand::thread_rng().r#gen();
		form.append_pair("z", &cache_buster.to_string());
		form.finish()
	}
}

/// Runs `raw` through a fresh validator, dropping it with a warning when it
/// fails.
fn checked_field<V: Validator>(mut validator: V, field: &str, raw: Option<&str>) -> Option<String> {
	let raw = raw?.trim();
	if validator.is_valid(Value::String(raw.to_owned())) {
		Some(raw.to_owned())
	} else {
		log::warn!("dropping {}: {}", field, validator.messages().join("; "));
		None
	}
}
