//! Outbound proxy selection.
//!
//! The [`Proxy`] facade has no default adapter: without one, hits go out
//! directly. Proxy endpoints are checked with the [`Url`](crate::validate::Url)
//! validator when configured.

mod rotating;

pub use rotating::{ProxyHealthReport, ProxyStats, RotatingProxy};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::core::{
    Adapter, AdapterError, AdapterFamily, AdapterResult, AdapterSpec, Facade, Options, OptionsBag,
};
use crate::validate::{Url, Validator};

/// Proxy-selection capability.
pub trait ProxyAdapter: Adapter {
    /// Endpoint to use for the next request, `None` to connect directly.
    fn next_proxy(&mut self) -> Option<String>;

    fn report_success(&mut self, _proxy: &str) {}

    fn report_failure(&mut self, _proxy: &str) {}
}

/// Validates a proxy endpoint, returning the validator messages on failure.
pub(crate) fn validate_endpoint(name: &str, value: &Value) -> AdapterResult<String> {
    let mut validator = Url::new();
    if validator.is_valid(value.clone())
        && let Some(endpoint) = value.as_str()
    {
        return Ok(endpoint.to_owned());
    }
    Err(AdapterError::InvalidArgument(format!(
        "{name}: {}",
        validator.messages().join("; ")
    )))
}

/// Always routes through the endpoint in the `url` option.
#[derive(Debug, Clone, Default)]
pub struct FixedProxy {
    options: OptionsBag,
}

impl FixedProxy {
    pub const URL: &'static str = "url";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(url: &str) -> AdapterResult<Self> {
        let mut proxy = Self::new();
        proxy.set_option(Self::URL, Value::String(url.to_owned()))?;
        Ok(proxy)
    }
}

impl Adapter for FixedProxy {
    fn type_name(&self) -> &'static str {
        "fixed"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }

    fn set_option(&mut self, name: &str, value: Value) -> AdapterResult<()> {
        if name == Self::URL {
            validate_endpoint(name, &value)?;
        }
        self.options.set(name, value);
        Ok(())
    }
}

impl ProxyAdapter for FixedProxy {
    fn next_proxy(&mut self) -> Option<String> {
        self.options.get_str(Self::URL).map(str::to_owned)
    }
}

fn fixed_adapter() -> Box<dyn ProxyAdapter> {
    Box::new(FixedProxy::new())
}

fn rotating_adapter() -> Box<dyn ProxyAdapter> {
    Box::new(RotatingProxy::new())
}

/// Registered proxy strategies.
pub static PROXY_ADAPTERS: Lazy<AdapterFamily<dyn ProxyAdapter>> = Lazy::new(|| {
    AdapterFamily::new("proxy")
        .register("fixed", fixed_adapter)
        .register("rotating", rotating_adapter)
});

/// Front object holding the active proxy strategy, if any.
#[derive(Debug)]
pub struct Proxy {
    facade: Facade<dyn ProxyAdapter>,
}

impl Proxy {
    /// Facade without a strategy; [`Proxy::is_configured`] is `false`.
    pub fn new() -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::new(&PROXY_ADAPTERS)?,
        })
    }

    pub fn with_options(
        options: Options,
        adapter: Option<AdapterSpec<dyn ProxyAdapter>>,
    ) -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::with_options(&PROXY_ADAPTERS, options, adapter)?,
        })
    }

    pub fn with_adapter(adapter: impl Into<AdapterSpec<dyn ProxyAdapter>>) -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::with_adapter(&PROXY_ADAPTERS, adapter)?,
        })
    }

    pub fn facade(&self) -> &Facade<dyn ProxyAdapter> {
        &self.facade
    }

    pub fn facade_mut(&mut self) -> &mut Facade<dyn ProxyAdapter> {
        &mut self.facade
    }

    pub fn set_adapter(
        &mut self,
        adapter: impl Into<AdapterSpec<dyn ProxyAdapter>>,
    ) -> AdapterResult<&mut Self> {
        self.facade.set_adapter(adapter)?;
        Ok(self)
    }

    pub fn get_adapter(&self) -> Option<&dyn ProxyAdapter> {
        self.facade.get_adapter()
    }

    pub fn is_configured(&self) -> bool {
        self.facade.is_configured()
    }

    pub fn next_proxy(&mut self) -> AdapterResult<Option<String>> {
        Ok(self.facade.adapter_mut("next_proxy")?.next_proxy())
    }

    pub fn report_success(&mut self, proxy: &str) -> AdapterResult<()> {
        self.facade.adapter_mut("report_success")?.report_success(proxy);
        Ok(())
    }

    pub fn report_failure(&mut self, proxy: &str) -> AdapterResult<()> {
        self.facade.adapter_mut("report_failure")?.report_failure(proxy);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unconfigured_by_default() {
        let mut proxy = Proxy::new().unwrap();
        assert!(!proxy.is_configured());
        assert_eq!(
            proxy.next_proxy().unwrap_err(),
            AdapterError::NotConfigured {
                operation: "proxy::next_proxy".into()
            }
        );
    }

    #[test]
    fn fixed_proxy_from_options() {
        let mut options = Options::new();
        options.insert("adapter".into(), json!("fixed"));
        let mut proxy = Proxy::with_options(options, None).unwrap();
        proxy
            .facade_mut()
            .get_adapter_mut()
            .unwrap()
            .set_option(FixedProxy::URL, json!("http://proxy.internal:3128"))
            .unwrap();
        assert_eq!(
            proxy.next_proxy().unwrap().as_deref(),
            Some("http://proxy.internal:3128")
        );
    }

    #[test]
    fn fixed_proxy_validates_endpoint() {
        let err = FixedProxy::with_url("proxy.internal:3128").unwrap_err();
        match err {
            AdapterError::InvalidArgument(message) => {
                assert!(message.contains("is an invalid URL"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
