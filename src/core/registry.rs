//! Name → factory registry for adapter families.
//!
//! Each family (HTTP transport, bot info, proxy) owns one process-wide
//! [`AdapterFamily`] that maps canonical adapter names to constructors. This is
//! the only lookup mechanism; there is no dynamic plugin discovery.

use std::collections::BTreeMap;

use super::adapter::{Adapter, AdapterError, AdapterResult};
use super::options::Options;

/// Constructor for a registered adapter, always called without arguments.
pub type AdapterFactory<A> = fn() -> Box<A>;

/// Canonical form of an adapter name: trimmed, lowercase, `-` folded to `_`.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

/// Descriptor of one adapter family.
pub struct AdapterFamily<A: ?Sized> {
    name: &'static str,
    default_adapter: Option<&'static str>,
    default_options: Options,
    factories: BTreeMap<String, AdapterFactory<A>>,
}

impl<A: Adapter + ?Sized> AdapterFamily<A> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            default_adapter: None,
            default_options: Options::new(),
            factories: BTreeMap::new(),
        }
    }

    /// Adapter resolved when a facade is built without naming one.
    pub fn with_default_adapter(mut self, name: &'static str) -> Self {
        self.default_adapter = Some(name);
        self
    }

    /// Options a facade applies to itself when constructed with arguments.
    pub fn with_default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }

    pub fn register(mut self, name: &str, factory: AdapterFactory<A>) -> Self {
        self.factories.insert(canonical_name(name), factory);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_adapter(&self) -> Option<&'static str> {
        self.default_adapter
    }

    pub fn default_options(&self) -> &Options {
        &self.default_options
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&canonical_name(name))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiates the adapter registered under `name`.
    pub fn resolve(&self, name: &str) -> AdapterResult<Box<A>> {
        let key = canonical_name(name);
        let factory = self.factories.get(&key).ok_or_else(|| {
            AdapterError::InvalidArgument(format!(
                "'{name}' does not name a {} adapter (known: {})",
                self.name,
                self.names().join(", ")
            ))
        })?;
        Ok(factory())
    }
}

impl<A: ?Sized> std::fmt::Debug for AdapterFamily<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFamily")
            .field("name", &self.name)
            .field("default_adapter", &self.default_adapter)
            .field("default_options", &self.default_options)
            .field("adapters", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
