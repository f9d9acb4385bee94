//! Named collections of adapters sharing one required capability.
//!
//! The capability is the type parameter: a `MultiAdapter<dyn BotInfoAdapter>`
//! only ever accepts bot-info adapters, and the `C: Adapter` bound guarantees
//! every capability extends the base adapter contract.

use serde_json::Value;

use super::adapter::{Adapter, AdapterError, AdapterResult};
use super::options::{Options, OptionsBag};
use super::registry::AdapterFamily;

/// Ordered, uniquely keyed collection of adapters.
///
/// Unnamed adapters are keyed by their [`Adapter::type_name`], so a second
/// unnamed adapter of the same concrete type replaces the first one in place.
pub struct MultiAdapter<C: Adapter + ?Sized> {
    type_name: &'static str,
    adapters: Vec<(String, Box<C>)>,
}

impl<C: Adapter + ?Sized> MultiAdapter<C> {
    /// Creates an empty collection; `type_name` identifies the concrete
    /// container in error messages.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            adapters: Vec::new(),
        }
    }

    /// Creates a collection and populates it through [`MultiAdapter::set_adapters`].
    pub fn with_adapters<I>(type_name: &'static str, adapters: I) -> Self
    where
        I: IntoIterator<Item = (Option<String>, Box<C>)>,
    {
        let mut multi = Self::new(type_name);
        multi.set_adapters(adapters);
        multi
    }

    /// Replaces the whole collection.
    pub fn set_adapters<I>(&mut self, adapters: I) -> &mut Self
    where
        I: IntoIterator<Item = (Option<String>, Box<C>)>,
    {
        self.adapters.clear();
        for (name, adapter) in adapters {
            self.add_adapter(adapter, name.as_deref());
        }
        self
    }

    /// Adds `adapter` under `name`, or under its type name when unnamed.
    pub fn add_adapter(&mut self, adapter: Box<C>, name: Option<&str>) -> &mut Self {
        let key = name.map(str::to_owned).unwrap_or_else(|| adapter.type_name().to_owned());
        match self.adapters.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => {
                log::debug!("{}: replacing adapter '{}'", self.type_name, key);
                slot.1 = adapter;
            }
            None => self.adapters.push((key, adapter)),
        }
        self
    }

    /// Resolves `adapter_name` through `family` and adds the result.
    pub fn add_adapter_by_name(
        &mut self,
        family: &AdapterFamily<C>,
        adapter_name: &str,
        name: Option<&str>,
    ) -> AdapterResult<&mut Self> {
        let adapter = family.resolve(adapter_name)?;
        Ok(self.add_adapter(adapter, name))
    }

    pub fn get_adapters(&self) -> impl Iterator<Item = (&str, &C)> {
        self.adapters
            .iter()
            .map(|(name, adapter)| (name.as_str(), adapter.as_ref()))
    }

    pub fn get_adapter(&self, name: &str) -> AdapterResult<&C> {
        self.adapters
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, adapter)| adapter.as_ref())
            .ok_or_else(|| AdapterError::NotFound {
                name: name.to_owned(),
            })
    }

    pub fn get_adapter_mut(&mut self, name: &str) -> AdapterResult<&mut C> {
        self.adapters
            .iter_mut()
            .find(|(existing, _)| existing == name)
            .map(|(_, adapter)| adapter.as_mut())
            .ok_or_else(|| AdapterError::NotFound {
                name: name.to_owned(),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn reset_adapters(&mut self) -> &mut Self {
        self.set_adapters(std::iter::empty())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl<C: Adapter + ?Sized> Adapter for MultiAdapter<C> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        None
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        None
    }

    fn set_option(&mut self, _name: &str, _value: Value) -> AdapterResult<()> {
        Err(AdapterError::unsupported("set_option", self.type_name))
    }

    fn set_options(&mut self, _options: Options) -> AdapterResult<()> {
        Err(AdapterError::unsupported("set_options", self.type_name))
    }

    fn get_options(&self) -> AdapterResult<Options> {
        Err(AdapterError::unsupported("get_options", self.type_name))
    }

    fn get_option(&self, _name: &str) -> AdapterResult<Option<Value>> {
        Err(AdapterError::unsupported("get_option", self.type_name))
    }
}

impl<C: Adapter + ?Sized> std::fmt::Debug for MultiAdapter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiAdapter")
            .field("type_name", &self.type_name)
            .field("adapters", &self.names())
            .finish()
    }
}
