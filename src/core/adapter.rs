//! The base adapter contract.
//!
//! Every swappable strategy (HTTP transport, bot-info source, proxy policy,
//! validator) implements [`Adapter`] and layers its own capability trait on
//! top of it. Option handling is provided on top of an embedded
//! [`OptionsBag`]; types without a bag report the per-option calls as
//! unsupported.

use serde_json::Value;
use thiserror::Error;

use super::options::{Options, OptionsBag};

/// Result alias used by the adapter layer.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors surfaced while configuring or resolving adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("adapter '{name}' not found")]
    NotFound { name: String },
    #[error("{operation}() is not supported by {type_name}")]
    Unsupported {
        operation: &'static str,
        type_name: &'static str,
    },
    #[error("no adapter configured; cannot call {operation}()")]
    NotConfigured { operation: String },
}

impl AdapterError {
    pub(crate) fn unsupported(operation: &'static str, type_name: &'static str) -> Self {
        AdapterError::Unsupported {
            operation,
            type_name,
        }
    }
}

/// Capability contract shared by every pluggable strategy.
pub trait Adapter: Send + Sync {
    /// Concrete-type identifier. Doubles as the default key inside a
    /// [`MultiAdapter`](super::multi::MultiAdapter).
    fn type_name(&self) -> &'static str;

    /// Option storage, `None` for containers that hold no options of their own.
    fn options_bag(&self) -> Option<&OptionsBag>;

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag>;

    /// Stores a single option. Implementations may override to validate.
    fn set_option(&mut self, name: &str, value: Value) -> AdapterResult<()> {
        let type_name = self.type_name();
        let bag = self
            .options_bag_mut()
            .ok_or(AdapterError::unsupported("set_option", type_name))?;
        bag.set(name, value);
        Ok(())
    }

    /// Sequentially applies `set_option` for each entry. Not atomic: entries
    /// before a failing one stay applied.
    fn set_options(&mut self, options: Options) -> AdapterResult<()> {
        if self.options_bag().is_none() {
            return Err(AdapterError::unsupported("set_options", self.type_name()));
        }
        for (name, value) in options {
            self.set_option(&name, value)?;
        }
        Ok(())
    }

    fn get_options(&self) -> AdapterResult<Options> {
        self.options_bag()
            .map(OptionsBag::to_options)
            .ok_or(AdapterError::unsupported("get_options", self.type_name()))
    }

    /// Returns `Ok(None)` for options never set.
    fn get_option(&self, name: &str) -> AdapterResult<Option<Value>> {
        self.options_bag()
            .map(|bag| bag.get(name).cloned())
            .ok_or(AdapterError::unsupported("get_option", self.type_name()))
    }
}
