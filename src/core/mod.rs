//! Adapter substrate shared by every pluggable strategy.
//!
//! Option storage, the base adapter contract, multi-adapter composition, the
//! name → factory registry, and the single-adapter facade.

pub mod adapter;
pub mod facade;
pub mod multi;
pub mod options;
pub mod registry;

pub use adapter::{Adapter, AdapterError, AdapterResult};
pub use facade::{ADAPTER_OPTION, AdapterSpec, Facade};
pub use multi::MultiAdapter;
pub use options::{Options, OptionsBag, options_from_json};
pub use registry::{AdapterFactory, AdapterFamily, canonical_name};
