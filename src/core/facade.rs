//! Single-adapter front objects.
//!
//! A [`Facade`] owns exactly one active adapter of its family and its own
//! option bag. Family-specific fronts (`Http`, `BotInfo`, `Proxy`) wrap a
//! facade and delegate their capability methods through
//! [`Facade::adapter`] / [`Facade::adapter_mut`], which fail with
//! [`AdapterError::NotConfigured`] when no adapter is set.

use serde_json::Value;

use super::adapter::{Adapter, AdapterError, AdapterResult};
use super::options::{Options, OptionsBag};
use super::registry::AdapterFamily;

/// Option key a facade reads its adapter name from when none is passed explicitly.
pub const ADAPTER_OPTION: &str = "adapter";

/// Either a registered adapter name or a ready-built adapter.
pub enum AdapterSpec<A: ?Sized> {
    Named(String),
    Instance(Box<A>),
}

impl<A: ?Sized> From<&str> for AdapterSpec<A> {
    fn from(name: &str) -> Self {
        AdapterSpec::Named(name.to_owned())
    }
}

impl<A: ?Sized> From<String> for AdapterSpec<A> {
    fn from(name: String) -> Self {
        AdapterSpec::Named(name)
    }
}

impl<A: ?Sized> From<Box<A>> for AdapterSpec<A> {
    fn from(adapter: Box<A>) -> Self {
        AdapterSpec::Instance(adapter)
    }
}

pub struct Facade<A: Adapter + ?Sized + 'static> {
    family: &'static AdapterFamily<A>,
    adapter: Option<Box<A>>,
    options: OptionsBag,
}

impl<A: Adapter + ?Sized + 'static> Facade<A> {
    /// Zero-argument construction: resolves the family's default adapter and
    /// leaves the facade's own options untouched, defaults included.
    pub fn new(family: &'static AdapterFamily<A>) -> AdapterResult<Self> {
        Self::construct(family, None, None)
    }

    /// Construction with arguments. When `adapter` is `None` the adapter is
    /// read from the `adapter` key of `options` (falling back to the family
    /// default) and that key is removed. The family's default options and then
    /// the remaining `options` are applied to the facade, even when `options`
    /// is empty.
    pub fn with_options(
        family: &'static AdapterFamily<A>,
        options: Options,
        adapter: Option<AdapterSpec<A>>,
    ) -> AdapterResult<Self> {
        Self::construct(family, Some(options), adapter)
    }

    /// Construction with an explicit adapter and no extra options. Counts as
    /// construction with arguments.
    pub fn with_adapter(
        family: &'static AdapterFamily<A>,
        adapter: impl Into<AdapterSpec<A>>,
    ) -> AdapterResult<Self> {
        Self::construct(family, Some(Options::new()), Some(adapter.into()))
    }

    fn construct(
        family: &'static AdapterFamily<A>,
        mut options: Option<Options>,
        adapter: Option<AdapterSpec<A>>,
    ) -> AdapterResult<Self> {
        let mut facade = Self {
            family,
            adapter: None,
            options: OptionsBag::new(),
        };

        let spec = match adapter {
            Some(spec) => Some(spec),
            None => match options.as_mut().and_then(|opts| opts.remove(ADAPTER_OPTION)) {
                Some(Value::String(name)) => Some(AdapterSpec::Named(name)),
                Some(Value::Null) | None => family
                    .default_adapter()
                    .map(|name| AdapterSpec::Named(name.to_owned())),
                Some(other) => {
                    return Err(AdapterError::InvalidArgument(format!(
                        "{} adapter option must be a string, got {other}",
                        family.name()
                    )));
                }
            },
        };

        if let Some(spec) = spec {
            facade.set_adapter(spec)?;
        }

        if let Some(options) = options {
            facade.options.extend(family.default_options().clone());
            facade.options.extend(options);
        }

        Ok(facade)
    }

    /// Replaces the active adapter. Names are resolved through the family
    /// registry and instantiated without arguments.
    pub fn set_adapter(&mut self, adapter: impl Into<AdapterSpec<A>>) -> AdapterResult<&mut Self> {
        let adapter = match adapter.into() {
            AdapterSpec::Named(name) => self.family.resolve(&name)?,
            AdapterSpec::Instance(adapter) => adapter,
        };
        log::debug!(
            "{} facade: using adapter '{}'",
            self.family.name(),
            adapter.type_name()
        );
        self.adapter = Some(adapter);
        Ok(self)
    }

    pub fn get_adapter(&self) -> Option<&A> {
        self.adapter.as_deref()
    }

    pub fn get_adapter_mut(&mut self) -> Option<&mut A> {
        self.adapter.as_deref_mut()
    }

    /// Removes and returns the active adapter.
    pub fn take_adapter(&mut self) -> Option<Box<A>> {
        self.adapter.take()
    }

    pub fn is_configured(&self) -> bool {
        self.adapter.is_some()
    }

    /// Active adapter for forwarding `operation`.
    pub fn adapter(&self, operation: &str) -> AdapterResult<&A> {
        self.adapter
            .as_deref()
            .ok_or_else(|| not_configured(self.family, operation))
    }

    pub fn adapter_mut(&mut self, operation: &str) -> AdapterResult<&mut A> {
        let family = self.family;
        self.adapter
            .as_deref_mut()
            .ok_or_else(|| not_configured(family, operation))
    }

    pub fn family(&self) -> &'static AdapterFamily<A> {
        self.family
    }

    pub fn set_option(&mut self, name: &str, value: Value) -> &mut Self {
        self.options.set(name, value);
        self
    }

    pub fn set_options(&mut self, options: Options) -> &mut Self {
        self.options.extend(options);
        self
    }

    pub fn get_option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    pub fn get_options(&self) -> Options {
        self.options.to_options()
    }

    pub fn options(&self) -> &OptionsBag {
        &self.options
    }
}

fn not_configured<A: Adapter + ?Sized>(family: &AdapterFamily<A>, operation: &str) -> AdapterError {
    AdapterError::NotConfigured {
        operation: format!("{}::{operation}", family.name()),
    }
}

impl<A: Adapter + ?Sized + 'static> std::fmt::Debug for Facade<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Facade")
            .field("family", &self.family.name())
            .field("adapter", &self.adapter.as_ref().map(|adapter| adapter.type_name()))
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use serde_json::json;

    trait Echo: Adapter {
        fn echo(&self, input: &str) -> String;
    }

    #[derive(Default)]
    struct Loud {
        options: OptionsBag,
    }

    #[derive(Default)]
    struct Quiet {
        options: OptionsBag,
    }

    impl Adapter for Loud {
        fn type_name(&self) -> &'static str {
            "loud"
        }

        fn options_bag(&self) -> Option<&OptionsBag> {
            Some(&self.options)
        }

        fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
            Some(&mut self.options)
        }
    }

    impl Echo for Loud {
        fn echo(&self, input: &str) -> String {
            input.to_uppercase()
        }
    }

    impl Adapter for Quiet {
        fn type_name(&self) -> &'static str {
            "quiet"
        }

        fn options_bag(&self) -> Option<&OptionsBag> {
            Some(&self.options)
        }

        fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
            Some(&mut self.options)
        }
    }

    impl Echo for Quiet {
        fn echo(&self, input: &str) -> String {
            input.to_lowercase()
        }
    }

    fn loud() -> Box<dyn Echo> {
        Box::new(Loud::default())
    }

    fn quiet() -> Box<dyn Echo> {
        Box::new(Quiet::default())
    }

    static ECHO: Lazy<AdapterFamily<dyn Echo>> = Lazy::new(|| {
        let mut defaults = Options::new();
        defaults.insert("volume".into(), json!(11));
        AdapterFamily::new("echo")
            .with_default_adapter("loud")
            .with_default_options(defaults)
            .register("loud", loud)
            .register("quiet", quiet)
    });

    static BARE: Lazy<AdapterFamily<dyn Echo>> =
        Lazy::new(|| AdapterFamily::new("bare").register("loud", loud));

    #[test]
    fn zero_argument_construction_skips_options() {
        let facade = Facade::new(&ECHO).unwrap();
        assert_eq!(facade.get_adapter().unwrap().type_name(), "loud");
        assert!(facade.get_options().is_empty());
    }

    #[test]
    fn empty_options_argument_applies_defaults() {
        let facade = Facade::with_options(&ECHO, Options::new(), None).unwrap();
        assert_eq!(facade.get_option("volume"), Some(&json!(11)));
        assert_ne!(
            facade.get_options(),
            Facade::new(&ECHO).unwrap().get_options()
        );
    }

    #[test]
    fn adapter_key_is_consumed_from_options() {
        let mut options = Options::new();
        options.insert("adapter".into(), json!("quiet"));
        options.insert("volume".into(), json!(3));
        let facade = Facade::with_options(&ECHO, options, None).unwrap();
        assert_eq!(facade.adapter("echo").unwrap().echo("HeY"), "hey");
        assert!(facade.get_option("adapter").is_none());
        assert_eq!(facade.get_option("volume"), Some(&json!(3)));
    }

    #[test]
    fn explicit_instance_wins_over_options() {
        let mut options = Options::new();
        options.insert("adapter".into(), json!("loud"));
        let facade =
            Facade::with_options(&ECHO, options, Some(AdapterSpec::Instance(quiet()))).unwrap();
        assert_eq!(facade.get_adapter().unwrap().type_name(), "quiet");
    }

    #[test]
    fn swaps_adapters_at_runtime() {
        let mut facade = Facade::new(&ECHO).unwrap();
        facade.set_adapter("quiet").unwrap();
        assert_eq!(facade.adapter("echo").unwrap().echo("A"), "a");
        facade.set_adapter(loud()).unwrap();
        assert_eq!(facade.adapter("echo").unwrap().echo("a"), "A");
    }

    #[test]
    fn unknown_adapter_name_is_rejected() {
        let mut facade = Facade::new(&ECHO).unwrap();
        assert!(matches!(
            facade.set_adapter("whisper"),
            Err(AdapterError::InvalidArgument(_))
        ));
        assert_eq!(facade.get_adapter().unwrap().type_name(), "loud");
    }

    #[test]
    fn non_string_adapter_option_is_rejected() {
        let mut options = Options::new();
        options.insert("adapter".into(), json!(7));
        assert!(matches!(
            Facade::with_options(&ECHO, options, None),
            Err(AdapterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn forwarding_without_adapter_fails() {
        let facade = Facade::new(&BARE).unwrap();
        assert!(!facade.is_configured());
        let err = facade.adapter("echo").err().unwrap();
        assert_eq!(
            err,
            AdapterError::NotConfigured {
                operation: "bare::echo".into()
            }
        );
    }
}
