//! Bot detection sources.
//!
//! A [`BotInfoAdapter`] gives an opinion on whether a request comes from an
//! automated client. Sources that cannot tell return `None`; [`MultiBotInfo`]
//! asks several sources in turn and keeps the first opinion.

mod ip_list;
mod keywords;
mod multi;

pub use ip_list::IpListBotInfo;
pub use keywords::KeywordBotInfo;
pub use multi::MultiBotInfo;

use once_cell::sync::{Lazy, OnceCell};
use std::net::IpAddr;
use std::sync::Mutex;

use crate::core::{Adapter, AdapterFamily, AdapterResult, AdapterSpec, Facade, Options, OptionsBag};

/// Opinion returned by a bot-info source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotVerdict {
    pub is_bot: bool,
    /// Type name of the adapter that produced the verdict.
    pub source: String,
    /// What triggered the verdict (keyword, address…).
    pub matched: Option<String>,
}

impl BotVerdict {
    pub fn bot(source: impl Into<String>, matched: impl Into<String>) -> Self {
        Self {
            is_bot: true,
            source: source.into(),
            matched: Some(matched.into()),
        }
    }

    pub fn human(source: impl Into<String>) -> Self {
        Self {
            is_bot: false,
            source: source.into(),
            matched: None,
        }
    }
}

/// Bot-info capability.
pub trait BotInfoAdapter: Adapter {
    fn lookup(&self, user_agent: &str, ip: Option<IpAddr>) -> Option<BotVerdict>;
}

/// Source without an opinion on anything.
#[derive(Debug, Default)]
pub struct NoBotInfo {
    options: OptionsBag,
}

impl Adapter for NoBotInfo {
    fn type_name(&self) -> &'static str {
        "none"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }
}

impl BotInfoAdapter for NoBotInfo {
    fn lookup(&self, _user_agent: &str, _ip: Option<IpAddr>) -> Option<BotVerdict> {
        None
    }
}

fn keywords_adapter() -> Box<dyn BotInfoAdapter> {
    Box::new(KeywordBotInfo::new())
}

fn ip_list_adapter() -> Box<dyn BotInfoAdapter> {
    Box::new(IpListBotInfo::new())
}

fn multi_adapter() -> Box<dyn BotInfoAdapter> {
    Box::new(MultiBotInfo::new())
}

fn none_adapter() -> Box<dyn BotInfoAdapter> {
    Box::new(NoBotInfo::default())
}

/// Registered bot-info sources.
pub static BOT_INFO_ADAPTERS: Lazy<AdapterFamily<dyn BotInfoAdapter>> = Lazy::new(|| {
    AdapterFamily::new("bot_info")
        .with_default_adapter("keywords")
        .register("keywords", keywords_adapter)
        .register("ip_list", ip_list_adapter)
        .register("multi", multi_adapter)
        .register("none", none_adapter)
});

static SHARED: OnceCell<Mutex<BotInfo>> = OnceCell::new();

/// Front object holding the active bot-info source.
#[derive(Debug)]
pub struct BotInfo {
    facade: Facade<dyn BotInfoAdapter>,
}

impl BotInfo {
    pub fn new() -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::new(&BOT_INFO_ADAPTERS)?,
        })
    }

    pub fn with_options(
        options: Options,
        adapter: Option<AdapterSpec<dyn BotInfoAdapter>>,
    ) -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::with_options(&BOT_INFO_ADAPTERS, options, adapter)?,
        })
    }

    pub fn with_adapter(
        adapter: impl Into<AdapterSpec<dyn BotInfoAdapter>>,
    ) -> AdapterResult<Self> {
        Ok(Self {
            facade: Facade::with_adapter(&BOT_INFO_ADAPTERS, adapter)?,
        })
    }

    /// Process-wide instance, created with the default source on first use.
    pub fn shared() -> AdapterResult<&'static Mutex<BotInfo>> {
        SHARED.get_or_try_init(|| BotInfo::new().map(Mutex::new))
    }

    pub fn facade(&self) -> &Facade<dyn BotInfoAdapter> {
        &self.facade
    }

    pub fn facade_mut(&mut self) -> &mut Facade<dyn BotInfoAdapter> {
        &mut self.facade
    }

    pub fn set_adapter(
        &mut self,
        adapter: impl Into<AdapterSpec<dyn BotInfoAdapter>>,
    ) -> AdapterResult<&mut Self> {
        self.facade.set_adapter(adapter)?;
        Ok(self)
    }

    pub fn get_adapter(&self) -> Option<&dyn BotInfoAdapter> {
        self.facade.get_adapter()
    }

    pub fn lookup(&self, user_agent: &str, ip: Option<IpAddr>) -> AdapterResult<Option<BotVerdict>> {
        Ok(self.facade.adapter("lookup")?.lookup(user_agent, ip))
    }

    pub fn is_bot(&self, user_agent: &str, ip: Option<IpAddr>) -> AdapterResult<bool> {
        Ok(self
            .facade
            .adapter("is_bot")?
            .lookup(user_agent, ip)
            .is_some_and(|verdict| verdict.is_bot))
    }
}
