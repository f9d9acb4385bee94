use std::net::IpAddr;
use std::ops::{Deref, DerefMut};

use super::{BOT_INFO_ADAPTERS, BotInfoAdapter, BotVerdict};
use crate::core::{Adapter, AdapterResult, MultiAdapter, OptionsBag};

/// Consults several bot-info sources in insertion order; the first source with
/// an opinion decides.
///
/// Has no options of its own; configure the member sources instead.
pub struct MultiBotInfo {
    adapters: MultiAdapter<dyn BotInfoAdapter>,
}

impl MultiBotInfo {
    pub const TYPE_NAME: &'static str = "multi";

    pub fn new() -> Self {
        Self {
            adapters: MultiAdapter::new(Self::TYPE_NAME),
        }
    }

    pub fn with_adapters<I>(adapters: I) -> Self
    where
        I: IntoIterator<Item = (Option<String>, Box<dyn BotInfoAdapter>)>,
    {
        Self {
            adapters: MultiAdapter::with_adapters(Self::TYPE_NAME, adapters),
        }
    }

    /// Builds a multi source from registered source names, keyed by name.
    pub fn from_names<'a, I>(names: I) -> AdapterResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut multi = Self::new();
        for name in names {
            multi
                .adapters
                .add_adapter_by_name(&BOT_INFO_ADAPTERS, name, None)?;
        }
        Ok(multi)
    }
}

impl Default for MultiBotInfo {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MultiBotInfo {
    type Target = MultiAdapter<dyn BotInfoAdapter>;

    fn deref(&self) -> &Self::Target {
        &self.adapters
    }
}

impl DerefMut for MultiBotInfo {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.adapters
    }
}

impl std::fmt::Debug for MultiBotInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MultiBotInfo").field(&self.adapters).finish()
    }
}

impl Adapter for MultiBotInfo {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        None
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        None
    }
}

impl BotInfoAdapter for MultiBotInfo {
    fn lookup(&self, user_agent: &str, ip: Option<IpAddr>) -> Option<BotVerdict> {
        self.adapters
            .get_adapters()
            .find_map(|(name, adapter)| {
                let verdict = adapter.lookup(user_agent, ip);
                if let Some(ref verdict) = verdict {
                    log::trace!("bot-info source '{}' decided is_bot={}", name, verdict.is_bot);
                }
                verdict
            })
    }
}
