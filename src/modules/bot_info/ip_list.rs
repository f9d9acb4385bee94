use serde_json::Value;
use std::collections::HashSet;
use std::net::IpAddr;

use super::{BotInfoAdapter, BotVerdict};
use crate::core::{Adapter, AdapterError, AdapterResult, OptionsBag};

/// Judges requests by client address.
///
/// Options:
/// - `addresses`: IPv4/IPv6 address strings flagged as bots.
/// - `allowed`: addresses vouched for as human; they win over `addresses`.
///
/// Requests without a listed client address get no opinion.
#[derive(Debug, Clone, Default)]
pub struct IpListBotInfo {
    options: OptionsBag,
    addresses: HashSet<IpAddr>,
    allowed: HashSet<IpAddr>,
}

impl IpListBotInfo {
    pub const ADDRESSES: &'static str = "addresses";
    pub const ALLOWED: &'static str = "allowed";

    pub fn new() -> Self {
        Self::default()
    }
}

fn parse_addresses(name: &str, value: &Value) -> AdapterResult<HashSet<IpAddr>> {
    let items = value.as_array().ok_or_else(|| {
        AdapterError::InvalidArgument(format!("{name} must be an array, got {value}"))
    })?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .and_then(|text| text.trim().parse::<IpAddr>().ok())
                .ok_or_else(|| {
                    AdapterError::InvalidArgument(format!("{item} in {name} is not an IP address"))
                })
        })
        .collect()
}

impl Adapter for IpListBotInfo {
    fn type_name(&self) -> &'static str {
        "ip_list"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }

    fn set_option(&mut self, name: &str, value: Value) -> AdapterResult<()> {
        match name {
            Self::ADDRESSES => self.addresses = parse_addresses(name, &value)?,
            Self::ALLOWED => self.allowed = parse_addresses(name, &value)?,
            _ => {}
        }
        self.options.set(name, value);
        Ok(())
    }
}

impl BotInfoAdapter for IpListBotInfo {
    fn lookup(&self, _user_agent: &str, ip: Option<IpAddr>) -> Option<BotVerdict> {
        let ip = ip?;
        if self.allowed.contains(&ip) {
            return Some(BotVerdict::human(self.type_name()));
        }
        self.addresses
            .contains(&ip)
            .then(|| BotVerdict::bot(self.type_name(), ip.to_string()))
    }
}
