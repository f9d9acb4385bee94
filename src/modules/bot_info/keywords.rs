//! User-agent keyword matching.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::net::IpAddr;

use super::{BotInfoAdapter, BotVerdict};
use crate::core::{Adapter, AdapterError, AdapterResult, OptionsBag};

/// Built-in keywords, replaced wholesale by the `keywords` option.
const DEFAULT_KEYWORDS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "slurp",
    "curl",
    "wget",
    "python-requests",
    "go-http-client",
    "headless",
    "phantomjs",
    "facebookexternalhit",
    "lighthouse",
];

/// Compiled size cap for a keyword matcher.
const MATCHER_SIZE_LIMIT: usize = 1 << 20;

static DEFAULT_MATCHER: Lazy<Option<Regex>> =
    Lazy::new(|| compile(DEFAULT_KEYWORDS).expect("built-in keywords compile"));

/// Flags user agents containing one of a list of keywords (case-insensitive).
///
/// Options:
/// - `keywords`: array of strings replacing the built-in list.
/// - `empty_is_bot`: treat a blank user agent as a bot (default `true`).
#[derive(Debug, Clone)]
pub struct KeywordBotInfo {
    options: OptionsBag,
    matcher: Option<Regex>,
}

impl KeywordBotInfo {
    pub const KEYWORDS: &'static str = "keywords";
    pub const EMPTY_IS_BOT: &'static str = "empty_is_bot";

    pub fn new() -> Self {
        let mut options = OptionsBag::new();
        options.set(Self::EMPTY_IS_BOT, Value::Bool(true));
        Self {
            options,
            matcher: DEFAULT_MATCHER.clone(),
        }
    }

    fn empty_is_bot(&self) -> bool {
        self.options.get_bool(Self::EMPTY_IS_BOT).unwrap_or(true)
    }
}

impl Default for KeywordBotInfo {
    fn default() -> Self {
        Self::new()
    }
}

fn compile<S: AsRef<str>>(keywords: &[S]) -> Result<Option<Regex>, regex::Error> {
    let alternatives: Vec<String> = keywords
        .iter()
        .map(|keyword| keyword.as_ref().trim())
        .filter(|keyword| !keyword.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }
    RegexBuilder::new(&alternatives.join("|"))
        .case_insensitive(true)
        .size_limit(MATCHER_SIZE_LIMIT)
        .build()
        .map(Some)
}

impl Adapter for KeywordBotInfo {
    fn type_name(&self) -> &'static str {
        "keywords"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }

    fn set_option(&mut self, name: &str, value: Value) -> AdapterResult<()> {
        if name == Self::KEYWORDS {
            let keywords = value
                .as_array()
                .and_then(|items| items.iter().map(Value::as_str).collect::<Option<Vec<_>>>())
                .ok_or_else(|| {
                    AdapterError::InvalidArgument(format!(
                        "{name} must be an array of strings, got {value}"
                    ))
                })?;
            self.matcher = compile(&keywords).map_err(|err| {
                AdapterError::InvalidArgument(format!("{name} cannot be compiled: {err}"))
            })?;
        }
        self.options.set(name, value);
        Ok(())
    }
}

impl BotInfoAdapter for KeywordBotInfo {
    fn lookup(&self, user_agent: &str, _ip: Option<IpAddr>) -> Option<BotVerdict> {
        if user_agent.trim().is_empty() {
            return self
                .empty_is_bot()
                .then(|| BotVerdict::bot(self.type_name(), "empty user agent"));
        }
        let found = self.matcher.as_ref()?.find(user_agent)?;
        Some(BotVerdict::bot(self.type_name(), found.as_str().to_ascii_lowercase()))
    }
}
