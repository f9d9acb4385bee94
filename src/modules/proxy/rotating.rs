//! Proxy rotation and health tracking.
//!
//! Tracks proxy outcomes, bans endpoints that keep failing, and picks the next
//! candidate according to the configured strategy.

use rand::seq::SliceRandom;
use serde_json::{Value, json};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{ProxyAdapter, validate_endpoint};
use crate::core::{Adapter, AdapterError, AdapterResult, OptionsBag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Sequential,
    Random,
    Smart,
}

impl Strategy {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "sequential" => Some(Strategy::Sequential),
            "random" => Some(Strategy::Random),
            "smart" => Some(Strategy::Smart),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyHealthReport {
    pub total_proxies: usize,
    pub available_proxies: usize,
    pub banned_proxies: usize,
    pub details: HashMap<String, ProxyStats>,
}

#[derive(Debug, Clone, Default)]
pub struct ProxyStats {
    pub successes: u64,
    pub failures: u64,
    pub last_used: Option<Instant>,
    pub last_failure: Option<Instant>,
}

#[derive(Debug, Clone)]
struct ProxyEntry {
    endpoint: String,
    stats: ProxyStats,
    banned_until: Option<Instant>,
}

impl ProxyEntry {
    fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            stats: ProxyStats::default(),
            banned_until: None,
        }
    }

    fn is_available(&self, now: Instant) -> bool {
        self.banned_until.is_none_or(|until| now >= until)
    }

    fn success_rate(&self) -> f64 {
        let total = self.stats.successes + self.stats.failures;
        if total == 0 {
            1.0
        } else {
            self.stats.successes as f64 / total as f64
        }
    }
}

/// Rotates through a pool of proxy endpoints.
///
/// Options:
/// - `proxies`: array of proxy URLs (duplicates are ignored).
/// - `strategy`: `sequential` (default), `random` or `smart` (best success rate).
/// - `failure_threshold`: failures before a ban, default 3.
/// - `ban_seconds`: ban length, default 300, at most one year.
#[derive(Debug)]
pub struct RotatingProxy {
    options: OptionsBag,
    proxies: Vec<ProxyEntry>,
    current_index: usize,
}

impl RotatingProxy {
    pub const PROXIES: &'static str = "proxies";
    pub const STRATEGY: &'static str = "strategy";
    pub const FAILURE_THRESHOLD: &'static str = "failure_threshold";
    pub const BAN_SECONDS: &'static str = "ban_seconds";
    pub const MAX_BAN_SECONDS: u64 = 365 * 24 * 60 * 60;

    pub fn new() -> Self {
        let mut options = OptionsBag::new();
        options
            .set(Self::STRATEGY, json!("sequential"))
            .set(Self::FAILURE_THRESHOLD, json!(3))
            .set(Self::BAN_SECONDS, json!(300));
        Self {
            options,
            proxies: Vec::new(),
            current_index: 0,
        }
    }

    fn strategy(&self) -> Strategy {
        self.options
            .get_str(Self::STRATEGY)
            .and_then(Strategy::parse)
            .unwrap_or(Strategy::Sequential)
    }

    fn failure_threshold(&self) -> u64 {
        self.options.get_u64(Self::FAILURE_THRESHOLD).unwrap_or(3).max(1)
    }

    fn ban_time(&self) -> Duration {
        let seconds = self.options.get_u64(Self::BAN_SECONDS).unwrap_or(300);
        Duration::from_secs(seconds.min(Self::MAX_BAN_SECONDS))
    }

    fn load(&mut self, endpoints: Vec<String>) {
        self.proxies.clear();
        self.current_index = 0;
        for endpoint in endpoints {
            if !self.proxies.iter().any(|entry| entry.endpoint == endpoint) {
                self.proxies.push(ProxyEntry::new(endpoint));
            }
        }
    }

    pub fn health_report(&self) -> ProxyHealthReport {
        let now = Instant::now();
        let mut details = HashMap::new();
        let mut available = 0;
        let mut banned = 0;
        for entry in &self.proxies {
            if entry.is_available(now) {
                available += 1;
            } else {
                banned += 1;
            }
            details.insert(entry.endpoint.clone(), entry.stats.clone());
        }

        ProxyHealthReport {
            total_proxies: self.proxies.len(),
            available_proxies: available,
            banned_proxies: banned,
            details,
        }
    }
}

impl Default for RotatingProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for RotatingProxy {
    fn type_name(&self) -> &'static str {
        "rotating"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }

    fn set_option(&mut self, name: &str, value: Value) -> AdapterResult<()> {
        match name {
            Self::PROXIES => {
                let items = value.as_array().ok_or_else(|| {
                    AdapterError::InvalidArgument(format!("{name} must be an array, got {value}"))
                })?;
                let endpoints = items
                    .iter()
                    .map(|item| validate_endpoint(name, item))
                    .collect::<AdapterResult<Vec<_>>>()?;
                self.load(endpoints);
            }
            Self::STRATEGY => {
                if value.as_str().and_then(Strategy::parse).is_none() {
                    return Err(AdapterError::InvalidArgument(format!(
                        "{name} must be one of sequential, random, smart; got {value}"
                    )));
                }
            }
            Self::FAILURE_THRESHOLD => {
                if value.as_u64().is_none() {
                    return Err(AdapterError::InvalidArgument(format!(
                        "{name} must be a non-negative integer, got {value}"
                    )));
                }
            }
            Self::BAN_SECONDS => {
                if !value.as_u64().is_some_and(|seconds| seconds <= Self::MAX_BAN_SECONDS) {
                    return Err(AdapterError::InvalidArgument(format!(
                        "{name} must be an integer between 0 and {}, got {value}",
                        Self::MAX_BAN_SECONDS
                    )));
                }
            }
            _ => {}
        }
        self.options.set(name, value);
        Ok(())
    }
}

impl ProxyAdapter for RotatingProxy {
    fn next_proxy(&mut self) -> Option<String> {
        if self.proxies.is_empty() {
            return None;
        }

        let now = Instant::now();
        let mut available_indices = Vec::new();
        for (idx, entry) in self.proxies.iter_mut().enumerate() {
            if entry.banned_until.is_some_and(|until| until <= now) {
                entry.banned_until = None;
            }
            if entry.banned_until.is_none() {
                available_indices.push(idx);
            }
        }

        let selected_index = if available_indices.is_empty() {
            // Everything is banned: release the entry whose ban ends first.
            let index = self
                .proxies
                .iter()
                .enumerate()
                .min_by_key(|(_, entry)| entry.banned_until.unwrap_or(now))
                .map(|(idx, _)| idx)?;
            self.proxies[index].banned_until = None;
            index
        } else {
            match self.strategy() {
                Strategy::Sequential => {
                    let idx_in_pool = self.current_index % available_indices.len();
                    self.current_index = (self.current_index + 1) % available_indices.len();
                    available_indices[idx_in_pool]
                }
                Strategy::Random => *available_indices.choose(&mut rand::thread_rng())?,
                Strategy::Smart => *available_indices.iter().max_by(|&&a, &&b| {
                    let lhs = self.proxies[a].success_rate();
                    let rhs = self.proxies[b].success_rate();
                    lhs.partial_cmp(&rhs).unwrap_or(Ordering::Equal)
                })?,
            }
        };

        let entry = &mut self.proxies[selected_index];
        entry.stats.last_used = Some(Instant::now());
        Some(entry.endpoint.clone())
    }

    fn report_success(&mut self, proxy: &str) {
        if let Some(entry) = self.proxies.iter_mut().find(|entry| entry.endpoint == proxy) {
            entry.stats.successes += 1;
            entry.banned_until = None;
        }
    }

    fn report_failure(&mut self, proxy: &str) {
        let threshold = self.failure_threshold();
        let ban_time = self.ban_time();
        if let Some(entry) = self.proxies.iter_mut().find(|entry| entry.endpoint == proxy) {
            entry.stats.failures += 1;
            entry.stats.last_failure = Some(Instant::now());
            if entry.stats.failures % threshold == 0 {
                match Instant::now().checked_add(ban_time) {
                    Some(until) => {
                        log::warn!("banning proxy {} for {}s", proxy, ban_time.as_secs());
                        entry.banned_until = Some(until);
                    }
                    None => log::warn!(
                        "cannot ban proxy {}: ban of {}s overflows",
                        proxy,
                        ban_time.as_secs()
                    ),
                }
            }
        }
    }
}
