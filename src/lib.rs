//! # gatracking-rs
//!
//! Server-side Google Analytics hit forwarding.
//!
//! Collaborators are pluggable: the HTTP transport, the bot-detection source
//! and the outbound proxy strategy each live in an adapter family and are
//! reached through a facade that can swap adapters at runtime.
//!
//! ## Features
//!
//! - Async hit forwarding over `reqwest`
//! - Bot filtering by user-agent keywords or address lists
//! - Fixed or rotating outbound proxies with ban tracking
//! - IP address and URL validators with readable messages
//! - JSON configuration
//!
//! ## Example
//!
//! ```no_run
//! use gatracking_rs::{Hit, Tracker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = Tracker::builder().with_tracking_id("UA-12345-1").build()?;
//!     let hit = Hit::pageview("/pricing")
//!         .with_user_agent("Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0")
//!         .with_client_ip("203.0.113.7");
//!     println!("{:?}", tracker.track(&hit).await?);
//!     Ok(())
//! }
//! ```

mod tracker;

pub mod config;
pub mod core;
pub mod external_deps;
pub mod modules;
pub mod validate;

pub use crate::tracker::{
    Hit,
    TrackOutcome,
    Tracker,
    TrackerBuilder,
    TrackerError,
    TrackerResult,
};

pub use crate::config::{AdapterConfig, ConfigError, TrackerConfig};

pub use crate::core::{
    ADAPTER_OPTION,
    Adapter,
    AdapterError,
    AdapterFactory,
    AdapterFamily,
    AdapterResult,
    AdapterSpec,
    Facade,
    MultiAdapter,
    Options,
    OptionsBag,
    options_from_json,
};

pub use crate::external_deps::http::{
    DEFAULT_ENDPOINT,
    HTTP_ADAPTERS,
    Http,
    HttpAdapter,
    HttpRequest,
    HttpResponse,
    NullHttpAdapter,
    ReqwestHttpAdapter,
    TransportError,
};

pub use crate::modules::{
    BOT_INFO_ADAPTERS,
    BotInfo,
    BotInfoAdapter,
    BotVerdict,
    FixedProxy,
    IpListBotInfo,
    KeywordBotInfo,
    MultiBotInfo,
    NoBotInfo,
    PROXY_ADAPTERS,
    Proxy,
    ProxyAdapter,
    ProxyHealthReport,
    ProxyStats,
    RotatingProxy,
};

pub use crate::validate::{IpAddress, Url, ValidatorState, Validator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
