//! Request-screening services.
//!
//! Bot detection and outbound proxy selection, each behind its own adapter
//! family and facade.

pub mod bot_info;
pub mod proxy;

// Re-export commonly used types
pub use bot_info::{
    BOT_INFO_ADAPTERS,
    BotInfo,
    BotInfoAdapter,
    BotVerdict,
    IpListBotInfo,
    KeywordBotInfo,
    MultiBotInfo,
    NoBotInfo,
};
pub use proxy::{
    FixedProxy,
    PROXY_ADAPTERS,
    Proxy,
    ProxyAdapter,
    ProxyHealthReport,
    ProxyStats,
    RotatingProxy,
};
