//! Integrations that rely on third-party services.
//!
//! Groups the HTTP transport adapters that bridge the tracker with the
//! collection endpoint.

pub mod http;

pub use self::http::{
    Http, HttpAdapter, HttpRequest, HttpResponse, NullHttpAdapter, ReqwestHttpAdapter,
    TransportError,
};
