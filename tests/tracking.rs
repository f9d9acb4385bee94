use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use gatracking_rs::{
    Adapter, AdapterConfig, BotInfoAdapter, Hit, HttpAdapter, HttpRequest, HttpResponse,
    IpListBotInfo, KeywordBotInfo, MultiBotInfo, OptionsBag, TrackOutcome, Tracker,
    TrackerConfig, TrackerError, TransportError,
};
use http::{HeaderMap, Method};
use serde_json::json;

/// In-process transport that records every request instead of sending it.
struct RecordingHttp {
    options: OptionsBag,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    failing_proxy: Option<String>,
}

impl RecordingHttp {
    fn new() -> (Self, Arc<Mutex<Vec<HttpRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let adapter = Self {
            options: OptionsBag::new(),
            requests: requests.clone(),
            failing_proxy: None,
        };
        (adapter, requests)
    }

    fn failing_through(mut self, proxy: &str) -> Self {
        self.failing_proxy = Some(proxy.to_owned());
        self
    }
}

impl Adapter for RecordingHttp {
    fn type_name(&self) -> &'static str {
        "recording"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(&self.options)
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(&mut self.options)
    }
}

#[async_trait]
impl HttpAdapter for RecordingHttp {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if request.proxy.is_some() && request.proxy == self.failing_proxy {
            return Err(TransportError::Transport("proxy refused connection".into()));
        }
        Ok(HttpResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"GIF89a"),
        })
    }
}

fn form(request: &HttpRequest) -> Vec<(String, String)> {
    let body = request.body.as_ref().expect("form body");
    url::form_urlencoded::parse(body).into_owned().collect()
}

fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

const FIREFOX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[tokio::test]
async fn forwards_pageview_with_client_fields() {
    let (http, requests) = RecordingHttp::new();
    let tracker = Tracker::builder()
        .with_http_adapter(Box::new(http))
        .with_tracking_id("UA-12345-1")
        .build()
        .unwrap();

    let hit = Hit::pageview("/pricing")
        .with_user_agent(FIREFOX)
        .with_client_ip("203.0.113.7")
        .with_referrer("https://search.example/?q=analytics");
    let outcome = tracker.track(&hit).await.unwrap();
    assert!(matches!(outcome, TrackOutcome::Sent { status: 200, .. }));

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url.as_str(), "https://www.google-analytics.com/collect");
    assert_eq!(request.proxy, None);
    assert_eq!(request.headers.get(http::header::USER_AGENT).unwrap(), FIREFOX);

    let fields = form(request);
    assert_eq!(field(&fields, "v"), Some("1"));
    assert_eq!(field(&fields, "tid"), Some("UA-12345-1"));
    assert_eq!(field(&fields, "t"), Some("pageview"));
    assert_eq!(field(&fields, "dp"), Some("/pricing"));
    assert_eq!(field(&fields, "uip"), Some("203.0.113.7"));
    assert_eq!(field(&fields, "dr"), Some("https://search.example/?q=analytics"));
    assert_eq!(field(&fields, "ua"), Some(FIREFOX));
    assert!(field(&fields, "z").is_some());
}

#[tokio::test]
async fn invalid_client_fields_are_dropped_not_fatal() {
    let (http, requests) = RecordingHttp::new();
    let tracker = Tracker::builder()
        .with_http_adapter(Box::new(http))
        .build()
        .unwrap();

    let hit = Hit::event("video", "play")
        .with_user_agent(FIREFOX)
        .with_client_ip("256.1.1.1")
        .with_referrer("//no-scheme.example/page");
    assert!(tracker.track(&hit).await.unwrap().is_sent());

    let fields = form(&requests.lock().unwrap()[0]);
    assert_eq!(field(&fields, "uip"), None);
    assert_eq!(field(&fields, "dr"), None);
    assert_eq!(field(&fields, "tid"), None);
    assert_eq!(field(&fields, "ec"), Some("video"));
}

#[tokio::test]
async fn bots_never_reach_the_transport() {
    let (http, requests) = RecordingHttp::new();
    let tracker = Tracker::builder()
        .with_http_adapter(Box::new(http))
        .build()
        .unwrap();

    let outcome = tracker
        .track(&Hit::pageview("/").with_user_agent("python-requests/2.32"))
        .await
        .unwrap();
    match outcome {
        TrackOutcome::SkippedBot(verdict) => {
            assert!(verdict.is_bot);
            assert_eq!(verdict.matched.as_deref(), Some("python-requests"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn address_list_from_config_flags_browsers() {
    let (http, requests) = RecordingHttp::new();
    let config = TrackerConfig::from_json_str(
        r#"{
            "endpoint": "https://collector.test/collect",
            "bot_info": { "adapter": "ip_list", "options": { "addresses": ["198.51.100.20"] } }
        }"#,
    )
    .unwrap();
    let tracker = Tracker::builder()
        .with_config(config)
        .with_http_adapter(Box::new(http))
        .build()
        .unwrap();
    assert_eq!(tracker.endpoint().as_str(), "https://collector.test/collect");

    let flagged = Hit::pageview("/").with_user_agent(FIREFOX).with_client_ip("198.51.100.20");
    let allowed = Hit::pageview("/").with_user_agent(FIREFOX).with_client_ip("198.51.100.21");
    assert!(!tracker.track(&flagged).await.unwrap().is_sent());
    assert!(tracker.track(&allowed).await.unwrap().is_sent());

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.as_str(), "https://collector.test/collect");
}

#[tokio::test]
async fn multi_source_consults_members_in_order() {
    let (http, requests) = RecordingHttp::new();
    let mut listed = IpListBotInfo::new();
    listed
        .set_option(IpListBotInfo::ADDRESSES, json!(["192.0.2.1"]))
        .unwrap();
    let mut multi = MultiBotInfo::new();
    multi.add_adapter(Box::new(listed) as Box<dyn BotInfoAdapter>, None);
    multi.add_adapter(Box::new(KeywordBotInfo::new()) as Box<dyn BotInfoAdapter>, None);

    let tracker = Tracker::builder()
        .with_http_adapter(Box::new(http))
        .with_bot_info_adapter(Box::new(multi))
        .build()
        .unwrap();

    let outcome = tracker
        .track(&Hit::pageview("/").with_user_agent("curl/8.4").with_client_ip("192.0.2.1"))
        .await
        .unwrap();
    match outcome {
        TrackOutcome::SkippedBot(verdict) => assert_eq!(verdict.source, "ip_list"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn allowlisted_address_overrides_keyword_match() {
    let (http, requests) = RecordingHttp::new();
    let mut listed = IpListBotInfo::new();
    listed
        .set_option(IpListBotInfo::ALLOWED, json!(["192.0.2.50"]))
        .unwrap();
    let multi = MultiBotInfo::with_adapters(vec![
        (None, Box::new(listed) as Box<dyn BotInfoAdapter>),
        (None, Box::new(KeywordBotInfo::new()) as Box<dyn BotInfoAdapter>),
    ]);

    let tracker = Tracker::builder()
        .with_http_adapter(Box::new(http))
        .with_bot_info_adapter(Box::new(multi))
        .build()
        .unwrap();

    let monitor = Hit::pageview("/health").with_user_agent("curl/8.4");
    assert!(tracker
        .track(&monitor.clone().with_client_ip("192.0.2.50"))
        .await
        .unwrap()
        .is_sent());
    assert!(!tracker
        .track(&monitor.with_client_ip("192.0.2.51"))
        .await
        .unwrap()
        .is_sent());
    assert_eq!(requests.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failing_proxy_is_banned_and_skipped() {
    let (http, requests) = RecordingHttp::new();
    let http = http.failing_through("http://10.0.0.1:3128");
    let mut config = TrackerConfig::default();
    config.proxy = AdapterConfig::named("rotating")
        .with_option("proxies", json!(["http://10.0.0.1:3128", "http://10.0.0.2:3128"]))
        .with_option("failure_threshold", json!(1));

    let tracker = Tracker::builder()
        .with_config(config)
        .with_http_adapter(Box::new(http))
        .disable_bot_filter()
        .build()
        .unwrap();

    let hit = Hit::pageview("/").with_user_agent(FIREFOX);
    let err = tracker.track(&hit).await.unwrap_err();
    assert!(matches!(err, TrackerError::Transport(_)));
    for _ in 0..2 {
        assert!(tracker.track(&hit).await.unwrap().is_sent());
    }

    let proxies: Vec<Option<String>> = requests
        .lock()
        .unwrap()
        .iter()
        .map(|request| request.proxy.clone())
        .collect();
    assert_eq!(
        proxies,
        vec![
            Some("http://10.0.0.1:3128".to_owned()),
            Some("http://10.0.0.2:3128".to_owned()),
            Some("http://10.0.0.2:3128".to_owned()),
        ]
    );
}

#[test]
fn oversized_proxy_ban_fails_build() {
    let config = TrackerConfig::from_json_str(&format!(
        r#"{{
            "proxy": {{
                "adapter": "rotating",
                "options": {{
                    "proxies": ["http://127.0.0.1:1"],
                    "failure_threshold": 1,
                    "ban_seconds": {}
                }}
            }}
        }}"#,
        u64::MAX
    ))
    .unwrap();
    let err = Tracker::from_config(config).err().expect("build should fail");
    assert!(err.to_string().contains("ban_seconds"), "{err}");
}

#[test]
fn unknown_adapter_name_fails_build() {
    let mut config = TrackerConfig::default();
    config.http = AdapterConfig::named("carrier_pigeon");
    let err = Tracker::from_config(config).err().expect("build should fail");
    let message = err.to_string();
    assert!(message.contains("carrier_pigeon"), "{message}");
}
