use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Validator, ValidatorState};
use crate::core::{Adapter, OptionsBag};

const NOT_A_STRING: &str = "The provided URL must be a string.";
const INVALID: &str = "\"%value%\" is an invalid URL";

/// `scheme://host[/path]` with a scheme of at least three alphanumerics.
static AUTHORITY_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9]{3,}://[^/?#\s]+(?:[/?#]\S*)?$").expect("valid url pattern")
});

/// Accepts absolute URLs with an explicit authority.
///
/// Both a generic parse and the stricter `scheme://host` shape have to pass,
/// so `ftp:///no/host` or `mailto:someone@example.com` are rejected even though
/// a plain URL parser accepts them.
#[derive(Debug, Clone, Default)]
pub struct Url {
    state: ValidatorState,
}

impl Url {
    pub fn new() -> Self {
        Self {
            state: ValidatorState::new(OptionsBag::new()),
        }
    }
}

impl Adapter for Url {
    fn type_name(&self) -> &'static str {
        "url"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(self.state.options())
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(self.state.options_mut())
    }
}

impl Validator for Url {
    fn state(&self) -> &ValidatorState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ValidatorState {
        &mut self.state
    }

    fn is_valid(&mut self, value: Value) -> bool {
        self.state.set_value(value);
        let Some(candidate) = self.state.value().as_str() else {
            self.state.add_message(NOT_A_STRING, None);
            return false;
        };

        if ::url::Url::parse(candidate).is_ok() && AUTHORITY_URL.is_match(candidate) {
            return true;
        }

        self.state.add_message(INVALID, None);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_plain_http_url() {
        let mut validator = Url::new();
        assert!(validator.is_valid(json!("http://www.example.com/")));
        assert!(validator.is_valid(json!("https://example.com/search?q=rust#top")));
        assert!(validator.is_valid(json!("HTTPS://EXAMPLE.COM")));
        assert!(validator.messages().is_empty());
    }

    #[test]
    fn rejects_missing_authority() {
        let mut validator = Url::new();
        assert!(!validator.is_valid(json!("ftp:///no/host")));
        assert_eq!(validator.messages(), ["\"ftp:///no/host\" is an invalid URL"]);
    }

    #[test]
    fn rejects_urls_a_parser_would_accept() {
        let mut validator = Url::new();
        assert!(!validator.is_valid(json!("mailto:someone@example.com")));
        assert!(!validator.is_valid(json!("ws://")));
        assert!(!validator.is_valid(json!("/relative/path")));
        assert_eq!(validator.messages().len(), 3);
    }

    #[test]
    fn short_scheme_is_rejected() {
        let mut validator = Url::new();
        assert!(!validator.is_valid(json!("ab://example.com/")));
    }

    #[test]
    fn non_string_input() {
        let mut validator = Url::new();
        assert!(!validator.is_valid(json!(12345)));
        assert_eq!(validator.messages(), ["The provided URL must be a string."]);
    }
}
