use serde_json::Value;
use std::net::{Ipv4Addr, Ipv6Addr};

use super::{Validator, ValidatorState};
use crate::core::{Adapter, AdapterError, AdapterResult, Options, OptionsBag};

const NOT_A_STRING: &str = "The provided IP address must be a string.";
const INVALID: &str = "\"%value%\" is not a valid IP address";
const INVALID_V4: &str = "\"%value%\" is not a valid IPv4 address";
const INVALID_V6: &str = "\"%value%\" is not a valid IPv6 address";

/// Accepts dotted-decimal IPv4 and/or IPv6 addresses.
///
/// Options: `allow_ipv4` and `allow_ipv6`, both `true` by default. At least one
/// family has to stay enabled.
#[derive(Debug, Clone)]
pub struct IpAddress {
    state: ValidatorState,
}

impl IpAddress {
    pub const ALLOW_IPV4: &'static str = "allow_ipv4";
    pub const ALLOW_IPV6: &'static str = "allow_ipv6";

    pub fn new() -> Self {
        let mut options = OptionsBag::new();
        options
            .set(Self::ALLOW_IPV4, Value::Bool(true))
            .set(Self::ALLOW_IPV6, Value::Bool(true));
        Self {
            state: ValidatorState::new(options),
        }
    }

    pub fn with_options(options: Options) -> AdapterResult<Self> {
        let mut validator = Self::new();
        validator.set_options(options)?;
        Ok(validator)
    }

    pub fn allows_ipv4(&self) -> bool {
        self.state.options().get_bool(Self::ALLOW_IPV4).unwrap_or(true)
    }

    pub fn allows_ipv6(&self) -> bool {
        self.state.options().get_bool(Self::ALLOW_IPV6).unwrap_or(true)
    }
}

impl Default for IpAddress {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for IpAddress {
    fn type_name(&self) -> &'static str {
        "ip_address"
    }

    fn options_bag(&self) -> Option<&OptionsBag> {
        Some(self.state.options())
    }

    fn options_bag_mut(&mut self) -> Option<&mut OptionsBag> {
        Some(self.state.options_mut())
    }

    fn set_option(&mut self, name: &str, value: Value) -> AdapterResult<()> {
        if name == Self::ALLOW_IPV4 || name == Self::ALLOW_IPV6 {
            let enabled = value.as_bool().ok_or_else(|| {
                AdapterError::InvalidArgument(format!("{name} must be a boolean, got {value}"))
            })?;
            let (v4, v6) = if name == Self::ALLOW_IPV4 {
                (enabled, self.allows_ipv6())
            } else {
                (self.allows_ipv4(), enabled)
            };
            if !v4 && !v6 {
                return Err(AdapterError::Configuration(
                    "ip_address validator needs IPv4 or IPv6 allowed; both cannot be disabled"
                        .into(),
                ));
            }
        }
        self.state.options_mut().set(name, value);
        Ok(())
    }
}

impl Validator for IpAddress {
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

        let (v4, v6) = (self.allows_ipv4(), self.allows_ipv6());
        if v4 && candidate.parse::<Ipv4Addr>().is_ok() {
            return true;
        }
        if v6 && candidate.parse::<Ipv6Addr>().is_ok() {
            return true;
        }

        let template = match (v4, v6) {
            (true, false) => INVALID_V4,
            (false, true) => INVALID_V6,
            _ => INVALID,
        };
        self.state.add_message(template, None);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn only(family: &str) -> IpAddress {
        let mut options = Options::new();
        if family == "v4" {
            options.insert(IpAddress::ALLOW_IPV6.into(), json!(false));
        } else {
            options.insert(IpAddress::ALLOW_IPV4.into(), json!(false));
        }
        IpAddress::with_options(options).unwrap()
    }

    #[test]
    fn accepts_ipv4_loopback() {
        let mut validator = IpAddress::new();
        assert!(validator.is_valid(json!("127.0.0.1")));
        assert!(validator.messages().is_empty());
    }

    #[test]
    fn accepts_ipv6_with_defaults() {
        let mut validator = IpAddress::new();
        assert!(validator.is_valid(json!("::1")));
        assert!(validator.is_valid(json!("2001:db8::ff00:42:8329")));
    }

    #[test]
    fn rejects_out_of_range_octets() {
        let mut validator = IpAddress::new();
        assert!(!validator.is_valid(json!("999.999.999.999")));
        assert_eq!(validator.messages().len(), 1);
        assert!(validator.messages()[0].contains("999.999.999.999"));
        assert!(!validator.messages()[0].contains("v4"));
    }

    #[test]
    fn names_family_when_only_one_enabled() {
        let mut validator = only("v4");
        assert!(!validator.is_valid(json!("::1")));
        assert_eq!(validator.messages(), ["\"::1\" is not a valid IPv4 address"]);

        let mut validator = only("v6");
        assert!(!validator.is_valid(json!("10.0.0.1")));
        assert_eq!(
            validator.messages(),
            ["\"10.0.0.1\" is not a valid IPv6 address"]
        );
    }

    #[test]
    fn rejects_non_string_without_interpolation() {
        let mut validator = IpAddress::new();
        assert!(!validator.is_valid(json!(127001)));
        assert_eq!(validator.messages(), [NOT_A_STRING]);
    }

    #[test]
    fn disabling_both_families_is_configuration_error() {
        let mut validator = IpAddress::new();
        let mut options = Options::new();
        options.insert(IpAddress::ALLOW_IPV4.into(), json!(false));
        options.insert(IpAddress::ALLOW_IPV6.into(), json!(false));
        assert!(matches!(
            validator.set_options(options),
            Err(AdapterError::Configuration(_))
        ));
        assert!(validator.allows_ipv4() || validator.allows_ipv6());
    }

    #[test]
    fn non_boolean_toggle_is_invalid_argument() {
        let mut validator = IpAddress::new();
        assert!(matches!(
            validator.set_option(IpAddress::ALLOW_IPV4, json!("no")),
            Err(AdapterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn messages_accumulate_across_calls() {
        let mut validator = IpAddress::new();
        assert!(!validator.is_valid(json!("a")));
        assert!(!validator.is_valid(json!("b")));
        assert!(validator.is_valid(json!("1.2.3.4")));
        assert_eq!(validator.messages().len(), 2);
    }
}
