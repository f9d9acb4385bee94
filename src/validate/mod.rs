//! Input validators.
//!
//! Validators never fail hard on bad data: [`Validator::is_valid`] returns
//! `false` and records a human-readable explanation. Messages accumulate across
//! calls until [`Validator::reset`] or [`Validator::set_messages`] clears them.

mod ip_address;
mod url;

pub use ip_address::IpAddress;
pub use url::Url;

use serde_json::Value;

use crate::core::{Adapter, OptionsBag};

/// Marker replaced by the validated value inside message templates.
pub const VALUE_PLACEHOLDER: &str = "%value%";

/// String form used for message interpolation: raw text for JSON strings,
/// JSON rendering for everything else.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Substitutes `value` into the first placeholder of `template`.
pub fn render_message(template: &str, value: &Value) -> String {
    if template.contains(VALUE_PLACEHOLDER) {
        template.replacen(VALUE_PLACEHOLDER, &value_to_string(value), 1)
    } else {
        template.to_owned()
    }
}

/// Value, messages and options carried by every validator.
#[derive(Debug, Clone, Default)]
pub struct ValidatorState {
    value: Value,
    messages: Vec<String>,
    options: OptionsBag,
}

impl ValidatorState {
    pub fn new(options: OptionsBag) -> Self {
        Self {
            value: Value::Null,
            messages: Vec::new(),
            options,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn set_messages(&mut self, messages: Vec<String>) {
        self.messages = messages;
    }

    /// Appends `template` rendered against `value`, or against the last
    /// validated value when `value` is `None`.
    pub fn add_message(&mut self, template: &str, value: Option<&Value>) {
        let rendered = render_message(template, value.unwrap_or(&self.value));
        self.messages.push(rendered);
    }

    pub fn options(&self) -> &OptionsBag {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut OptionsBag {
        &mut self.options
    }
}

/// Boolean verdict plus accumulated failure messages for a single input.
pub trait Validator: Adapter {
    fn state(&self) -> &ValidatorState;

    fn state_mut(&mut self) -> &mut ValidatorState;

    /// Stores `value`, runs the rule, and records a message on failure.
    fn is_valid(&mut self, value: Value) -> bool;

    fn add_message(&mut self, template: &str, value: Option<&Value>) {
        self.state_mut().add_message(template, value);
    }

    fn messages(&self) -> &[String] {
        self.state().messages()
    }

    fn set_messages(&mut self, messages: Vec<String>) {
        self.state_mut().set_messages(messages);
    }

    fn value(&self) -> &Value {
        self.state().value()
    }

    fn set_value(&mut self, value: Value) {
        self.state_mut().set_value(value);
    }

    /// Clears messages and the stored value so the instance can be reused.
    fn reset(&mut self) {
        let state = self.state_mut();
        state.set_messages(Vec::new());
        state.set_value(Value::Null);
    }
}
