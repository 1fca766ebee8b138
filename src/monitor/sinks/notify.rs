//! Rule-based notifications over the latest values.

use crate::monitor::sinks::CycleSink;
use crate::monitor::{CycleOutput, ValueMap};
use crate::trace::trace_warn;
use crate::util::InspectResult;

/// Delivery channel for notification text (chat bot, mail, ...).
pub trait Transport {
    fn send(&mut self, message: &str) -> InspectResult<()>;
}

/// Records every message; handy for tests and dry runs.
impl Transport for Vec<String> {
    fn send(&mut self, message: &str) -> InspectResult<()> {
        self.push(message.to_string());
        Ok(())
    }
}

/// Predicate over a value snapshot.
pub type Condition = Box<dyn Fn(&ValueMap) -> bool + Send>;

/// Evaluates `(condition, message)` rules and delivers the triggered messages.
pub struct Notifier<T> {
    rules: Vec<(Condition, String)>,
    transport: T,
    latest: ValueMap,
    fresh: bool,
    stale_polls: u64,
}

impl<T: Transport> Notifier<T> {
    pub fn new(transport: T) -> Self {
        Self {
            rules: Vec::new(),
            transport,
            latest: ValueMap::new(),
            fresh: false,
            stale_polls: 0,
        }
    }

    /// Adds a rule; rules are evaluated in insertion order.
    pub fn with_rule<F>(mut self, condition: F, message: impl Into<String>) -> Self
    where
        F: Fn(&ValueMap) -> bool + Send + 'static,
    {
        self.rules.push((Box::new(condition), message.into()));
        self
    }

    /// Stores the values the next poll will check.
    pub fn update(&mut self, values: &ValueMap) {
        self.latest = values.clone();
        self.fresh = true;
    }

    /// Messages of all triggered rules, joined with `\n`.
    ///
    /// Polling again without an [`update`](Self::update) in between still
    /// evaluates the old values, but is warned about and counted.
    pub fn aware(&mut self) -> String {
        if !self.fresh {
            self.stale_polls += 1;
            trace_warn!("notifier_stale", "polled without a fresh update");
        }
        self.fresh = false;
        self.rules
            .iter()
            .filter(|(condition, _)| condition(&self.latest))
            .map(|(_, message)| message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Polls and sends the result when any rule triggered.
    pub fn notify(&mut self) -> InspectResult<Option<String>> {
        let text = self.aware();
        if text.is_empty() {
            return Ok(None);
        }
        self.transport.send(&text)?;
        Ok(Some(text))
    }

    /// Number of polls made without a fresh update.
    pub fn stale_polls(&self) -> u64 {
        self.stale_polls
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T: Transport> CycleSink for Notifier<T> {
    fn consume(&mut self, output: &CycleOutput) -> InspectResult<()> {
        self.update(&output.values);
        self.notify().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::Notifier;
    use crate::monitor::ValueMap;
    use crate::value::Value;

    fn notifier() -> Notifier<Vec<String>> {
        Notifier::new(Vec::new())
            .with_rule(
                |v: &ValueMap| v.get("lamp").and_then(Value::as_bool) == Some(false),
                "lamp off",
            )
            .with_rule(
                |v: &ValueMap| v.get("temp").and_then(Value::as_f64).is_some_and(|t| t > 30.0),
                "too hot",
            )
    }

    #[test]
    fn triggered_messages_are_joined_in_rule_order() {
        let mut values = ValueMap::new();
        values.insert("lamp", Value::Binary(false));
        values.insert("temp", Value::Numeric("31.5".to_string()));

        let mut n = notifier();
        n.update(&values);
        assert_eq!(n.notify().unwrap().as_deref(), Some("lamp off\ntoo hot"));

        values.insert("lamp", Value::Binary(true));
        values.insert("temp", Value::Numeric("20.0".to_string()));
        n.update(&values);
        assert_eq!(n.notify().unwrap(), None);
        assert_eq!(n.into_transport(), vec!["lamp off\ntoo hot".to_string()]);
    }

    #[test]
    fn repeated_polls_are_counted() {
        let mut n = notifier();
        assert_eq!(n.aware(), "");
        let mut values = ValueMap::new();
        values.insert("lamp", Value::Binary(false));
        n.update(&values);
        assert_eq!(n.aware(), "lamp off");
        assert_eq!(n.aware(), "lamp off");
        assert_eq!(n.stale_polls(), 2);
    }
}
