//! Arguments of one intercepted call.

use serde::Serialize;
use serde_json::Value;

/// Ordered argument values of a call, with parameter names when the caller
/// can supply them.
///
/// Values are captured as `serde_json::Value` so key expressions can walk
/// into structured arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    names: Vec<Option<String>>,
    values: Vec<Value>,
    invalid: Option<String>,
}

impl Args {
    /// An empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named argument.
    ///
    /// A value that fails to serialize marks the whole list invalid; no key
    /// can be derived from it.
    pub fn arg<V: Serialize>(mut self, name: impl Into<String>, value: V) -> Self {
        let name = name.into();
        let value = self.capture(&name, value);
        self.names.push(Some(name));
        self.values.push(value);
        self
    }

    /// Append an argument whose parameter name is not known.
    pub fn unnamed<V: Serialize>(mut self, value: V) -> Self {
        let label = format!("#{}", self.values.len());
        let value = self.capture(&label, value);
        self.names.push(None);
        self.values.push(value);
        self
    }

    fn capture<V: Serialize>(&mut self, label: &str, value: V) -> Value {
        match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                if self.invalid.is_none() {
                    self.invalid = Some(format!("argument '{}' is not serializable: {}", label, e));
                }
                Value::Null
            }
        }
    }

    /// Positional arguments only; parameter names are unavailable.
    pub fn positional(values: Vec<Value>) -> Self {
        Args {
            names: vec![None; values.len()],
            values,
            invalid: None,
        }
    }

    /// Build from separately recovered names and values.
    ///
    /// The two lists may disagree in length; in that case names are treated
    /// as unavailable when keys are derived.
    pub fn from_parts(names: Vec<String>, values: Vec<Value>) -> Self {
        Args {
            names: names.into_iter().map(Some).collect(),
            values,
            invalid: None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Why the arguments cannot be keyed, if any of them failed to serialize.
    pub fn invalid(&self) -> Option<&str> {
        self.invalid.as_deref()
    }

    /// `(name, value)` bindings, or `None` when any name is missing or the
    /// name count does not match the value count.
    pub fn bindings(&self) -> Option<Vec<(&str, &Value)>> {
        if self.names.len() != self.values.len() {
            return None;
        }
        self.names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| name.as_deref().map(|n| (n, value)))
            .collect()
    }
}

/// String form of a value as it appears inside a cache key.
///
/// Strings render without quotes; arrays and objects render as compact JSON.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
