use std::collections::BTreeMap;
use std::fmt;

/// Dynamically typed runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Str(String),
    /// Growable, zero-filled sequence of numbers.
    Array(Vec<f64>),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            // NaN is falsy, like any zero.
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::Str(value) => !value.is_empty(),
            Value::Array(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "numar",
            Value::Str(_) => "sir",
            Value::Array(_) => "vector",
        }
    }

    pub(crate) fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(value) => Some(*value),
            Value::Str(_) | Value::Array(_) => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Number(if value { 1.0 } else { 0.0 })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(value) => f.write_str(&format_number(*value)),
            Value::Str(value) => f.write_str(value),
            Value::Array(values) => {
                let rendered = values
                    .iter()
                    .map(|value| format_number(*value))
                    .collect::<Vec<_>>()
                    .join(",");
                f.write_str(&rendered)
            }
        }
    }
}

/// Renders a number the way pseudocode output expects: integral values
/// without a fractional part, `Infinity`/`NaN` for non-finite values, and
/// exponent form (`1e+21`, `1e-7`) outside `[1e-6, 1e21)`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if value == 0.0 {
        "0".to_string()
    } else if !(1e-6..1e21).contains(&value.abs()) {
        let rendered = format!("{value:e}");
        match rendered.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => rendered,
        }
    } else {
        value.to_string()
    }
}

/// Variable storage for one execution session, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    variables: BTreeMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.variables.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.variables
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
