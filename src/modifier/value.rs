//! Values a modifier may return

use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;

use super::modifier::Modifier;

/// Whatever a modifier handed back.
///
/// The director resolves this down to the `{text, stop}` contract; see
/// [`Director::set_text`](crate::director::Director::set_text).
pub enum ModifierValue {
    Undefined,
    Null,
    Text(String),
    /// Ordered pair `[text, stop]`
    Pair { text: Box<ModifierValue>, stop: bool },
    /// Keyed structure `{text, stop}`
    Record { text: Box<ModifierValue>, stop: bool },
    /// Another modifier, invoked and resolved in turn
    Callable(Modifier),
    /// A deferred computation. Always rejected, never awaited.
    Pending(BoxFuture<'static, anyhow::Result<ModifierValue>>),
    /// Numbers, booleans and anything else with no text meaning
    Other(Value),
}

impl ModifierValue {
    /// Create a text value
    pub fn text(text: impl Into<String>) -> Self {
        ModifierValue::Text(text.into())
    }

    /// Create a `[text, stop]` pair
    pub fn pair(text: impl Into<ModifierValue>, stop: bool) -> Self {
        ModifierValue::Pair {
            text: Box::new(text.into()),
            stop,
        }
    }

    /// Create a `{text, stop}` record
    pub fn record(text: impl Into<ModifierValue>, stop: bool) -> Self {
        ModifierValue::Record {
            text: Box::new(text.into()),
            stop,
        }
    }

    /// Wrap a future as a pending value
    pub fn pending<F>(future: F) -> Self
    where
        F: std::future::Future<Output = anyhow::Result<ModifierValue>> + Send + 'static,
    {
        ModifierValue::Pending(Box::pin(future))
    }

    /// Runtime type name, as reported in validation errors
    pub fn type_name(&self) -> &'static str {
        match self {
            ModifierValue::Undefined => "Undefined",
            ModifierValue::Null => "Null",
            ModifierValue::Text(_) => "String",
            ModifierValue::Pair { .. } => "Array",
            ModifierValue::Record { .. } => "Object",
            ModifierValue::Callable(_) => "Function",
            ModifierValue::Pending(_) => "Promise",
            ModifierValue::Other(value) => match value {
                Value::Bool(_) => "Boolean",
                Value::Number(_) => "Number",
                Value::String(_) => "String",
                Value::Null => "Null",
                Value::Array(_) => "Array",
                Value::Object(_) => "Object",
            },
        }
    }

    /// Whether this value may be written into the shared `text` slot
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            ModifierValue::Text(_) | ModifierValue::Null | ModifierValue::Undefined
        )
    }
}

impl fmt::Debug for ModifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierValue::Undefined => f.write_str("Undefined"),
            ModifierValue::Null => f.write_str("Null"),
            ModifierValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ModifierValue::Pair { text, stop } => f
                .debug_struct("Pair")
                .field("text", text)
                .field("stop", stop)
                .finish(),
            ModifierValue::Record { text, stop } => f
                .debug_struct("Record")
                .field("text", text)
                .field("stop", stop)
                .finish(),
            ModifierValue::Callable(modifier) => {
                f.debug_tuple("Callable").field(modifier).finish()
            }
            ModifierValue::Pending(_) => f.write_str("Pending(..)"),
            ModifierValue::Other(value) => f.debug_tuple("Other").field(value).finish(),
        }
    }
}

impl From<&str> for ModifierValue {
    fn from(text: &str) -> Self {
        ModifierValue::Text(text.to_string())
    }
}

impl From<String> for ModifierValue {
    fn from(text: String) -> Self {
        ModifierValue::Text(text)
    }
}

impl From<Option<String>> for ModifierValue {
    fn from(text: Option<String>) -> Self {
        text.map_or(ModifierValue::Null, ModifierValue::Text)
    }
}

impl From<Modifier> for ModifierValue {
    fn from(modifier: Modifier) -> Self {
        ModifierValue::Callable(modifier)
    }
}

impl From<Value> for ModifierValue {
    /// Arrays become pairs and objects become records. `stop` only counts
    /// when it is literally `true`.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ModifierValue::Null,
            Value::String(text) => ModifierValue::Text(text),
            Value::Array(items) => {
                let mut items = items.into_iter();
                let text = items.next().map_or(ModifierValue::Undefined, Into::into);
                let stop = matches!(items.next(), Some(Value::Bool(true)));
                ModifierValue::pair(text, stop)
            }
            Value::Object(mut map) => {
                let text = map
                    .remove("text")
                    .map_or(ModifierValue::Undefined, Into::into);
                let stop = matches!(map.get("stop"), Some(Value::Bool(true)));
                ModifierValue::record(text, stop)
            }
            other => ModifierValue::Other(other),
        }
    }
}
