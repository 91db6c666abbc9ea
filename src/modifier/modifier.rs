//! Modifier capability and the ways it can be supplied

use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, LazyLock};

use super::value::ModifierValue;
use crate::hooks::HookType;

/// Names matching this follow the auto-cards calling convention
static AUTO_CARDS: LazyLock<Option<Regex>> = LazyLock::new(|| match Regex::new(r"(?i)autocards?") {
    Ok(re) => Some(re),
    Err(e) => {
        tracing::warn!("[Modifier] Failed to compile regex: {}", e);
        None
    }
});

/// Signature of a modifier body
pub type ModifierFn =
    dyn Fn(&mut ModifierCall<'_>) -> anyhow::Result<ModifierValue> + Send + Sync;

/// How a modifier is called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallConvention {
    /// Standard `(text, stop, hook)` call, bound to the director
    Bound,
    /// Legacy auto-cards call `(hook, text, stop)`
    Positional,
    /// Auto-cards during `library`: called with `null`, result discarded
    Registration,
}

/// What a modifier sees when it runs
pub struct ModifierCall<'a> {
    /// Current shared text. `None` for registration calls.
    pub text: Option<String>,
    pub stop: bool,
    pub hook: HookType,
    pub convention: CallConvention,
    /// The persistent adventure state
    pub state: &'a mut Value,
}

/// A named modifier function
#[derive(Clone)]
pub struct Modifier {
    name: String,
    func: Arc<ModifierFn>,
}

impl Modifier {
    /// Create a new named modifier
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut ModifierCall<'_>) -> anyhow::Result<ModifierValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Create a modifier with no name
    pub fn anonymous<F>(func: F) -> Self
    where
        F: Fn(&mut ModifierCall<'_>) -> anyhow::Result<ModifierValue> + Send + Sync + 'static,
    {
        Self::new("", func)
    }

    /// A modifier that always returns the same literal
    pub fn constant(name: impl Into<String>, value: Value) -> Self {
        Self::new(name, move |_call| Ok(ModifierValue::from(value.clone())))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this modifier follows the auto-cards calling convention.
    ///
    /// Matches `autocard` or `autocards` anywhere in the name, any case.
    pub fn is_auto_cards(&self) -> bool {
        AUTO_CARDS
            .as_ref()
            .is_some_and(|re| re.is_match(&self.name))
    }

    /// The convention this modifier is called with during `hook`
    pub fn convention_for(&self, hook: HookType) -> CallConvention {
        match (self.is_auto_cards(), hook) {
            (true, HookType::Library) => CallConvention::Registration,
            (true, _) => CallConvention::Positional,
            (false, _) => CallConvention::Bound,
        }
    }

    pub(crate) fn invoke(&self, call: &mut ModifierCall<'_>) -> anyhow::Result<ModifierValue> {
        (self.func)(call)
    }
}

impl fmt::Debug for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modifier").field("name", &self.name).finish()
    }
}

/// A modifier as handed to a phase entry method
#[derive(Debug, Clone)]
pub enum ModifierSource {
    /// A ready callable
    Function(Modifier),
    /// Source text, compiled by the director's [`ScriptCompiler`](super::ScriptCompiler)
    Script(String),
    /// The host's default terminal `modifier`. Always skipped.
    HostDefault,
}

impl From<Modifier> for ModifierSource {
    fn from(modifier: Modifier) -> Self {
        ModifierSource::Function(modifier)
    }
}

impl From<&str> for ModifierSource {
    fn from(source: &str) -> Self {
        ModifierSource::Script(source.to_string())
    }
}

impl From<String> for ModifierSource {
    fn from(source: String) -> Self {
        ModifierSource::Script(source)
    }
}

/// The top-level `modifier` binding of a phase
#[derive(Debug, Clone, Default)]
pub enum ModifierSlot {
    /// Left to the host default
    #[default]
    Unset,
    UserDefined(Modifier),
}

impl ModifierSlot {
    pub fn is_user_defined(&self) -> bool {
        matches!(self, ModifierSlot::UserDefined(_))
    }
}
