//! The host bridge for a single turn
//!
//! Holds the two live scalars (`text`, `stop`), the persistent `state`
//! object and the phase's top-level `modifier` binding. Every write goes
//! through the director so it can be validated and logged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::modifier::{Modifier, ModifierSlot};

/// The `{text, stop}` pair the host reads once all phases have run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub text: Option<String>,
    pub stop: bool,
}

/// Shared turn state, passed by reference into every director operation
#[derive(Debug, Clone)]
pub struct TurnContext {
    turn_id: Uuid,
    text: Option<String>,
    stop: bool,
    /// Persistent adventure state. Always a JSON object.
    pub state: Value,
    /// The phase's own `modifier` binding, if a script defined one
    pub modifier_slot: ModifierSlot,
}

impl TurnContext {
    /// Create a context for a new turn with the given text
    pub fn new(text: Option<String>) -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            text,
            stop: false,
            state: Value::Object(Map::new()),
            modifier_slot: ModifierSlot::Unset,
        }
    }

    /// Create a context holding `text`
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(Some(text.into()))
    }

    /// Carry state over from a previous turn. Non-object state is replaced.
    pub fn with_state(mut self, state: Value) -> Self {
        self.state = if state.is_object() {
            state
        } else {
            tracing::warn!("Ignoring non-object state for turn {}", self.turn_id);
            Value::Object(Map::new())
        };
        self
    }

    pub fn with_stop(mut self, stop: bool) -> Self {
        self.stop = stop;
        self
    }

    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn stop(&self) -> bool {
        self.stop
    }

    /// Bind a user-defined top-level `modifier` for the current phase
    pub fn define_modifier(&mut self, modifier: Modifier) {
        tracing::debug!("Phase defined its own modifier: {}", modifier.name());
        self.modifier_slot = ModifierSlot::UserDefined(modifier);
    }

    /// Drop the phase's own `modifier` binding before the next phase loads
    pub fn clear_modifier(&mut self) {
        if self.modifier_slot.is_user_defined() {
            tracing::debug!("Cleared phase modifier for turn {}", self.turn_id);
        }
        self.modifier_slot = ModifierSlot::Unset;
    }

    /// The host's terminal `modifier()`: the live `{text, stop}`
    pub fn outcome(&self) -> TurnOutcome {
        TurnOutcome {
            text: self.text.clone(),
            stop: self.stop,
        }
    }

    /// Read a string entry of `state`, e.g. the user-visible message
    pub fn state_str(&self, key: &str) -> Option<&str> {
        self.state.get(key).and_then(Value::as_str)
    }

    /// Write `text`, skipping writes that would not change it
    pub(crate) fn store_text(&mut self, text: Option<String>) -> bool {
        if self.text == text {
            return false;
        }
        tracing::trace!("text: {:?} -> {:?}", self.text, text);
        self.text = text;
        true
    }

    /// Write `stop`, skipping writes that would not change it.
    ///
    /// Stopping clears any pending text.
    pub(crate) fn store_stop(&mut self, stop: bool) -> bool {
        if self.stop == stop {
            return false;
        }
        tracing::debug!("stop: {} -> {}", self.stop, stop);
        self.stop = stop;
        if stop && self.text.is_some() {
            self.store_text(None);
        }
        true
    }

    /// Post a message to the user-visible slot in `state`
    pub(crate) fn post_message(&mut self, key: &str, message: &str) {
        if let Some(state) = self.state.as_object_mut() {
            state.insert(key.to_string(), Value::String(message.to_string()));
        }
    }
}

impl Default for TurnContext {
    fn default() -> Self {
        Self::new(None)
    }
}
