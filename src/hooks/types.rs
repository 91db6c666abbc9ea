//! Hook type definition

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::DirectorError;

/// A lifecycle point in a turn
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HookType {
    /// Shared declarations, loaded ahead of every other hook
    #[default]
    Library,
    /// Player input
    Input,
    /// Model context, before the model runs
    Context,
    /// Model output, before it reaches the player
    Output,
}

impl HookType {
    /// All hook types in lifecycle order
    pub const ALL: [HookType; 4] = [
        HookType::Library,
        HookType::Input,
        HookType::Context,
        HookType::Output,
    ];

    /// Canonical lowercase label
    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::Library => "library",
            HookType::Input => "input",
            HookType::Context => "context",
            HookType::Output => "output",
        }
    }

    /// Capitalized `onX` synonym of the entry method
    pub fn handler_name(&self) -> &'static str {
        match self {
            HookType::Library => "onLibrary",
            HookType::Input => "onInput",
            HookType::Context => "onContext",
            HookType::Output => "onOutput",
        }
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookType {
    type Err = DirectorError;

    /// Accepts the canonical labels and their `onX` synonyms
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookType::ALL
            .into_iter()
            .find(|hook| s == hook.as_str() || s == hook.handler_name())
            .ok_or_else(|| DirectorError::InvalidHookType {
                origin: "HookType::from_str".to_string(),
                label: s.to_string(),
            })
    }
}
