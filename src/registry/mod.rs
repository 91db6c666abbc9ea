//! Per-turn catalog of registered modifiers
//!
//! The registry is write-once per hook type: the first registration for a
//! hook snapshots `{text, stop}` and stores the deduplicated modifier names.
//! Later registrations for the same hook leave the entry alone. This is
//! bookkeeping only; it never decides which modifiers run.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::hooks::HookType;

/// `{text, stop}` as they were when a hook first registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub text: Option<String>,
    pub stop: bool,
}

/// Catalog entry for one hook type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    #[serde(rename = "_")]
    pub snapshot: Snapshot,
    /// Unique modifier names, in first-occurrence order
    pub scripts: Vec<String>,
}

/// Modifier catalog, keyed by hook type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModifierRegistry {
    #[serde(flatten)]
    entries: BTreeMap<HookType, RegistryEntry>,
    #[serde(skip)]
    order: Vec<HookType>,
}

impl ModifierRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the modifiers registered for `hook`.
    ///
    /// Returns `false` when the hook already had an entry; the snapshot and
    /// the stored names are left untouched in that case.
    pub fn register<I, S>(&mut self, hook: HookType, snapshot: Snapshot, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.entries.contains_key(&hook) {
            tracing::debug!("Registry entry for {} already exists", hook);
            return false;
        }

        let scripts = dedup(names.into_iter().map(Into::into));
        tracing::debug!("Registered {} modifier(s) for {}", scripts.len(), hook);

        self.entries.insert(hook, RegistryEntry { snapshot, scripts });
        self.order.push(hook);
        true
    }

    /// Entry for a hook type, if one was registered this turn
    pub fn get(&self, hook: HookType) -> Option<&RegistryEntry> {
        self.entries.get(&hook)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the order their hooks were first registered
    pub fn entries(&self) -> impl Iterator<Item = (HookType, &RegistryEntry)> + '_ {
        self.order
            .iter()
            .filter_map(move |hook| self.entries.get(hook).map(|entry| (*hook, entry)))
    }

    /// Every registered modifier name, deduplicated across all hooks.
    ///
    /// Lazy and recomputed on each call.
    pub fn all_active(&self) -> impl Iterator<Item = &str> + '_ {
        let mut seen = HashSet::new();
        self.entries()
            .flat_map(|(_, entry)| entry.scripts.iter().map(String::as_str))
            .filter(move |name| seen.insert(*name))
    }
}

fn dedup(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.filter(|name| seen.insert(name.clone())).collect()
}
