//! Turn-lifecycle scripting runtime for interactive text adventures
//!
//! Each turn of an adventure runs user modifiers at up to four hooks
//! (`library`, `input`, `context`, `output`). The [`Director`] registers
//! them, runs them in order, normalizes their results into the shared
//! `text`/`stop` pair held by a [`TurnContext`], and keeps a catalog of what
//! ran in the adventure `state`.

pub mod cli;
pub mod core;
pub mod director;
pub mod hooks;
pub mod logging;
pub mod modifier;
pub mod registry;
pub mod session;

pub use crate::core::{CompileError, DirectorError, DirectorResult};
pub use director::{
    Director, DirectorConfig, ScenarioScripts, TurnContext, TurnOutcome, TurnReport, TurnRunner,
};
pub use hooks::HookType;
pub use modifier::{Modifier, ModifierSlot, ModifierSource, ModifierValue, ScriptCompiler, SourceCompiler};
pub use registry::ModifierRegistry;
