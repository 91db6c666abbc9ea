//! Hooks Module
//!
//! The lifecycle points a turn passes through.
//!
//! # Overview
//!
//! Every turn of an adventure runs user scripts at up to four points:
//!
//! | Hook | When | `text` holds |
//! |------|------|--------------|
//! | `library` | Before every other hook | Shared declarations, no text yet |
//! | `input` | Player submitted an action | The player's input |
//! | `context` | Before the model is called | The assembled model context |
//! | `output` | After the model responded | The text shown to the player |
//!
//! **Important:** ALL modifiers registered for a hook run to completion
//! (no short-circuiting), even after one of them sets `stop`.
//!
//! # Example
//!
//! ```ignore
//! use scenario_director::hooks::HookType;
//!
//! let hook: HookType = "context".parse()?;
//! assert_eq!(hook.handler_name(), "onContext");
//! ```

mod types;

pub use types::HookType;
