//! Director: turn-lifecycle orchestration of user modifiers
//!
//! This module provides the [`Director`], which handles:
//! - Registering each phase's modifiers in a write-once catalog
//! - Running them in order and normalizing what they return
//! - Guarding the shared `text`/`stop` state against invalid writes
//! - Persisting the catalog into `state` for later inspection
//!
//! # Example
//!
//! ```ignore
//! use scenario_director::director::{Director, TurnContext};
//! use scenario_director::modifier::{Modifier, ModifierValue};
//!
//! let mut ctx = TurnContext::with_text("You open the door.");
//! let mut director = Director::new(&mut ctx);
//!
//! let shout = Modifier::new("shout", |call| {
//!     Ok(call.text.clone().map(|t| t.to_uppercase()).into())
//! });
//! director.output(&mut ctx, [shout])?;
//!
//! let outcome = director.finish(&ctx);
//! ```

mod config;
mod context;
#[allow(clippy::module_inception)]
mod director;
mod normalize;
mod runner;

pub use config::{DirectorConfig, DEFAULT_MESSAGE_KEY, DEFAULT_STORE_KEY};
pub use context::{TurnContext, TurnOutcome};
pub use director::Director;
pub use runner::{ScenarioScripts, TurnReport, TurnRunner};
