//! Modifiers: user functions that shape a turn's text
//!
//! A modifier is called with the current `text`, `stop` and hook type and
//! returns a [`ModifierValue`]. It can be handed to the director ready-made
//! ([`ModifierSource::Function`]) or as source text compiled through a
//! [`ScriptCompiler`].

mod compiler;
#[allow(clippy::module_inception)]
mod modifier;
mod value;

pub use compiler::{wrap_return, ScriptCompiler, SourceCompiler, TERMINAL_MODIFIER};
pub use modifier::{CallConvention, Modifier, ModifierCall, ModifierFn, ModifierSlot, ModifierSource};
pub use value::ModifierValue;
