//! Compiling textual modifier source into callables
//!
//! Source arrives from an editor as text. The director prepends `return `
//! when needed and hands the body to a [`ScriptCompiler`]; the result is a
//! [`ModifierSlot`] or a [`CompileError`]. Nothing is evaluated ambiently.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

use super::modifier::{Modifier, ModifierSlot};
use crate::core::CompileError;

/// Name of the host's terminal modifier binding
pub const TERMINAL_MODIFIER: &str = "modifier";

static IDENT: LazyLock<Option<Regex>> = LazyLock::new(|| pattern(r"^[A-Za-z_$][\w$]*$"));
static ARROW: LazyLock<Option<Regex>> =
    LazyLock::new(|| pattern(r"(?s)^\([\w$,\s]*\)\s*=>\s*(.+)$"));
static FUNCTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    pattern(r"(?s)^function\s*([A-Za-z_$][\w$]*)?\s*\([\w$,\s]*\)\s*\{\s*return\s+(.+?);?\s*\}$")
});

fn pattern(re: &str) -> Option<Regex> {
    match Regex::new(re) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("[SourceCompiler] Failed to compile regex: {}", e);
            None
        }
    }
}

/// Turns a `return ...` body into a modifier
pub trait ScriptCompiler: Send + Sync {
    /// Compile a body that starts with `return `.
    ///
    /// `Ok(ModifierSlot::Unset)` means the source names the host default
    /// and should be skipped.
    fn compile(&self, body: &str) -> Result<ModifierSlot, CompileError>;
}

/// Prefix `source` with `return ` unless it already starts with it
pub fn wrap_return(source: &str) -> String {
    let trimmed = source.trim();
    if trimmed.starts_with("return ") {
        trimmed.to_string()
    } else {
        format!("return {}", trimmed)
    }
}

/// Built-in compiler for the small expression language scripts use.
///
/// Understands:
/// - `return name`: a modifier declared earlier (usually by the shared library)
/// - `return modifier`: the host default, resolves to [`ModifierSlot::Unset`]
/// - `return (text, stop) => <json>`: an anonymous modifier returning the literal
/// - `return function name(...) { return <json> }`: the same, named
#[derive(Debug, Clone, Default)]
pub struct SourceCompiler {
    declarations: HashMap<String, Modifier>,
}

impl SourceCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a modifier so source text can refer to it by name
    pub fn declare(&mut self, modifier: Modifier) {
        tracing::debug!("Declaring modifier: {}", modifier.name());
        self.declarations
            .insert(modifier.name().to_string(), modifier);
    }

    /// Builder form of [`declare`](Self::declare)
    pub fn with_declaration(mut self, modifier: Modifier) -> Self {
        self.declare(modifier);
        self
    }

    fn literal(name: &str, expr: &str) -> Result<ModifierSlot, CompileError> {
        let value: Value = serde_json::from_str(expr.trim().trim_end_matches(';').trim())
            .map_err(|_| CompileError::Syntax(expr.trim().to_string()))?;
        Ok(ModifierSlot::UserDefined(Modifier::constant(name, value)))
    }
}

impl ScriptCompiler for SourceCompiler {
    fn compile(&self, body: &str) -> Result<ModifierSlot, CompileError> {
        let trimmed = body.trim();
        let expr = if trimmed == "return" {
            ""
        } else {
            trimmed.strip_prefix("return ").unwrap_or(trimmed)
        };
        let expr = expr.trim().trim_end_matches(';').trim();

        if expr.is_empty() {
            return Err(CompileError::Empty);
        }

        let (Some(ident), Some(arrow), Some(function)) =
            (IDENT.as_ref(), ARROW.as_ref(), FUNCTION.as_ref())
        else {
            return Err(CompileError::Syntax(expr.to_string()));
        };

        if ident.is_match(expr) {
            if expr == TERMINAL_MODIFIER {
                return Ok(ModifierSlot::Unset);
            }
            return self
                .declarations
                .get(expr)
                .cloned()
                .map(ModifierSlot::UserDefined)
                .ok_or_else(|| CompileError::UnknownIdentifier(expr.to_string()));
        }

        if let Some(cap) = arrow.captures(expr) {
            return Self::literal("", &cap[1]);
        }

        if let Some(cap) = function.captures(expr) {
            let name = cap.get(1).map_or("", |m| m.as_str());
            return Self::literal(name, &cap[2]);
        }

        Err(CompileError::Syntax(expr.to_string()))
    }
}
