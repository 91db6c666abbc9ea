//! Error types for the director
//!
//! Every error renders as `[<origin>] <message>`, where the origin is the
//! label of the failing call (a modifier name, a director operation) or
//! `Unknown` when nothing better is available.

use regex::Regex;
use thiserror::Error;

use crate::hooks::HookType;

/// Origin label used when a failure cannot be attributed
pub const UNKNOWN_ORIGIN: &str = "Unknown";

/// Result alias used throughout the crate
pub type DirectorResult<T> = Result<T, DirectorError>;

/// Errors produced while running a phase
#[derive(Debug, Error)]
pub enum DirectorError {
    /// A modifier resolved to a deferred/asynchronous value
    #[error("[{origin}] value is an unsupported asynchronous result")]
    UnsupportedValue { origin: String },

    /// Final text is not a string while `stop` is false
    #[error("[{origin}] text must be a type of string, got \"{found}\"")]
    TypeValidation { origin: String, found: &'static str },

    /// A phase defined its own top-level `modifier`
    #[error("[{origin}] defined \"modifier()\" in \"{hook}\"")]
    ModifierConflict { origin: String, hook: HookType },

    /// Unrecognized hook type label
    #[error("[{origin}] \"{label}\" is not one of library, input, context, output")]
    InvalidHookType { origin: String, label: String },

    /// A user modifier failed while running. Recovered by the director.
    #[error("[{origin}] {message}")]
    ModifierInvocation { origin: String, message: String },

    /// Textual modifier source could not be compiled
    #[error("[{origin}] {source}")]
    Compile {
        origin: String,
        #[source]
        source: CompileError,
    },

    #[error("[{origin}] {message}")]
    Config { origin: String, message: String },

    #[error("[{origin}] {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[{origin}] {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DirectorError {
    /// Wrap an error raised by a user modifier.
    ///
    /// The message is scrubbed of sandbox frame markers. An empty `name`
    /// falls back to the first frame label found in the message, then to
    /// [`UNKNOWN_ORIGIN`].
    pub fn invocation(name: &str, err: &anyhow::Error) -> Self {
        let raw = format!("{:#}", err);
        let origin = if name.is_empty() {
            infer_origin(&raw).unwrap_or_else(|| UNKNOWN_ORIGIN.to_string())
        } else {
            name.to_string()
        };
        Self::ModifierInvocation {
            origin,
            message: scrub_trace(&raw),
        }
    }

    /// The label of the call that failed
    pub fn origin(&self) -> &str {
        match self {
            Self::UnsupportedValue { origin }
            | Self::TypeValidation { origin, .. }
            | Self::ModifierConflict { origin, .. }
            | Self::InvalidHookType { origin, .. }
            | Self::ModifierInvocation { origin, .. }
            | Self::Compile { origin, .. }
            | Self::Config { origin, .. }
            | Self::Io { origin, .. }
            | Self::Json { origin, .. } => origin,
        }
    }

    /// Whether this error aborts the current phase.
    ///
    /// Invocation and compile failures are recovered inside the director and
    /// never reach the host.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::ModifierInvocation { .. } | Self::Compile { .. })
    }
}

/// Errors raised by a [`ScriptCompiler`](crate::modifier::ScriptCompiler)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("\"{0}\" is not defined")]
    UnknownIdentifier(String),

    #[error("unable to compile \"{0}\"")]
    Syntax(String),

    #[error("source is empty")]
    Empty,
}

/// Remove sandbox-internal frame markers from an error trace.
///
/// `at fn (<isolated-vm>:12:5)` becomes `at fn:12:5`, and a doubled
/// `Error: TypeError:` prefix collapses to `TypeError:`.
pub fn scrub_trace(raw: &str) -> String {
    let (prefix, frames) = match (
        Regex::new(r"(?m)^Error:\s(\w*Error:)"),
        Regex::new(r"(?m)\s?\(?<isolated-vm\w*>:(\d+):(\d+)\)?"),
    ) {
        (Ok(p), Ok(f)) => (p, f),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!("[Director] Failed to compile trace regex: {}", e);
            return raw.to_string();
        }
    };

    let collapsed = prefix.replace_all(raw, "$1");
    frames.replace_all(&collapsed, ":$1:$2").into_owned()
}

/// Pull the first `label:line:column` frame name out of a trace
pub fn infer_origin(raw: &str) -> Option<String> {
    let re = Regex::new(r"\s(\w+):\d+:\d+").ok()?;
    re.captures(raw)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}
