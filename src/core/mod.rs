//! Shared error types

pub mod error;

pub use error::{CompileError, DirectorError, DirectorResult};
