//! Terminal output for turn reports

mod console;

pub use console::Console;
