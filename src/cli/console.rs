use colored::*;

use crate::director::TurnOutcome;
use crate::session::TurnRecord;

/// Console renders turn results with colored formatting
pub struct Console {
    text_color: Color,
    modifier_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            text_color: Color::Green,
            modifier_color: Color::Cyan,
        }
    }

    /// Create a new Console with custom colors
    pub fn with_colors(text_color: Color, modifier_color: Color) -> Self {
        Self {
            text_color,
            modifier_color,
        }
    }

    /// Render the final `{text, stop}` of a hook run
    pub fn format_outcome(&self, outcome: &TurnOutcome) -> String {
        let text = match outcome.text {
            Some(ref text) => text.color(self.text_color).to_string(),
            None => "(none)".bright_black().to_string(),
        };
        let stop = if outcome.stop {
            "stopped".red().bold().to_string()
        } else {
            "running".green().to_string()
        };
        format!("{} {}\n{} {}", "Text:".bold(), text, "Stop:".bold(), stop)
    }

    /// Render a logged turn: header, outcome, then the modifier catalog
    pub fn format_turn(&self, record: &TurnRecord) -> String {
        let mut output = format!(
            "{} {} {}\n",
            format!("[{}]", record.hook).bright_blue().bold(),
            record.turn_id.to_string().bright_black(),
            record.recorded_at.format("%H:%M:%S%.3f").to_string().bright_black()
        );
        output.push_str(&self.format_outcome(&record.outcome));
        output.push('\n');

        if record.active_modifiers.is_empty() {
            output.push_str(&"No modifiers ran.".bright_black().to_string());
        } else {
            output.push_str(&format!("{}\n", "Modifiers:".bold()));
            for (i, name) in record.active_modifiers.iter().enumerate() {
                let name = if name.is_empty() { "(anonymous)" } else { name.as_str() };
                output.push_str(&format!("  {}. {}\n", i + 1, name.color(self.modifier_color)));
            }
        }
        output
    }

    /// Print a logged turn
    pub fn print_turn(&self, record: &TurnRecord) {
        println!("{}", self.format_turn(record));
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
