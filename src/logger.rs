//! Terminal logging with colored module prefixes.
//!
//! Every line is `HH:MM:SS [module] message`. The prefix color tells the
//! reader at a glance which part of the pipeline spoke:
//!
//! ```ignore
//! log!("sync"; "cloning {} ({})", url, branch);
//! log!("error"; "content reload failed: {err:#}");
//! ```

use colored::{ColoredString, Colorize};
use std::io::{Write, stdout};

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Write one log record to stdout.
///
/// Multiline messages (git stderr, error chains) are indented under the prefix
/// so they stay visually attached to the record that produced them.
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let time = chrono::Local::now().format("%H:%M:%S").to_string();

    let mut stdout = stdout().lock();
    let mut lines = message.lines();
    let first = lines.next().unwrap_or_default();
    writeln!(stdout, "{} {prefix} {first}", time.dimmed()).ok();
    for line in lines {
        writeln!(stdout, "{:width$} {line}", "", width = indent_width(&time, module)).ok();
    }
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "sync" => prefix.bright_blue().bold(),
        "refresh" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Column where the message text starts: `time + ' ' + [module]`.
#[inline]
const fn indent_width(time: &str, module: &str) -> usize {
    time.len() + 1 + module.len() + 2
}
