//! External command execution utilities.
//!
//! The mirror drives the system `git` binary through the [`exec!`] macro.
//! Successful runs only surface stderr lines that survive the caller's
//! [`FilterRule`]; failures turn into an error carrying the command name,
//! exit status and filtered stderr. Arguments are never echoed back, so
//! credentials passed on the command line do not reach the log.

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
    sync::OnceLock,
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(["git"]; "--version")?;
///
/// // With working directory
/// exec!(dir; ["git"]; "fetch", "origin", branch)?;
///
/// // With custom filter
/// const GIT_FILTER: FilterRule = FilterRule::new(&["From "]);
/// exec!(filter=&GIT_FILTER; dir; ["git"]; "fetch")?;
/// ```
#[macro_export]
macro_rules! exec {
    ($($tt:tt)*) => {
        $crate::exec_internal!(@parse_filter $($tt)*)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! exec_internal {
    // Parse filter argument
    (@parse_filter filter=$filter:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root $filter; $($rest)*)
    };
    (@parse_filter $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root &$crate::utils::exec::EMPTY_FILTER; $($rest)*)
    };

    // Parse root and command (with root)
    (@parse_root $filter:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
        )
    };
    // Parse command (without root)
    (@parse_root $filter:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
        )
    };
}

// ============================================================================
// Argument Conversion
// ============================================================================

#[doc(hidden)]
#[allow(clippy::wildcard_imports)] // Needed for macro internal module
pub mod internal {
    use super::*;

    /// Convert to `OsString`.
    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    /// Trait for converting to command vector.
    pub trait ToCmd {
        fn to_cmd(self) -> Vec<OsString>;
    }

    impl<const N: usize> ToCmd for [&str; N] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.into_iter().map(OsString::from).collect()
        }
    }

    /// Git invocation with leading `-c key=value` options already attached.
    impl ToCmd for &Vec<OsString> {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.clone()
        }
    }

    /// Convert command to Vec<OsString>.
    #[inline]
    pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
        cmd.to_cmd()
    }

    /// Filter out empty args.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    filter: &'static FilterRule,
) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output, filter)?;
    Ok(output)
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);
    // Never block on an interactive credential prompt inside the refresh loop.
    command.env("GIT_TERMINAL_PROMPT", "0");

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

/// Filter rule for skipping known noise lines.
///
/// Git reports progress and routine notices on stderr even when it succeeds;
/// these rules keep that chatter out of the log.
pub struct FilterRule {
    /// Prefixes to match at the start of output lines.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    /// Create a new filter rule with the given prefixes.
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    /// Returns true if the line is empty or starts with any skip prefix.
    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Lines that survive the filter, ANSI codes removed.
    fn keep(&self, output: &str) -> Vec<String> {
        output
            .lines()
            .map(|line| strip_ansi(line).trim().to_owned())
            .filter(|line| !self.should_skip(line))
            .collect()
    }

    /// Log surviving output lines under the command name.
    fn log(&self, name: &str, output: &str) {
        let lines = self.keep(output);
        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Empty filter (no skipping).
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Log command output, filtering known noise.
fn log_output(name: &str, output: &Output, filter: &'static FilterRule) -> Result<()> {
    if !output.status.success() {
        anyhow::bail!(format_error(name, output, filter));
    }

    // On success, only log stderr (warnings) to reduce noise
    let stderr = String::from_utf8_lossy(&output.stderr);
    filter.log(name, stderr.trim());

    Ok(())
}

/// Format command error message with filtering.
fn format_error(name: &str, output: &Output, filter: &'static FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines = filter.keep(&stderr);

    let mut msg = format!("Command `{name}` failed with {}", output.status);
    if !lines.is_empty() {
        msg.push('\n');
        msg.push_str(&lines.join("\n"));
    }
    msg
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::exec::internal::*;

    #[test]
    fn test_to_cmd_vec_array() {
        let cmd = to_cmd_vec(["git", "status"]);
        assert_eq!(cmd, vec![OsString::from("git"), OsString::from("status")]);
    }

    #[test]
    fn test_to_cmd_vec_prefixed() {
        let base = vec![OsString::from("git"), OsString::from("-c"), OsString::from("a=b")];
        let cmd = to_cmd_vec(&base);
        assert_eq!(cmd.len(), 3);
        assert_eq!(cmd[2], OsString::from("a=b"));
    }

    #[test]
    fn test_filter_args() {
        let args = [OsString::from("a"), OsString::from(""), OsString::from("b")];
        let filtered = filter_args(&args);
        assert_eq!(filtered, vec![OsString::from("a"), OsString::from("b")]);
    }

    #[test]
    fn test_prepare_empty() {
        assert!(prepare(None, &[], &[]).is_err());
    }

    #[test]
    fn test_filter_rule_keep() {
        static FILTER: FilterRule = FilterRule::new(&["Cloning into", "From "]);
        let kept = FILTER.keep("Cloning into 'x'...\n\nwarning: shallow\nFrom https://h/r\n");
        assert_eq!(kept, vec!["warning: shallow".to_string()]);
    }

    #[test]
    fn test_format_error_hides_args() {
        let status = Command::new("false").status().unwrap();
        let output = Output {
            status,
            stdout: Vec::new(),
            stderr: b"fatal: repository not found".to_vec(),
        };
        let msg = format_error("git", &output, &EMPTY_FILTER);

        assert!(msg.starts_with("Command `git` failed"));
        assert!(msg.contains("fatal: repository not found"));
    }

    #[test]
    fn test_exec_failure_is_error() {
        let result = exec!(["git"]; "definitely-not-a-git-command");
        assert!(result.is_err());
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("Plain text"), "Plain text");
    }
}
