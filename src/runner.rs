//! Child process execution for scripts.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Number of trailing stderr lines shown when a captured run fails.
pub const SUMMARY_LINES: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Child shares the terminal.
    Interactive,
    /// Child output is buffered for display afterwards.
    Captured,
}

/// Result of a captured run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRun {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedRun {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last lines of trimmed stderr. Empty for successful runs.
    pub fn error_summary(&self) -> Vec<&str> {
        if self.success() {
            return Vec::new();
        }
        let lines: Vec<&str> = self.stderr.trim().lines().collect();
        let start = lines.len().saturating_sub(SUMMARY_LINES);
        lines[start..].to_vec()
    }
}

/// Starts scripts through a configured interpreter, by argument list.
#[derive(Clone, Debug)]
pub struct ScriptRunner {
    interpreter: Vec<String>,
}

impl ScriptRunner {
    /// `interpreter` may carry extra arguments (`python3 -u`). An empty value
    /// runs the script file itself.
    pub fn new(interpreter: &str) -> Self {
        Self {
            interpreter: interpreter.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn command(&self, script: &Path) -> Command {
        match self.interpreter.split_first() {
            Some((program, args)) => {
                let mut cmd = Command::new(program);
                cmd.args(args).arg(script);
                cmd
            }
            None => Command::new(script),
        }
    }

    /// Runs the script attached to the current terminal and waits for it.
    pub fn run_interactive(&self, script: &Path) -> Result<Option<i32>> {
        tracing::info!("Running {} interactively", script.display());
        let status = self
            .command(script)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to launch {}", script.display()))?;
        tracing::info!("{} exited with {:?}", script.display(), status.code());
        Ok(status.code())
    }

    /// Runs the script with stdout and stderr captured. Stdin is closed so a
    /// prompt for input ends the script instead of waiting unseen.
    pub fn run_captured(&self, script: &Path) -> Result<CapturedRun> {
        tracing::info!("Running {} with captured output", script.display());
        let output = self
            .command(script)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to launch {}", script.display()))?;
        let run = CapturedRun {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::info!("{} exited with {:?}", script.display(), run.code);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(stderr: &str) -> CapturedRun {
        CapturedRun {
            code: Some(1),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn summary_keeps_last_ten_lines() {
        let stderr: String = (1..=15).map(|n| format!("line {n}\n")).collect();
        let run = failed(&stderr);
        let summary = run.error_summary();
        assert_eq!(summary.len(), 10);
        assert_eq!(summary[0], "line 6");
        assert_eq!(summary[9], "line 15");
    }

    #[test]
    fn summary_ignores_trailing_blank_lines() {
        let run = failed("Traceback\n  boom\nValueError: bad\n\n\n");
        assert_eq!(run.error_summary(), vec!["Traceback", "  boom", "ValueError: bad"]);
    }

    #[test]
    fn successful_run_has_no_summary() {
        let run = CapturedRun {
            code: Some(0),
            stdout: "OK\n".into(),
            stderr: "warning: noisy\n".into(),
        };
        assert!(run.success());
        assert!(run.error_summary().is_empty());
    }

    #[test]
    fn killed_run_is_not_success() {
        let run = CapturedRun {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(!run.success());
    }

    #[test]
    fn command_uses_interpreter_arguments() {
        let runner = ScriptRunner::new("python3 -u");
        let cmd = runner.command(Path::new("/hub/games/rps.py"));
        assert_eq!(cmd.get_program(), "python3");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, vec!["-u", "/hub/games/rps.py"]);
    }

    #[test]
    fn empty_interpreter_runs_file_directly() {
        let runner = ScriptRunner::new("  ");
        let cmd = runner.command(Path::new("/hub/tools/run.py"));
        assert_eq!(cmd.get_program(), "/hub/tools/run.py");
        assert_eq!(cmd.get_args().count(), 0);
    }

    #[test]
    fn missing_interpreter_is_an_error() {
        let runner = ScriptRunner::new("definitely-not-an-interpreter-xyz");
        let err = runner.run_captured(Path::new("x.py")).unwrap_err();
        assert!(err.to_string().contains("Failed to launch"));
    }
}
