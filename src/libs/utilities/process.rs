// External process execution.
//
// Every shell-out of the installer (package managers, useradd, venv, pip,
// ansible-galaxy, ssh-keygen...) goes through `CommandRunner`. The host runner
// always captures stdout and stderr so that a failing invocation can carry its
// output into the error instead of requiring a verbose re-run.

use crate::log_debug;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    /// Adds a path argument. Paths are passed lossily; the installer only
    /// deals with UTF-8 paths it builds itself or receives on the command line.
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().into_owned();
        self.arg(arg)
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Renders the invocation the way it would be typed in a shell.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Exit status and combined output of a finished invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub output: String,
}

impl CommandOutput {
    /// Describes a failed invocation: exit code plus whatever it printed.
    pub fn failure_reason(&self) -> String {
        let code = self
            .code
            .map_or_else(|| "signal".to_string(), |c| c.to_string());
        let output = self.output.trim();
        if output.is_empty() {
            format!("exit status {code}")
        } else {
            format!("exit status {code}, output: {output}")
        }
    }
}

/// Abstraction over spawning programs so the bootstrap sequence can be
/// exercised without touching the host.
pub trait CommandRunner {
    /// Runs the invocation to completion. `Err` only when the program could not
    /// be spawned; a non-zero exit is reported through `CommandOutput::success`.
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput>;

    /// Whether `program` resolves to an executable on the search path.
    fn program_available(&self, program: &str) -> bool;

    /// Whether `path` exists on the host filesystem.
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Runs an invocation and folds spawn failures and non-zero exits into a
/// single textual reason, which callers wrap in their own error kind.
pub fn run_checked(runner: &dyn CommandRunner, invocation: &Invocation) -> Result<String, String> {
    log_debug!("[Process] Executing: {}", invocation.display());
    match runner.run(invocation) {
        Ok(out) if out.success => {
            if !out.output.trim().is_empty() {
                log_debug!("[Process] Output of '{}':\n{}", invocation.program, out.output.trim_end());
            }
            Ok(out.output)
        }
        Ok(out) => Err(format!("'{}' failed with {}", invocation.display(), out.failure_reason())),
        Err(e) => Err(format!("cannot execute '{}': {}", invocation.program, e)),
    }
}

/// The real runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        let mut command = Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }
        let output = command.output()?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            output: combined,
        })
    }

    fn program_available(&self, program: &str) -> bool {
        find_on_path(program).is_some()
    }
}

/// Looks `program` up in the directories of `PATH`, like a shell would.
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
