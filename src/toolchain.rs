//! External Swift toolchain collaborator.
//!
//! Everything that shells out lives behind the [`Toolchain`] trait so the
//! rest of the crate, and every test, can run without a Swift install.
//! Invocations are blocking; build-validation calls enforce a fixed
//! 60-second wall-clock cutoff, after which whatever output was captured is
//! treated as the complete output. There is no retry and no cancellation.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Wall-clock cutoff for build-validation invocations.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(60);

/// Exit status recorded when a child had to be killed at the cutoff.
pub const KILLED_STATUS: i32 = -1;

/// Flag set appended for the macro-validation-skipping comparison build.
pub const SKIP_MACRO_VALIDATION_FLAGS: &str = "-Xswiftc -skipMacroValidation";

/// Captured output of one toolchain invocation.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Stdout and stderr concatenated, stdout first.
    pub fn combined(&self) -> String {
        let mut out = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        out
    }
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to invoke {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read toolchain output: {0}")]
    Capture(#[from] std::io::Error),
}

/// Interface to the external Swift toolchain.
pub trait Toolchain {
    /// Run `swift package <args>` with the working directory set to the
    /// package root. Stdout and stderr are captured separately; exit code 0
    /// is success.
    fn package(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, ToolchainError>;

    /// Run `swift build` under the fixed wall-clock cutoff. On timeout the
    /// partial output is the output; the status records the kill.
    fn build(&self, dir: &Path) -> Result<CommandOutput, ToolchainError>;

    /// Run two full builds through the shell, without and with the
    /// macro-validation-skipping flags, returning each one's combined
    /// output.
    fn comparative_macro_builds(&self, dir: &Path) -> Result<(String, String), ToolchainError>;
}

/// The real `swift` binary.
pub struct SwiftToolchain {
    binary: String,
}

impl SwiftToolchain {
    pub fn new() -> Self {
        Self {
            binary: "swift".to_string(),
        }
    }

    /// Use a different binary name, e.g. a versioned toolchain shim.
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for SwiftToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Toolchain for SwiftToolchain {
    fn package(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, ToolchainError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("package").args(args).current_dir(dir);
        run_to_completion(cmd, &format!("{} package", self.binary))
    }

    fn build(&self, dir: &Path) -> Result<CommandOutput, ToolchainError> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("build").current_dir(dir);
        run_with_timeout(cmd, &format!("{} build", self.binary), BUILD_TIMEOUT)
    }

    fn comparative_macro_builds(&self, dir: &Path) -> Result<(String, String), ToolchainError> {
        let base = self.shell_build(dir, "")?;
        let skipped = self.shell_build(dir, SKIP_MACRO_VALIDATION_FLAGS)?;
        Ok((base.combined(), skipped.combined()))
    }
}

impl SwiftToolchain {
    fn shell_build(&self, dir: &Path, extra_flags: &str) -> Result<CommandOutput, ToolchainError> {
        let script = if extra_flags.is_empty() {
            format!("{} build 2>&1", self.binary)
        } else {
            format!("{} build {} 2>&1", self.binary, extra_flags)
        };
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&script).current_dir(dir);
        run_with_timeout(cmd, &script, BUILD_TIMEOUT)
    }
}

fn run_to_completion(mut cmd: Command, label: &str) -> Result<CommandOutput, ToolchainError> {
    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ToolchainError::Spawn {
            command: label.to_string(),
            source,
        })?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status.code().unwrap_or(KILLED_STATUS),
    })
}

fn run_with_timeout(
    mut cmd: Command,
    label: &str,
    timeout: Duration,
) -> Result<CommandOutput, ToolchainError> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ToolchainError::Spawn {
            command: label.to_string(),
            source,
        })?;

    // Drain the pipes on background threads so a chatty build can't fill
    // the pipe buffer and deadlock against our wait loop.
    let stdout_handle = spawn_reader(child.stdout.take());
    let stderr_handle = spawn_reader(child.stderr.take());

    let status = wait_with_deadline(&mut child, timeout)?;

    let stdout = stdout_handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default();
    let stderr = stderr_handle
        .map(|h| h.join().unwrap_or_default())
        .unwrap_or_default();

    Ok(CommandOutput {
        stdout,
        stderr,
        status,
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    source: Option<R>,
) -> Option<std::thread::JoinHandle<String>> {
    source.map(|mut r| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).to_string()
        })
    })
}

fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<i32, ToolchainError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status.code().unwrap_or(KILLED_STATUS));
        }
        if Instant::now() >= deadline {
            // Cutoff reached: kill and fall through to collect partial
            // output. The killed status is not distinguished further.
            let _ = child.kill();
            let _ = child.wait();
            return Ok(KILLED_STATUS);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
