//! Executes CLI services as child processes.
//!
//! - argv passed directly (no shell interpretation)
//! - working directory is the executable's parent
//! - optional JSON payload on stdin
//! - killed when the timeout elapses or the future is dropped
//! - stdout/stderr capped at `max_output_bytes` each

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use cn_protocol::calls::CliService;
use cn_protocol::cli::CliResponse;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Captured result of one CLI invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    /// -1 when the process was terminated by a signal.
    pub exit_code: i32,
    /// stdout decoded as JSON when it looks like JSON and parses.
    pub parsed_output: Option<Value>,
    pub duration_ms: f64,
    pub truncated: bool,
}

impl CliOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl From<CliOutput> for CliResponse {
    fn from(output: CliOutput) -> Self {
        CliResponse {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.exit_code,
            duration_ms: output.duration_ms,
            parsed_output: output.parsed_output,
        }
    }
}

/// Locates and runs the known CLI services.
pub struct CliManager {
    paths: HashMap<CliService, PathBuf>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl CliManager {
    /// Resolve every service path once, up front.
    pub fn new(config: &CliConfig) -> Self {
        let root = config.resolved_root();
        let paths = CliService::ALL
            .iter()
            .map(|&service| (service, root.join(service.executable_name())))
            .collect();
        Self {
            paths,
            timeout: config.timeout(),
            max_output_bytes: config.max_output_bytes,
        }
    }

    pub fn path_for(&self, service: CliService) -> &Path {
        &self.paths[&service]
    }

    pub fn is_service_available(&self, service: CliService) -> bool {
        self.path_for(service).exists()
    }

    pub fn list_available_services(&self) -> Vec<CliService> {
        CliService::ALL
            .into_iter()
            .filter(|&s| self.is_service_available(s))
            .collect()
    }

    /// Run `command` with `args` (argv = `[command, args...]`).
    pub async fn execute_command(
        &self,
        service: CliService,
        command: &str,
        args: &[String],
        input: Option<&Value>,
    ) -> CliResult<CliOutput> {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(command.to_string());
        argv.extend_from_slice(args);
        self.run(service, &argv, input).await
    }

    /// Run the service executable with a pre-built argv.
    pub async fn run(
        &self,
        service: CliService,
        argv: &[String],
        input: Option<&Value>,
    ) -> CliResult<CliOutput> {
        let path = self.path_for(service);
        if !path.exists() {
            return Err(CliError::ServiceNotFound {
                service,
                path: path.to_path_buf(),
            });
        }

        tracing::info!(
            service = %service,
            args = ?argv,
            path = %path.display(),
            "executing CLI command"
        );

        let mut cmd = Command::new(path);
        cmd.args(argv)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(parent) = path.parent() {
            cmd.current_dir(parent);
        }

        let started = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|source| CliError::Spawn { service, source })?;

        // stdin feed and output collection run concurrently, both under the timeout
        let stdin = child.stdin.take();
        let payload = input.map(Value::to_string);
        let feed = async move {
            if let (Some(payload), Some(mut stdin)) = (payload, stdin) {
                if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                    // the child may exit without reading its input
                    tracing::debug!(service = %service, error = %e, "stdin write failed");
                }
            }
        };
        let communicate = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = match tokio::time::timeout(self.timeout, communicate).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(
                    service = %service,
                    timeout_secs = self.timeout.as_secs(),
                    "CLI command timed out"
                );
                return Err(CliError::Timeout {
                    service,
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let (stdout, stdout_cut) = capped(output.stdout, self.max_output_bytes);
        let (stderr, stderr_cut) = capped(output.stderr, self.max_output_bytes);
        let parsed_output = parse_json_output(&stdout);
        let exit_code = output.status.code().unwrap_or(-1);
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        tracing::info!(
            service = %service,
            exit_code,
            stdout_len = stdout.len(),
            stderr_len = stderr.len(),
            duration_ms,
            "CLI command completed"
        );

        Ok(CliOutput {
            stdout,
            stderr,
            exit_code,
            parsed_output,
            duration_ms,
            truncated: stdout_cut || stderr_cut,
        })
    }
}

/// Decode output bytes, cutting them to `max` bytes first.
fn capped(mut bytes: Vec<u8>, max: usize) -> (String, bool) {
    let truncated = bytes.len() > max;
    if truncated {
        bytes.truncate(max);
    }
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if truncated {
        text.push_str("\n... [output truncated]");
    }
    (text, truncated)
}

fn parse_json_output(stdout: &str) -> Option<Value> {
    let trimmed = stdout.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed).ok()
    } else {
        None
    }
}
