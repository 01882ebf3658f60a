//! Thin async wrapper around the `kubectl` binary.
//!
//! Every invocation runs under a timeout and is killed if it overruns.
//! A non-zero exit is reported with its stderr; nothing is retried here.

use std::process::Stdio;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::{debug, info};

use kubeward_core::config::{KubectlConfig, duration_field};

use crate::error::{SetupError, SourceError, SourceResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kubectl {
    binary: String,
    context: Option<String>,
    timeout: Duration,
}

impl Kubectl {
    pub fn new(binary: &str, context: Option<&str>, timeout: Duration) -> Self {
        Self {
            binary: binary.to_string(),
            context: context.map(str::to_string),
            timeout,
        }
    }

    /// Build a client from config and check the binary actually runs.
    ///
    /// This is the setup step: failure here aborts the process before any
    /// polling starts.
    pub async fn connect(config: &KubectlConfig) -> Result<Self, SetupError> {
        let timeout = duration_field("kubectl.timeout", &config.timeout)?;
        let kubectl = Self::new(&config.binary, config.context.as_deref(), timeout);

        kubectl
            .run(&["version", "--client", "-o", "json"])
            .await
            .map_err(SetupError::Kubectl)?;

        info!(binary = %kubectl.binary, context = ?kubectl.context, "kubectl client ready");
        Ok(kubectl)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full argument list for an invocation, including `--context`.
    fn args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(ctx) = &self.context {
            full.push("--context");
            full.push(ctx.as_str());
        }
        full.extend_from_slice(args);
        full
    }

    /// Run `kubectl <args>` and return stdout.
    pub async fn run(&self, args: &[&str]) -> SourceResult<Vec<u8>> {
        let args = self.args(args);
        debug!(binary = %self.binary, ?args, "running kubectl");

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
            .map_err(|source| SourceError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                program: self.binary.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    /// Run `kubectl <args>` and parse stdout as JSON.
    pub async fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> SourceResult<T> {
        let stdout = self.run(args).await?;
        Ok(serde_json::from_slice(&stdout)?)
    }
}
