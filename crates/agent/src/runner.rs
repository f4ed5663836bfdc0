// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container runner seam and its Docker CLI implementation.
//!
//! The agent drives containers through this trait so job-run logic can
//! be exercised with a scripted fake. The real implementation shells
//! out to the `docker` CLI.

use crate::error::AgentError;
use async_trait::async_trait;
use simq_wire::VolumeBinding;
use std::collections::BTreeMap;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

/// Everything needed to start a job container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// Argument string appended after the image, split on whitespace.
    pub command: String,
    pub volumes: Vec<VolumeBinding>,
    pub env: BTreeMap<String, String>,
    /// Attached only when the named network exists on the host.
    pub network: Option<String>,
}

#[async_trait]
pub trait ContainerRunner: Send + Sync {
    /// Pull the image. Callers treat failure as non-fatal (local cache).
    async fn pull(&self, image: &str) -> Result<(), AgentError>;

    /// Force-remove a container by name, ignoring absence.
    async fn remove(&self, name: &str) -> Result<(), AgentError>;

    /// Start a detached container; returns its id.
    async fn start(&self, spec: &ContainerSpec) -> Result<String, AgentError>;

    /// Follow the container's output as lossily-decoded lines. The
    /// channel closes when the container stops producing output.
    async fn follow_logs(&self, container_id: &str) -> Result<mpsc::Receiver<String>, AgentError>;

    /// Block until the container exits; returns its exit code.
    async fn wait(&self, container_id: &str) -> Result<i64, AgentError>;
}

/// [`ContainerRunner`] over the `docker` command line.
#[derive(Clone, Default)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }

    async fn docker(args: &[&str]) -> Result<String, AgentError> {
        let output = tokio::process::Command::new("docker")
            .args(args)
            .output()
            .await
            .map_err(|e| AgentError::runner(format!("failed to exec docker: {e}")))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(AgentError::runner(format!(
                "docker {} failed: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            )))
        }
    }

    async fn network_exists(name: &str) -> bool {
        Self::docker(&["network", "inspect", name]).await.is_ok()
    }

    fn run_args(spec: &ContainerSpec, network: Option<&str>, gpus: bool) -> Vec<String> {
        let mut args: Vec<String> =
            vec!["run".into(), "-d".into(), "--name".into(), spec.name.clone()];
        if let Some(net) = network {
            args.push("--network".into());
            args.push(net.to_string());
        }
        if gpus {
            args.push("--gpus".into());
            args.push("all".into());
        }
        for v in &spec.volumes {
            args.push("-v".into());
            args.push(format!("{}:{}:{}", v.host, v.container, v.mode));
        }
        for (key, value) in &spec.env {
            args.push("-e".into());
            args.push(format!("{key}={value}"));
        }
        args.push(spec.image.clone());
        args.extend(spec.command.split_whitespace().map(str::to_string));
        args
    }
}

#[async_trait]
impl ContainerRunner for DockerCli {
    async fn pull(&self, image: &str) -> Result<(), AgentError> {
        Self::docker(&["pull", image]).await.map(|_| ())
    }

    async fn remove(&self, name: &str) -> Result<(), AgentError> {
        match Self::docker(&["rm", "-f", name]).await {
            Ok(_) => Ok(()),
            // Removing a container that never existed is a success.
            Err(AgentError::Runner(msg)) if msg.contains("No such container") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn start(&self, spec: &ContainerSpec) -> Result<String, AgentError> {
        let network = match &spec.network {
            Some(name) if Self::network_exists(name).await => Some(name.as_str()),
            _ => None,
        };

        // GPU access is best-effort: hosts without the nvidia runtime
        // reject --gpus, so retry plain.
        let with_gpus = Self::run_args(spec, network, true);
        let args: Vec<&str> = with_gpus.iter().map(String::as_str).collect();
        match Self::docker(&args).await {
            Ok(id) => Ok(id),
            Err(_) => {
                let plain = Self::run_args(spec, network, false);
                let args: Vec<&str> = plain.iter().map(String::as_str).collect();
                Self::docker(&args).await
            }
        }
    }

    async fn follow_logs(&self, container_id: &str) -> Result<mpsc::Receiver<String>, AgentError> {
        let mut child = tokio::process::Command::new("docker")
            .args(["logs", "--follow", container_id])
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| AgentError::runner(format!("failed to follow logs: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::runner("log stream has no stdout"))?;

        let (tx, rx) = mpsc::channel(256);
        tokio::spawn(async move {
            let mut reader = tokio::io::BufReader::new(stdout);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {
                        let line =
                            String::from_utf8_lossy(&buf).trim_end_matches('\n').to_string();
                        if tx.send(line).await.is_err() {
                            break;
                        }
                    }
                }
            }
            let _ = child.wait().await;
        });

        Ok(rx)
    }

    async fn wait(&self, container_id: &str) -> Result<i64, AgentError> {
        let out = Self::docker(&["wait", container_id]).await?;
        out.parse::<i64>()
            .map_err(|_| AgentError::runner(format!("unparseable exit code: {out:?}")))
    }
}
