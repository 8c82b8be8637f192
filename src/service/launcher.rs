use crate::config::{Config, ServerConfig};
use crate::error::GateError;
use crate::service::readiness::ReadinessGate;
use std::fmt;
use std::process::Command;
use tracing::info;

/// Server invocation started once the gate opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub target: String,
    pub bind: String,
    pub port: u16,
    pub timeout_secs: u64,
    pub workers: u32,
    pub extra_args: Vec<String>,
}

impl From<&ServerConfig> for ServerCommand {
    fn from(cfg: &ServerConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            target: cfg.target.clone(),
            bind: cfg.bind.clone(),
            port: cfg.port,
            timeout_secs: cfg.timeout_secs,
            workers: cfg.workers,
            extra_args: cfg.extra_args.clone(),
        }
    }
}

impl ServerCommand {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// `--bind ADDR:PORT --timeout T --workers W [extra...] TARGET`
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--bind".to_string(),
            self.bind_addr(),
            "--timeout".to_string(),
            self.timeout_secs.to_string(),
            "--workers".to_string(),
            self.workers.to_string(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(self.target.clone());
        args
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());
        cmd
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args() {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Transfers control to the server once the gate is open.
pub trait Handoff {
    fn hand_off(&self, command: &ServerCommand) -> Result<(), GateError>;
}

/// Replaces the current process with the server (`exec`). On platforms
/// without `exec` the server runs as a child and its exit status is reported.
pub struct ExecHandoff;

impl Handoff for ExecHandoff {
    #[cfg(unix)]
    fn hand_off(&self, command: &ServerCommand) -> Result<(), GateError> {
        use std::os::unix::process::CommandExt;

        // only returns on failure
        let err = command.to_command().exec();
        Err(GateError::Handoff(format!(
            "exec {} failed: {err}",
            command.program
        )))
    }

    #[cfg(not(unix))]
    fn hand_off(&self, command: &ServerCommand) -> Result<(), GateError> {
        let status = command
            .to_command()
            .status()
            .map_err(|e| GateError::Handoff(format!("spawn {} failed: {e}", command.program)))?;
        if status.success() {
            Ok(())
        } else {
            Err(GateError::Handoff(format!(
                "{} exited with {status}",
                command.program
            )))
        }
    }
}

pub struct Launcher<H = ExecHandoff> {
    gate: ReadinessGate,
    command: ServerCommand,
    handoff: H,
}

impl Launcher<ExecHandoff> {
    pub fn from_config(cfg: &Config) -> Self {
        let gate = ReadinessGate::new(
            cfg.signal_path(),
            cfg.readiness.poll_interval(),
            cfg.readiness.deadline(),
        );
        Self::new(gate, ServerCommand::from(&cfg.server), ExecHandoff)
    }
}

impl<H: Handoff> Launcher<H> {
    pub fn new(gate: ReadinessGate, command: ServerCommand, handoff: H) -> Self {
        Self {
            gate,
            command,
            handoff,
        }
    }

    pub fn command(&self) -> &ServerCommand {
        &self.command
    }

    /// Wait for the signal, then hand control to the server.
    pub async fn run(mut self) -> Result<(), GateError> {
        self.gate.wait().await?;
        info!(
            signal = %self.gate.signal().display(),
            bind = %self.command.bind_addr(),
            workers = self.command.workers,
            timeout_secs = self.command.timeout_secs,
            "Readiness signal found. Starting server: {}",
            self.command
        );
        self.handoff.hand_off(&self.command)
    }
}
