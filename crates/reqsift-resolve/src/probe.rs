use crate::{PackageProbe, ResolvedPackage};
use std::io::ErrorKind;
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("`{command}` is not installed or not on the PATH")]
    ToolUnavailable { command: String },
    #[error("`{command} show {name}` exited with a failure status")]
    CommandFailed {
        command: String,
        name: String,
        status: Option<i32>,
    },
    #[error("failed running `{command} show {name}`: {source}")]
    Io {
        command: String,
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Queries the external package manager with `<command> show <name>` and
/// hands back its raw stdout. The command is overridable so callers can
/// point at `pip3`, a venv pip, or a stand-in during tests.
#[derive(Debug, Clone)]
pub struct PipShowProbe {
    command: String,
}

impl PipShowProbe {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl PackageProbe for PipShowProbe {
    fn show(&self, import_name: &str) -> Result<String, ProbeError> {
        let output = Command::new(&self.command)
            .args(["show", import_name])
            .output()
            .map_err(|source| {
                if source.kind() == ErrorKind::NotFound {
                    ProbeError::ToolUnavailable {
                        command: self.command.clone(),
                    }
                } else {
                    ProbeError::Io {
                        command: self.command.clone(),
                        name: import_name.to_string(),
                        source,
                    }
                }
            })?;

        if !output.status.success() {
            return Err(ProbeError::CommandFailed {
                command: self.command.clone(),
                name: import_name.to_string(),
                status: output.status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Pick the authoritative name and version out of `show` output.
///
/// Both lines present: the tool's name wins, even when it differs from the
/// query. Version only: assume the query name maps to itself. Anything less
/// is not a confident answer.
pub fn parse_show_output(stdout: &str, query: &str) -> Option<ResolvedPackage> {
    let field = |prefix: &str| {
        stdout
            .lines()
            .find_map(|line| line.strip_prefix(prefix))
            .map(|value| value.trim().to_string())
    };

    match (field("Name:"), field("Version:")) {
        (Some(name), version @ Some(_)) => Some(ResolvedPackage { name, version }),
        (None, Some(version)) => Some(ResolvedPackage {
            name: query.to_string(),
            version: Some(version),
        }),
        _ => None,
    }
}
