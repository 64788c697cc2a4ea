//! System package-manager installs (Linux)
//!
//! The whole dependency group goes through one non-interactive command.

use crate::core::error::{Result, SetupError};
use crate::core::output;
use std::process::{Command, Stdio};

/// Installs a list of OS packages in one step.
pub trait PackageManager {
    fn name(&self) -> &str;
    fn install(&self, packages: &[String]) -> Result<()>;
}

/// `apt-get install -y`, optionally through `sudo`.
#[derive(Debug, Clone)]
pub struct Apt {
    program: String,
    use_sudo: bool,
}

impl Apt {
    pub fn new(use_sudo: bool) -> Self {
        Self {
            program: "apt-get".to_string(),
            use_sudo,
        }
    }

    /// Run a different executable in place of `apt-get`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Full argv for installing `packages`.
    pub fn command_line(&self, packages: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(packages.len() + 4);
        if self.use_sudo {
            argv.push("sudo".to_string());
        }
        argv.push(self.program.clone());
        argv.push("install".to_string());
        argv.push("-y".to_string());
        argv.extend(packages.iter().cloned());
        argv
    }
}

impl PackageManager for Apt {
    fn name(&self) -> &str {
        "apt"
    }

    fn install(&self, packages: &[String]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }

        let argv = self.command_line(packages);
        let cmd = argv.join(" ");
        output::detail(&cmd);

        // stdin stays attached so sudo can ask for a password.
        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdin(Stdio::inherit())
            .status()
            .map_err(|e| {
                output::error(&format!("{} failed to start: {}", argv[0], e));
                SetupError::PackageManager {
                    cmd: cmd.clone(),
                    code: None,
                }
            })?;

        if !status.success() {
            return Err(SetupError::PackageManager {
                cmd,
                code: status.code(),
            });
        }

        Ok(())
    }
}
