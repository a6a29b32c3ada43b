use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SetupError;

#[derive(Debug, Clone)]
pub struct GeneratorOutput {
    pub stdout: String,
    pub stderr: String,
}

pub trait GeneratorClient: Send + Sync {
    fn generate(&self, script: &Path) -> Result<GeneratorOutput, SetupError>;
}

/// Runs the project-file generator as a child process. An optional launcher
/// (e.g. an interpreter) can front the script; by default the script is
/// invoked directly.
#[derive(Debug, Clone, Default)]
pub struct SystemGenerator {
    launcher: Option<PathBuf>,
}

impl SystemGenerator {
    pub fn new(launcher: Option<PathBuf>) -> Self {
        Self { launcher }
    }
}

impl GeneratorClient for SystemGenerator {
    fn generate(&self, script: &Path) -> Result<GeneratorOutput, SetupError> {
        if !script.exists() {
            return Err(SetupError::GeneratorMissing(script.to_path_buf()));
        }

        let mut cmd = match &self.launcher {
            Some(launcher) => {
                let mut cmd = Command::new(launcher);
                cmd.arg(script);
                cmd
            }
            None => Command::new(script),
        };

        tracing::debug!(script = %script.display(), "launching project generator");
        let output = cmd
            .output()
            .map_err(|err| SetupError::GeneratorSpawn(err.to_string()))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(SetupError::GeneratorExit { status, stderr });
        }

        Ok(GeneratorOutput { stdout, stderr })
    }
}
