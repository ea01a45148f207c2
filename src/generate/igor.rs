//! Command line interface of the IGoR simulator
use crate::shared::errors::{Error, Result};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const GENERATED_SEQS_FILE: &str = "generated_seqs_noerr.csv";
pub const GENERATED_REALIZATIONS_FILE: &str = "generated_realizations_noerr.csv";

/// One IGoR command line option with its values
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IgorCommand {
    SetWd(PathBuf),
    Threads(usize),
    SetCustomModel { parameters: PathBuf, marginals: PathBuf },
    Generate { count: usize, noerr: bool },
}

impl IgorCommand {
    pub fn args(&self) -> Vec<String> {
        match self {
            IgorCommand::SetWd(dir) => vec!["-set_wd".to_string(), dir.display().to_string()],
            IgorCommand::Threads(n) => vec!["-threads".to_string(), n.to_string()],
            IgorCommand::SetCustomModel {
                parameters,
                marginals,
            } => vec![
                "-set_custom_model".to_string(),
                parameters.display().to_string(),
                marginals.display().to_string(),
            ],
            IgorCommand::Generate { count, noerr } => {
                let mut args = vec!["-generate".to_string(), count.to_string()];
                if *noerr {
                    args.push("--noerr".to_string());
                }
                args
            }
        }
    }
}

pub struct IgorInterface {
    executable: String,
    commands: Vec<IgorCommand>,
}

impl fmt::Display for IgorInterface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.executable, self.args().join(" "))
    }
}

impl IgorInterface {
    pub fn new(executable: &str, commands: Vec<IgorCommand>) -> IgorInterface {
        IgorInterface {
            executable: executable.to_string(),
            commands,
        }
    }

    pub fn args(&self) -> Vec<String> {
        self.commands.iter().flat_map(|c| c.args()).collect()
    }

    /// Run the simulator and wait for it. The standard output is logged,
    /// a non-zero exit status is an error carrying the standard error.
    pub fn call(&self) -> Result<()> {
        log::info!("Running {}", self);
        let output = Command::new(&self.executable)
            .args(self.args())
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    Error::SimulatorNotFound(self.executable.clone())
                } else {
                    Error::Io(e)
                }
            })?;
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("igor: {}", line);
        }
        if !output.status.success() {
            return Err(Error::Simulator {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }
        Ok(())
    }
}

/// Tables written by a `generate --noerr` run
pub fn generated_tables(generated_dir: &Path) -> (PathBuf, PathBuf) {
    (
        generated_dir.join(GENERATED_SEQS_FILE),
        generated_dir.join(GENERATED_REALIZATIONS_FILE),
    )
}
