//! Run configuration, passed explicitly to every pipeline entry point
use crate::shared::io::CANONICAL_SEPARATOR;
use std::env;
use std::path::PathBuf;

pub const IGOR_EXECUTABLE_ENV: &str = "IGOR_EXECUTABLE";

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Where the simulator works and where input files are copied
    pub working_dir: PathBuf,
    /// Where the final table is written
    pub output_dir: PathBuf,
    /// Separator of the user files (anchors) and of the output table
    pub separator: u8,
    /// Forwarded to the simulator, never used by the crate itself
    pub threads: usize,
    pub output_name: Option<String>,
    pub seed: Option<u64>,
    pub igor_executable: String,
    /// Directory holding the pre-installed models (and their models.json)
    pub model_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> PipelineConfig {
        let working_dir = PathBuf::from("vdjgen");
        PipelineConfig {
            output_dir: working_dir.clone(),
            working_dir,
            separator: CANONICAL_SEPARATOR,
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            output_name: None,
            seed: None,
            igor_executable: env::var(IGOR_EXECUTABLE_ENV).unwrap_or_else(|_| "igor".to_string()),
            model_dir: PathBuf::from("models"),
        }
    }
}

impl PipelineConfig {
    /// Directory where the simulator writes its generated tables
    pub fn generated_dir(&self) -> PathBuf {
        self.working_dir.join("generated")
    }

    /// Directory where the user anchor files are copied
    pub fn anchors_dir(&self) -> PathBuf {
        self.working_dir.join("cdr3_anchors")
    }
}
