use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use vdjgen::{generate_cdr3, generate_full_length, ChainType, GeneType, ModelSpec, PipelineConfig};

#[derive(Parser, Debug)]
#[command(
    name = "vdjgen",
    version,
    about = "Generate V(D)J recombined sequences from IGoR models"
)]
struct Cli {
    /// Separator of the anchor files and of the output table
    #[arg(long, default_value_t = ',')]
    separator: char,
    /// Number of threads given to IGoR (default: all of them)
    #[arg(long)]
    threads: Option<usize>,
    /// Parent of the working directory (a "vdjgen" directory is created in it)
    #[arg(long = "set-wd", value_name = "DIR")]
    set_wd: Option<PathBuf>,
    /// Name of the output file (without extension)
    #[arg(long = "out-name", value_name = "NAME")]
    out_name: Option<String>,
    /// Directory of the pre-installed models
    #[arg(long, value_name = "DIR", default_value = "models")]
    model_dir: PathBuf,
    /// IGoR executable
    #[arg(long, value_name = "PATH")]
    igor: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate sequences (full-length with IGoR, or CDR3 only)
    GenerateSeqs {
        /// Pre-installed model
        #[arg(long, value_enum, required_unless_present = "custom_model", conflicts_with = "custom_model")]
        model: Option<InstalledModel>,
        /// Custom model files
        #[arg(long, num_args = 2, value_names = ["PARAMS", "MARGINALS"], requires = "chain")]
        custom_model: Option<Vec<PathBuf>>,
        /// Chain of the custom model (alpha, beta, light, heavy)
        #[arg(long = "type", value_name = "CHAIN")]
        chain: Option<ChainType>,
        /// CDR3 anchor file of the custom model, for the V or J genes
        #[arg(long, num_args = 2, value_names = ["GENE", "FILE"], action = clap::ArgAction::Append)]
        anchor: Vec<String>,
        /// Number of sequences to generate
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        generate: u64,
        /// Generate CDR3 sequences only, without IGoR
        #[arg(long)]
        cdr3: bool,
        /// Seed of the CDR3 sampler
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum InstalledModel {
    TutorialModel,
    HumanTAlpha,
    HumanTBeta,
    HumanBHeavy,
    MouseTBeta,
}

impl InstalledModel {
    fn id(&self) -> &'static str {
        match self {
            InstalledModel::TutorialModel => "tutorial-model",
            InstalledModel::HumanTAlpha => "human-t-alpha",
            InstalledModel::HumanTBeta => "human-t-beta",
            InstalledModel::HumanBHeavy => "human-b-heavy",
            InstalledModel::MouseTBeta => "mouse-t-beta",
        }
    }
}

fn parse_anchors(values: &[String]) -> Result<Vec<(GeneType, PathBuf)>> {
    values
        .chunks(2)
        .map(|pair| match pair {
            [gene, file] => {
                let gene_type = GeneType::from_str(gene)
                    .with_context(|| format!("Invalid --anchor gene {}", gene))?;
                if gene_type == GeneType::D {
                    bail!("CDR3 anchors are only defined for the V and J genes");
                }
                Ok((gene_type, PathBuf::from(file)))
            }
            _ => bail!("--anchor expects a gene (V or J) and a file"),
        })
        .collect()
}

fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::default();
    if let Some(dir) = &cli.set_wd {
        config.working_dir = dir.join("vdjgen");
        config.output_dir = config.working_dir.clone();
    }
    if !cli.separator.is_ascii() {
        bail!("The separator must be a single ASCII character");
    }
    config.separator = cli.separator as u8;
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }
    if let Some(igor) = &cli.igor {
        config.igor_executable = igor.clone();
    }
    config.output_name = cli.out_name.clone();
    config.model_dir = cli.model_dir.clone();
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = build_config(&cli)?;

    match &cli.command {
        Commands::GenerateSeqs {
            model,
            custom_model,
            chain,
            anchor,
            generate,
            cdr3,
            seed,
        } => {
            config.seed = *seed;
            let spec = match (model, custom_model, chain) {
                (Some(m), _, _) => ModelSpec::Bundle(m.id().to_string()),
                (None, Some(files), Some(chain)) => {
                    let anchors = parse_anchors(anchor)?;
                    if *cdr3 && anchors.is_empty() {
                        bail!("--anchor V FILE and --anchor J FILE are required to generate CDR3s from a custom model");
                    }
                    ModelSpec::Custom {
                        chain: *chain,
                        parameters: files[0].clone(),
                        marginals: files[1].clone(),
                        anchors,
                    }
                }
                _ => bail!("Select a model with --model, or --custom-model with --type"),
            };
            let count = *generate as usize;

            let path = if *cdr3 {
                generate_cdr3(&spec, count, &config).context("CDR3 generation failed")?
            } else {
                generate_full_length(&spec, count, &config)
                    .context("Full-length sequence generation failed")?
            };
            log::info!("Generated sequences written to {}", path.display());
        }
    }
    Ok(())
}
