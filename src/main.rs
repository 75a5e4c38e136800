//! Command-line front end: `encode`, `decode` and `analyze` over files.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use cabac_codec::{analyze, decode_bytes, encode_bytes, CandidateConfig, Configuration};

#[derive(Parser, Debug)]
#[command(name = "cabac-codec", about = "Context-adaptive arithmetic coding with configuration search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// One of: trace, debug, info, warning, error, fatal.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a file under an existing configuration.
    Encode {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Configuration JSON to encode with.
        #[arg(long)]
        config: PathBuf,
    },
    /// Decode a bytestream back into the original file.
    Decode {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Configuration JSON the bytestream was encoded with.
        #[arg(long)]
        config: PathBuf,
    },
    /// Search for the smallest configuration, then encode with it.
    Analyze {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Where to write the discovered configuration JSON.
        #[arg(long)]
        config: PathBuf,
    },
}

fn init_logging(level: &str) -> Result<()> {
    let verbosity = match level {
        "trace" => 4,
        "debug" => 3,
        "info" => 2,
        "warning" => 1,
        "error" | "fatal" => 0,
        other => bail!("unknown log level: {}", other),
    };
    stderrlog::new().verbosity(verbosity).init()?;
    Ok(())
}

fn run(command: &Command) -> Result<()> {
    match command {
        Command::Encode { input, output, config } => {
            let buffer = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let json = fs::read_to_string(config)
                .with_context(|| format!("reading {}", config.display()))?;
            let configuration = Configuration::from_json(&json)?;
            let bytestream = encode_bytes(&configuration, &buffer)?;
            fs::write(output, &bytestream)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(
                "wrote bytestream of size {} to {}",
                bytestream.len(),
                output.display()
            );
        }
        Command::Decode { input, output, config } => {
            let bytestream = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let json = fs::read_to_string(config)
                .with_context(|| format!("reading {}", config.display()))?;
            let configuration = Configuration::from_json(&json)?;
            let buffer = decode_bytes(&configuration, &bytestream)?;
            fs::write(output, &buffer)
                .with_context(|| format!("writing {}", output.display()))?;
            info!("wrote buffer of size {} to {}", buffer.len(), output.display());
        }
        Command::Analyze { input, output, config } => {
            let buffer = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
            let (configuration, _) = analyze(&buffer, &CandidateConfig::default())?;
            let bytestream = encode_bytes(&configuration, &buffer)?;
            fs::write(output, &bytestream)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(
                "wrote smallest bytestream of size {} to {}",
                bytestream.len(),
                output.display()
            );
            fs::write(config, configuration.to_json()?)
                .with_context(|| format!("writing {}", config.display()))?;
            info!("wrote best configuration to {}", config.display());
            log::debug!("with configuration:\n{}", configuration);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }
    match run(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
