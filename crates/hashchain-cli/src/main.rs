use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hashchain_core::{
    Chain, ChainConfig, ChainRecord, Difficulty, LedgerError, MiningStrategy, ValidationPolicy,
};
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const DEMO_PAYLOADS: [&str; 3] = ["First block after Genesis", "Second block", "Third block"];

#[derive(Parser, Debug)]
#[command(name = "hashchain")]
#[command(about = "Build, mine and verify a proof-of-work hash chain")]
struct Cli {
    /// JSON chain configuration; flags below override its fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Required leading zero hex digits per mined block (0-64)
    #[arg(long, global = true)]
    difficulty: Option<u32>,

    /// Split the nonce search across all cores
    #[arg(long, global = true)]
    parallel: bool,

    /// Give up on a block after this many nonces
    #[arg(long, global = true)]
    max_attempts: Option<u64>,

    /// Also re-check proof-of-work during verification
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a fresh chain and print it
    Demo {
        /// Payload for one block; repeat for more blocks
        #[arg(long = "data")]
        data: Vec<String>,
        /// Write the finished chain as JSON to this file
        #[arg(long)]
        export: Option<PathBuf>,
        /// Print the chain as JSON instead of one line per block
        #[arg(long)]
        json: bool,
    },
    /// Verify a chain previously written with `demo --export`
    Verify {
        /// Exported chain file
        #[arg(long)]
        input: PathBuf,
    },
}

impl Cli {
    fn chain_config(&self) -> Result<ChainConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                ChainConfig::from_json(&json)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => ChainConfig::default(),
        };
        if let Some(d) = self.difficulty {
            config.difficulty = Difficulty::new(d)?;
        }
        if self.parallel {
            config.strategy = MiningStrategy::Parallel;
        }
        if self.max_attempts.is_some() {
            config.max_attempts = self.max_attempts;
        }
        if self.strict {
            config.validation = ValidationPolicy::Strict;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.chain_config()?;
    match cli.cmd {
        Command::Demo { data, export, json } => demo(config, data, export, json),
        Command::Verify { input } => verify(config, input),
    }
}

fn demo(config: ChainConfig, data: Vec<String>, export: Option<PathBuf>, json: bool) -> Result<()> {
    let payloads = if data.is_empty() {
        DEMO_PAYLOADS.iter().map(|s| s.to_string()).collect()
    } else {
        data
    };

    let mut chain = Chain::new(config);
    for payload in payloads {
        let index = chain.next_index()?;
        if !json {
            println!("Mining block {index}...");
        }
        chain
            .append_data(payload)
            .with_context(|| format!("mining block {index}"))?;
    }

    if let Some(path) = &export {
        let bytes = serde_json::to_vec_pretty(&chain)?;
        fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
        info!("exported {} blocks to {}", chain.len(), path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&chain)?);
        return Ok(());
    }

    println!("Blockchain valid: {}", chain.is_valid());
    for block in &chain {
        println!(
            "Block {}: {}, Data: {}",
            block.index(),
            block.hash_hex(),
            block.data_lossy()
        );
    }
    Ok(())
}

fn verify(overrides: ChainConfig, input: PathBuf) -> Result<()> {
    let raw = fs::read(&input).with_context(|| format!("reading {}", input.display()))?;
    let record: ChainRecord = serde_json::from_slice(&raw)
        .with_context(|| format!("parsing chain {}", input.display()))?;

    // The exported config records the difficulty blocks were mined under;
    // only the policy is taken from the command line.
    let mut config = record.config;
    if overrides.validation == ValidationPolicy::Strict {
        config.validation = ValidationPolicy::Strict;
    }

    match Chain::import(config, record.blocks) {
        Ok(chain) => {
            println!("valid ({} blocks)", chain.len());
            Ok(())
        }
        Err(LedgerError::Invalid(err)) => bail!("invalid at block {}: {err}", err.index()),
        Err(LedgerError::EmptyChain) => bail!("{} holds no blocks", input.display()),
        Err(err) => Err(err.into()),
    }
}
