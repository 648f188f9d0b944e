use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::dns::cloudflare::Cloudflare;
use crate::error::ProvisionResult;
use crate::outputs::Outputs;
use crate::pipeline::{Pipeline, Plan};
use crate::provision::digitalocean::DigitalOcean;

#[derive(Parser)]
#[command(name = "anchorage")]
#[command(about = "Droplet + reserved IP + Cloudflare apex record")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the droplet, its reserved IP and the DNS record
    Up {
        /// Validate configuration and print the plan only
        #[arg(long)]
        dry_run: bool,

        /// Also write outputs as JSON to this file
        #[arg(long)]
        outputs: Option<PathBuf>,
    },

    /// Describe the environment variables read at startup
    Env,
}

/// Dispatch a parsed command.
pub async fn run(cli: &Cli) -> ProvisionResult<()> {
    match &cli.command {
        Command::Up { dry_run, outputs } => cmd_up(*dry_run, outputs.as_deref()).await,
        Command::Env => cmd_env(),
    }
}

async fn cmd_up(dry_run: bool, outputs_path: Option<&Path>) -> ProvisionResult<()> {
    up(
        |name| std::env::var(name).ok(),
        |config| {
            Pipeline::new(
                DigitalOcean::new(&config.digitalocean_token),
                Cloudflare::new(&config.cloudflare_token),
            )
        },
        dry_run,
        outputs_path,
    )
    .await
    .map(|_| ())
}

/// Body of `anchorage up`.
///
/// Configuration is read through `lookup` and validated before
/// `build` is called, so a missing variable never reaches a provider.
/// When the run fails, its stage error is returned even if writing
/// the outputs file fails too.
pub async fn up<L, B>(
    lookup: L,
    build: B,
    dry_run: bool,
    outputs_path: Option<&Path>,
) -> ProvisionResult<Outputs>
where
    L: Fn(&str) -> Option<String>,
    B: FnOnce(&Config) -> Pipeline,
{
    let config = Config::from_lookup(lookup)?;
    let plan = Plan::from_config(&config);

    if dry_run {
        eprintln!("=== Dry run: no changes will be made ===");
        eprintln!();
        print!("{plan}");
        return Ok(Outputs::default());
    }

    let pipeline = build(&config);
    let mut outputs = Outputs::default();
    let result = pipeline.up(&plan, &mut outputs).await;

    let written = if outputs.is_empty() {
        Ok(())
    } else {
        eprintln!();
        eprintln!("Outputs:");
        print!("{outputs}");
        outputs_path.map_or(Ok(()), |path| {
            outputs.write_json(path).map(|()| {
                eprintln!("Outputs written to {}", path.display());
            })
        })
    };

    match (result, written) {
        (Ok(_), Ok(())) => Ok(outputs),
        (Ok(_), Err(e)) | (Err(e), Ok(())) => Err(e),
        (Err(e), Err(write_err)) => {
            tracing::error!(error = %write_err, "could not write outputs file");
            Err(e)
        }
    }
}

fn cmd_env() -> ProvisionResult<()> {
    let rows = config::describe(|name| std::env::var(name).ok());
    print!("{}", config::render_table(&rows));
    Config::from_env().map(|_| ())
}
