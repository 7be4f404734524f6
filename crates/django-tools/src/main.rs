//! django-tools CLI - Django build provisioning from a declarative config

mod config_file;
mod logging;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use provision_core::{Provisioner, UpdateOutcome, UserError};

#[derive(Parser, Debug)]
#[command(name = "django-tools")]
#[command(about = "Provision Django build parts from a declarative config")]
#[command(version)]
struct Args {
    /// Provisioning config file
    #[arg(short, long, default_value = "django-tools.yaml", global = true)]
    config: PathBuf,

    /// Part to provision when the config defines more than one
    #[arg(short, long, global = true)]
    part: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv); also shows version-control
    /// client output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, install and scaffold the configured part
    Install,
    /// Re-run the version-control update step for checkout-based installs
    Update,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(err) = run(args).await {
        // Provisioning failures carry their own actionable message; anything
        // else gets the full context chain.
        match err.downcast_ref::<UserError>() {
            Some(user_err) => eprintln!("{} {}", "Error:".red().bold(), user_err),
            None => eprintln!("{} {:#}", "Error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    logging::init(args.verbose, args.quiet)?;

    let config = config_file::load(&args.config)?;
    let ctx = config.context(&args.config, args.verbose > 0);
    let (name, options) = config.part(args.part.as_deref())?;
    let provisioner = Provisioner::new(name, ctx, options.clone());

    match args.command {
        Command::Install => {
            let location = provisioner.install().await?;
            println!(
                "{} Installed part `{}` to {}",
                "✓".green(),
                provisioner.name(),
                location.display()
            );
        }
        Command::Update => match provisioner.update().await? {
            UpdateOutcome::Updated => {
                println!(
                    "{} Updated part `{}` at {}",
                    "✓".green(),
                    provisioner.name(),
                    provisioner.location().display()
                );
            }
            UpdateOutcome::Skipped => {
                println!("Nothing to update for part `{}`", provisioner.name());
            }
        },
    }

    Ok(())
}
