//! Stagehand — clone a hosted site's full deployment pipeline.
//!
//! # Usage
//!
//! ```text
//! stagehand clone --source-site <site> --target-site <site>
//! stagehand clone --source-site <site> --target-site-prefix <p> [--target-site-suffix <s>]
//!     [--target-site-org <org>] [--target-site-upstream <upstream>]
//!     [--source-site-git-depth <n>] [--target-site-git-depth <n>]
//!     [--source-site-backup] [--no-custom <names>] [--debug-git]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::clone::CloneArgs;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stagehand",
    version,
    about = "Replicate a hosted site's dev/test/live pipeline onto a new site",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Clone a source site's code history, deployment state, and content
    /// onto a newly created target site.
    Clone(CloneArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Clone(args) => args.run(),
    }
}
