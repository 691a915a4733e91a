mod error;
mod report;
mod server;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{bail, eyre};
use dirstat_core::{Aggregator, FsListing, ListingProvider, StatsMessage};
use tracing_subscriber::EnvFilter;

/// dirstat - directory listings and subtree statistics
#[derive(Parser, Debug)]
#[command(name = "dirstat")]
#[command(about = "Directory listings and concurrent subtree statistics, locally or over HTTP")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve listings and statistics for everything under ROOT
    Serve {
        /// Directory exposed to clients
        root: PathBuf,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },

    /// List the immediate children of a directory
    List {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Count directories, files and bytes below a directory
    Stats {
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.verbose);

    match args.command {
        Command::Serve { root, bind, port } => {
            let root = validate_dir(root)?;
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(root, &bind, port))?;
        }
        Command::List { path, json } => {
            let listing = FsListing::new().list(&path)?;
            if json {
                let body = serde_json::json!({
                    "path": listing.path,
                    "dirs": listing.entries,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                for line in report::listing_lines(&listing) {
                    println!("{line}");
                }
            }
        }
        Command::Stats { path, json } => run_stats(path, json)?,
    }

    Ok(())
}

fn run_stats(path: PathBuf, json: bool) -> Result<()> {
    let path = validate_dir(path)?;
    let (rx, handle) = Aggregator::new(FsListing::new()).spawn(path);

    let mut stderr = std::io::stderr();
    for msg in rx {
        if let StatsMessage::Progress(progress) = msg {
            let _ = write!(stderr, "\r\x1b[2K{}", report::progress_line(&progress));
            let _ = stderr.flush();
        }
    }
    let _ = writeln!(stderr);

    let result = handle
        .join()
        .map_err(|_| eyre!("traversal thread panicked"))??;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in report::statistics_lines(&result) {
            println!("{line}");
        }
    }

    Ok(())
}

fn validate_dir(path: PathBuf) -> Result<PathBuf> {
    let path = path.canonicalize().unwrap_or(path);

    if !path.exists() {
        bail!("Path does not exist: {}", path.display());
    }
    if !path.is_dir() {
        bail!("Path is not a directory: {}", path.display());
    }

    Ok(path)
}

fn setup_logging(verbose: bool) {
    let default = if verbose {
        "dirstat=debug,dirstat_core=debug,tower_http=debug,warn"
    } else {
        "dirstat=info,dirstat_core=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
