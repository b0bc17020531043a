mod config;
mod device;
mod error;
mod layout;
mod matrix;
mod scanner;
mod state;
mod tracker;

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use config::{Config, ScanArgs};
use scanner::Scanner;

#[derive(Parser)]
#[command(name = "m100kbd", version)]
#[command(about = "TRS-80 Model 100 keyboard matrix driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the keyboard matrix and forward keys to a virtual uinput keyboard
    Run(ScanArgs),
    /// Write an HTML visualization of the key matrix
    Layout {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let config = Config::from(args);
            config::init_logging(config.debug);
            if let Err(err) = run(config) {
                error!(error = %format!("{err:#}"), "keyboard driver failed");
                std::process::exit(1);
            }
        }
        Command::Layout { output } => {
            let html = layout::generate_html();
            match output {
                Some(path) => {
                    fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{html}"),
            }
        }
    }

    Ok(())
}

fn run(config: Config) -> Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "TRS-80 Model 100 keyboard driver starting");

    let mut scanner = Scanner::open(config).context("creating keyboard scanner")?;

    let cancel = Arc::new(AtomicBool::new(false));
    let handler_cancel = Arc::clone(&cancel);
    ctrlc::set_handler(move || {
        info!("received signal, shutting down");
        handler_cancel.store(true, Ordering::SeqCst);
    })
    .context("installing signal handler")?;

    scanner.run(&cancel);
    scanner.close().context("closing keyboard scanner")?;

    info!("shutdown complete");
    Ok(())
}
