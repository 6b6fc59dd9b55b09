//! pricepin - calibrate and check product prices from the command line

use anyhow::Result;
use clap::{Parser, Subcommand};
use pricepin::commands::{CalibrateCommand, CheckCommand, ParseCommand};
use pricepin::config::{Config, OutputFormat};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricepin",
    version,
    about = "Pin a product price to a CSS selector and re-read it later",
    long_about = "Calibrates a selector from a price you can see on a product page, then extracts the current price with that selector, falling back to a heuristic search when the page layout changed."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Skip headless rendering and use plain HTTP only
    #[arg(long, global = true)]
    no_render: bool,

    /// Do not fall back to plain HTTP when rendering fails
    #[arg(long, global = true)]
    no_fallback: bool,

    /// Proxy URL for plain HTTP fetching (e.g., socks5://host:port)
    #[arg(long, global = true, env = "PRICEPIN_PROXY")]
    proxy: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the selector for a price you can see on the page
    #[command(alias = "cal")]
    Calibrate {
        /// Product page URL
        url: String,

        /// Price text as shown on the page (e.g., "229,99 TL")
        observed: String,

        /// Price at or below which the product is worth buying
        #[arg(short, long)]
        target: f64,

        /// Also list every matching element with its score
        #[arg(short, long)]
        list: bool,
    },

    /// Extract the current price of a product page
    #[command(alias = "c")]
    Check {
        /// Product page URL
        url: String,

        /// Selector from an earlier calibration
        #[arg(short, long)]
        selector: Option<String>,

        /// Report whether the price is at or below this target
        #[arg(short, long)]
        target: Option<f64>,
    },

    /// Run the price normalizer on a piece of text
    Parse {
        /// Text to parse (e.g., "1.234,56 TL")
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(format) = cli.format {
        config.format = format;
    }
    if cli.no_render {
        config.render = false;
    }
    if cli.no_fallback {
        config.http_fallback = false;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Calibrate { url, observed, target, list } => {
            let cmd = CalibrateCommand::new(config);
            let output = cmd.execute(&url, &observed, target, list).await?;
            println!("{}", output);
        }

        Commands::Check { url, selector, target } => {
            let cmd = CheckCommand::new(config);
            let output = cmd.execute(&url, selector.as_deref(), target).await?;
            println!("{}", output);
        }

        Commands::Parse { text } => {
            let cmd = ParseCommand::new(config);
            println!("{}", cmd.execute(&text));
        }
    }

    Ok(())
}
