//! Hashtag Sentinel CLI
//!
//! A command-line tool for ad-hoc keyword searches against the recent-search
//! API and offline analysis of a stored event window.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, search};

/// Hashtag Sentinel CLI
#[derive(Parser)]
#[command(name = "hsq")]
#[command(author, version, about = "CLI for Hashtag Sentinel", long_about = None)]
pub struct Cli {
    /// Search API endpoint (can also be set via HSQ_API_URL env var)
    #[arg(
        long,
        env = "HSQ_API_URL",
        default_value = "https://api.twitter.com/2/tweets/search/recent"
    )]
    pub api_url: String,

    /// Bearer token for the search API
    #[arg(long, env = "HSQ_BEARER_TOKEN", default_value = "", hide_default_value = true)]
    pub bearer_token: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Page through recent matching events without storing anything
    Search {
        /// Keyword to search for
        #[arg(long, short)]
        keyword: String,

        /// Lookback window in hours
        #[arg(long, default_value_t = 1)]
        hours: u64,

        /// Results per page (API caps at 100)
        #[arg(long, default_value_t = 100)]
        page_size: u32,
    },

    /// Bin a stored event window and print its dispersion
    Analyze {
        /// Path of the event store file
        #[arg(long, default_value = "data/events.json")]
        events: String,

        /// Trailing window in hours
        #[arg(long, default_value_t = 6)]
        hours: u64,

        /// Bin width in seconds
        #[arg(long, default_value_t = 3600)]
        bin_seconds: i64,

        /// Dispersion threshold used to color the verdict
        #[arg(long, default_value_t = 100.0)]
        threshold: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            keyword,
            hours,
            page_size,
        } => {
            search::run_search(
                &cli.api_url,
                &cli.bearer_token,
                &keyword,
                hours,
                page_size,
                cli.format,
            )
            .await?;
        }
        Commands::Analyze {
            events,
            hours,
            bin_seconds,
            threshold,
        } => {
            analyze::run_analyze(&events, hours, bin_seconds, threshold, cli.format).await?;
        }
    }

    Ok(())
}
