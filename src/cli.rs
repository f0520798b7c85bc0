//! Command line definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use event_planner_lib::models::{DATE_FALLBACK, VENUE_FALLBACK};

/// Search an events catalog and keep a personal planner
#[derive(Debug, Parser)]
#[command(name = "event-planner", version, about)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); falls back to RUST_LOG
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Skip the catalog self-test normally run at startup
    #[arg(long, global = true)]
    pub no_self_test: bool,

    /// Also write the rendered page to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub html: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the events catalog
    Search {
        /// City to search in
        location: String,

        /// Event type (music, sports, arts, family)
        #[arg(short = 't', long = "type", default_value = "")]
        event_type: String,

        /// Only events starting on or after this date (YYYY-MM-DD)
        #[arg(short, long, default_value = "")]
        date: String,
    },

    /// Search restaurants (placeholder results)
    Dining {
        #[arg(long, default_value = "")]
        location: String,

        #[arg(long, default_value = "")]
        cuisine: String,
    },

    /// Add an event to the planner
    Add {
        /// Catalog event id
        id: String,

        #[arg(long)]
        name: String,

        #[arg(long, default_value = DATE_FALLBACK)]
        date: String,

        #[arg(long, default_value = VENUE_FALLBACK)]
        venue: String,
    },

    /// Remove an event from the planner
    Remove {
        /// Catalog event id
        id: String,
    },

    /// List planner entries
    Planner,

    /// Render the whole page to stdout (or --html)
    Page,

    /// Run the catalog self-test
    SelfTest,

    /// Inspect or change the stored configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Store the catalog API key
    SetApiKey { key: String },
}
