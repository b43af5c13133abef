//! CLI command definitions and dispatch for the `lhub` binary.
//!
//! Uses clap derive macros for argument parsing. Commands are grouped by
//! noun (`lhub skill create`, `lhub resource add`), with a few catalog-wide
//! verbs at the top level.

pub mod resource;
pub mod skill;
pub mod status;
pub mod verify;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

use learnhub_types::resource::ResourceId;

/// Curate learning resources and keep their links trustworthy.
#[derive(Parser)]
#[command(name = "lhub", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage skills (learning topics).
    Skill {
        #[command(subcommand)]
        action: skill::SkillCommand,
    },

    /// Manage learning resources.
    #[command(alias = "res")]
    Resource {
        #[command(subcommand)]
        action: resource::ResourceCommand,
    },

    /// Re-verify every resource URL and overwrite the stored flags.
    VerifyAll {
        /// Only resources owned by this skill (slug or ID).
        #[arg(long)]
        skill: Option<String>,

        /// Only resources currently marked unverified.
        #[arg(long)]
        unverified: bool,
    },

    /// Check a single URL without touching the catalog.
    CheckUrl {
        /// URL to check.
        url: String,
    },

    /// Catalog status dashboard.
    Status,

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Steady-ticking spinner with the given message.
pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

pub(crate) fn parse_resource_id(raw: &str) -> Result<ResourceId> {
    raw.trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a valid resource ID"))
}

/// Parse a comma-separated tag list, dropping blanks.
pub(crate) fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
