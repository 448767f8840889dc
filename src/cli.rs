//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use newsfeed_core::ArchiveFamily;
use newsfeed_core::query::{QueryMode, parse_timestamp};

/// Retrieve news coverage records from GDELT.
///
/// Live searches are split into windows to stay under the per-request result
/// cap; archive downloads fetch and merge the published knowledge-graph files.
#[derive(Parser, Debug)]
#[command(name = "newsfeed")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write JSON lines to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Article records over a date range, one query per window
    Search(SearchArgs),
    /// One aggregate timeline query
    Timeline(TimelineArgs),
    /// Download and merge knowledge-graph archives
    Archive(ArchiveArgs),
}

/// Date range and search terms shared by live queries.
#[derive(ClapArgs, Debug, Clone)]
pub struct FilterArgs {
    /// Range start (YYYY-MM-DD-HH-MM-SS or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub start: NaiveDateTime,

    /// Range end (YYYY-MM-DD-HH-MM-SS or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub end: NaiveDateTime,

    /// Keyword or phrase (repeatable)
    #[arg(short = 'k', long = "keyword")]
    pub keywords: Vec<String>,

    /// Source domain (repeatable)
    #[arg(long = "domain")]
    pub domains: Vec<String>,

    /// Source country code (repeatable)
    #[arg(long = "country")]
    pub countries: Vec<String>,

    /// Source language (repeatable)
    #[arg(long = "language")]
    pub languages: Vec<String>,

    /// GKG theme (repeatable)
    #[arg(long = "theme")]
    pub themes: Vec<String>,

    /// Records per request (1-250)
    #[arg(long, default_value_t = 250, value_parser = clap::value_parser!(u32).range(1..=250))]
    pub max_records: u32,

    /// Raw query string containing `&startdatetime=..&enddatetime=..&maxrecords=..`
    #[arg(long, conflicts_with_all = ["keywords", "domains", "countries", "languages", "themes"])]
    pub query: Option<String>,

    /// Repair attempts for malformed responses
    #[arg(long)]
    pub max_repair_attempts: Option<u32>,
}

/// Arguments for `search`.
#[derive(ClapArgs, Debug, Clone)]
pub struct SearchArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Window length in minutes
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub window_minutes: Option<u32>,

    /// Also query a final window shorter than the window length
    #[arg(long)]
    pub include_trailing_partial: bool,
}

/// Arguments for `timeline`.
#[derive(ClapArgs, Debug, Clone)]
pub struct TimelineArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Aggregate mode (timelinevol, timelinevolraw, timelinetone, timelinelang, timelinesourcecountry)
    #[arg(short, long, default_value = "timelinevol")]
    pub mode: QueryMode,
}

/// Archive generation selector.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArg {
    /// GKG 1.0 daily archives
    Gkg1,
    /// GKG 2.0 15-minute archives
    Gkg2,
}

/// Arguments for `archive`.
#[derive(ClapArgs, Debug, Clone)]
pub struct ArchiveArgs {
    /// Range start (YYYY-MM-DD-HH-MM-SS or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub start: NaiveDateTime,

    /// Range end, inclusive (YYYY-MM-DD-HH-MM-SS or YYYY-MM-DD)
    #[arg(long, value_parser = parse_timestamp)]
    pub end: NaiveDateTime,

    /// Archive family
    #[arg(short, long, value_enum, default_value_t = FamilyArg::Gkg2)]
    pub family: FamilyArg,

    /// Use the translated GKG 2.0 feed
    #[arg(long)]
    pub translation: bool,

    /// Archives downloaded at once (default: twice the CPU count)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u16).range(1..=512))]
    pub concurrency: Option<u16>,

    /// Proxy URL for archive requests
    #[arg(long)]
    pub proxy: Option<String>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl ArchiveArgs {
    /// The selected family.
    #[must_use]
    pub fn archive_family(&self) -> ArchiveFamily {
        match self.family {
            FamilyArg::Gkg1 => ArchiveFamily::GkgV1,
            FamilyArg::Gkg2 => ArchiveFamily::GkgV2 {
                translation: self.translation,
            },
        }
    }
}
