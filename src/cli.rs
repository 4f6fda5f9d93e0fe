//! Command-line interface for the `idmc` admin binary

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::services::seed::SeedOptions;

/// Default actor recorded in the activity log for CLI actions
pub const DEFAULT_ACTOR: &str = "cli@idmc.local";

/// idmc - IDMC 2026 registration admin tool
#[derive(Debug, Parser)]
#[command(name = "idmc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Run against a throwaway in-memory store instead of PostgreSQL
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply database migrations
    Migrate,

    /// Insert development data
    Seed(SeedArgs),

    /// Check in attendees by registration id or QR payload
    CheckIn(CheckInArgs),

    /// Undo a check-in
    UndoCheckIn(UndoCheckInArgs),

    /// Search registrations by id, email, short code or text
    Lookup(LookupArgs),

    /// Show dashboard statistics
    Stats(StatsArgs),

    /// Confirm a registration and issue its invoice
    Confirm(ConfirmArgs),

    /// Check database and cache connectivity
    Health,
}

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Delete existing registrations first
    #[arg(long)]
    pub clear: bool,

    /// Seed even when registrations exist
    #[arg(long)]
    pub force: bool,

    /// Use the fixed dataset
    #[arg(long = "static")]
    pub static_data: bool,

    /// Number of random registrations
    #[arg(long, default_value_t = 10)]
    pub count: usize,
}

impl From<&SeedArgs> for SeedOptions {
    fn from(args: &SeedArgs) -> Self {
        Self {
            clear: args.clear,
            force: args.force,
            static_data: args.static_data,
            count: args.count,
        }
    }
}

#[derive(Debug, Args)]
pub struct CheckInArgs {
    /// Registration id (REG-YYYY-CODE) or scanned QR payload
    pub registration: String,

    /// Check in only this attendee slot (0 is the primary attendee)
    #[arg(short, long)]
    pub attendee: Option<usize>,

    /// Admin performing the check-in
    #[arg(long, default_value = DEFAULT_ACTOR)]
    pub by: String,
}

#[derive(Debug, Args)]
pub struct UndoCheckInArgs {
    pub registration_id: String,

    /// Undo only this attendee slot; all slots otherwise
    #[arg(short, long)]
    pub attendee: Option<usize>,

    #[arg(long, default_value = DEFAULT_ACTOR)]
    pub by: String,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    pub query: String,

    /// Print JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Print JSON
    #[arg(long)]
    pub json: bool,

    /// Trigger the hosted stats sync afterwards
    #[arg(long)]
    pub sync: bool,
}

#[derive(Debug, Args)]
pub struct ConfirmArgs {
    pub registration_id: String,

    #[arg(long, default_value = DEFAULT_ACTOR)]
    pub by: String,
}

impl Cli {
    /// Log level override from `-v` flags
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
