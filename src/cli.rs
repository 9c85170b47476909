use clap::{Parser, Subcommand};

/// Command-line interface definition for timecard
/// Task time tracking, audit trail and payment reporting over SQLite
#[derive(Parser)]
#[command(
    name = "timecard",
    version = env!("CARGO_PKG_VERSION"),
    about = "Track task timers, audit every change and report billable time",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Acting user id recorded on audit logs and activities
    #[arg(global = true, long = "actor")]
    pub actor: Option<i64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Create a small demo workspace (users, container, board, tasks)
    Seed,

    /// Start or stop a user's timer on a task
    Timer {
        /// Task id
        task_id: i64,

        /// User whose timer is toggled
        #[arg(long = "user")]
        user_id: i64,

        /// Mark the started entry as billable
        #[arg(long)]
        billable: bool,

        /// Hourly rate snapshotted onto the started entry
        #[arg(long = "rate", default_value_t = 0.0)]
        rate: f64,

        /// System-initiated stop; a no-op when no timer is running
        #[arg(long = "system-stop")]
        system_stop: bool,
    },

    /// Apply a batch of timer patches (create/update/delete) to a task
    Timers {
        /// Task id
        task_id: i64,

        /// Path to a JSON file holding the patch array
        #[arg(long, conflicts_with = "json")]
        file: Option<String>,

        /// Inline JSON patch array
        #[arg(long)]
        json: Option<String>,
    },

    /// Manage task assignments
    Members {
        /// Task id
        task_id: i64,

        /// Unassign this user from the task
        #[arg(long, conflicts_with = "set")]
        remove: Option<i64>,

        /// Comma-separated user ids the task should be assigned to
        #[arg(long = "set", value_delimiter = ',')]
        set: Option<Vec<i64>>,
    },

    /// Show the rendered activity feed of a container
    Activities {
        /// Container id
        container_id: i64,

        /// Page number (newest first)
        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Per-task payment breakdown for one user in a container
    Payments {
        /// Container id
        container_id: i64,

        /// User id
        user_id: i64,

        /// Date range, e.g. "2025-06-01 to 2025-06-30" (end defaults to today)
        #[arg(long)]
        range: Option<String>,

        /// Filter: all, paid or pending
        #[arg(long)]
        status: Option<String>,
    },

    /// Mark a user's pending tracked time as paid
    Pay {
        /// Container id
        container_id: i64,

        /// User id
        user_id: i64,

        /// Restrict the payment to a date range
        #[arg(long)]
        range: Option<String>,
    },

    /// Print the append-only audit log
    Log {
        /// Only rows of this task
        #[arg(long)]
        task: Option<i64>,
    },

    /// Export a payment breakdown to a file
    Export {
        /// Container id
        container_id: i64,

        /// User id
        user_id: i64,

        /// Export format: csv, json
        #[arg(long, value_name = "FORMAT", default_value = "csv")]
        format: String,

        /// Output file path
        #[arg(long, value_name = "FILE")]
        file: String,

        /// Restrict the export to a date range
        #[arg(long)]
        range: Option<String>,

        /// Filter: all, paid or pending
        #[arg(long)]
        status: Option<String>,

        /// Overwrite output file without confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },
}
