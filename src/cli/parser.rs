use crate::export::ExportFormat;
use clap::{Parser, Subcommand};

/// Command-line interface definition for jobkpi
#[derive(Parser)]
#[command(
    name = "jobkpi",
    version = env!("CARGO_PKG_VERSION"),
    about = "Recompute per-job, per-day KPI rows from clock events and ledger data",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Show the configuration
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Signal that (owner, job?, day) needs recompute
    Touch {
        #[arg(long)]
        owner: String,

        /// Job number or job name
        #[arg(long)]
        job: Option<String>,

        /// Day (YYYY-MM-DD)
        #[arg(required_unless_present = "from", conflicts_with_all = ["from", "to"])]
        day: Option<String>,

        /// First day of a backfill range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Last day of a backfill range (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    /// Claim and process one batch of touches
    Run {
        #[arg(long, help = "Maximum touches to claim (default: batch_limit)")]
        limit: Option<usize>,

        #[arg(long, help = "Parallel owner/day groups (default: fan_out)")]
        fan_out: Option<usize>,
    },

    /// Recompute one (owner, day) directly, bypassing the queue
    Recompute {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        day: String,

        /// Jobs to refresh finance for even without clocked time
        #[arg(long = "job")]
        jobs: Vec<String>,
    },

    /// Resolve or list jobs
    Job {
        #[command(subcommand)]
        action: JobAction,
    },

    /// Set an employee's hourly rate
    Rate {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        employee: String,

        #[arg(long)]
        rate: f64,
    },

    /// Set owner policy (timezone, daily OT threshold)
    Owner {
        #[arg(long)]
        owner: String,

        #[arg(long = "tz", help = "IANA timezone, e.g. America/Toronto")]
        timezone: Option<String>,

        #[arg(long = "ot", help = "Daily overtime threshold in minutes (0 = none)")]
        ot_threshold: Option<i64>,
    },

    /// Show or export KPI rows (or rollups with --rollups)
    Report {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long, help = "Timesheet rollups instead of KPI rows")]
        rollups: bool,

        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long, value_name = "FILE", help = "Write to a file instead of printing")]
        file: Option<String>,

        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum JobAction {
    /// Find a job by name, creating it with the next job number if missing
    Ensure {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        name: String,
    },

    /// List an owner's jobs
    List {
        #[arg(long)]
        owner: String,
    },
}
