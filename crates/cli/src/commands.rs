use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a full migration: extract (or submit transfer jobs), then
    /// validate every table.
    Migrate {
        #[arg(long, help = "Migration plan file (JSON)")]
        config: String,

        #[arg(
            long,
            num_args = 1..,
            help = "Restrict the run to these plan tables"
        )]
        tables: Vec<String>,

        #[arg(
            long,
            help = "Rehearse the run against an in-memory destination; nothing is written"
        )]
        dry_run: bool,

        #[arg(
            long,
            help = "If specified, writes the JSON report to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Validate only: no extraction or submission, verdicts against the
    /// existing destination state.
    Validate {
        #[arg(long, help = "Migration plan file (JSON)")]
        config: String,

        #[arg(
            long,
            num_args = 1..,
            help = "Restrict validation to these plan tables"
        )]
        tables: Vec<String>,

        #[arg(
            long,
            help = "If specified, writes the JSON report to this file instead of stdout"
        )]
        output: Option<String>,
    },
    /// Parse and validate a plan file, then print the normalized plan.
    Plan {
        #[arg(long, help = "Migration plan file (JSON)")]
        config: String,
    },
    /// Test a connection string against a given format
    TestConn {
        /// Data format: "mysql" or "postgres"
        #[arg(long)]
        format: String,

        /// Connection string
        #[arg(long)]
        conn_str: String,
    },
}
