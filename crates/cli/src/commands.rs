use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Apply a stream of load events and print each committed offset
    Load {
        #[arg(long, help = "Sink config file path")]
        config: String,

        #[arg(
            long,
            help = "JSON-lines event file; events are read from stdin when omitted"
        )]
        events: Option<String>,
    },
    /// Validate a sink config and print the table preparation DDL
    Check {
        #[arg(long, help = "Sink config file path")]
        config: String,
    },
}
