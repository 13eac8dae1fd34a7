//! CLI command definitions
//!
//! Defines the clap commands for the smoke test CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full end-to-end smoke test
    Run {
        /// Event server base URL (default: http://localhost:4000)
        #[arg(long)]
        server_url: Option<String>,

        /// Dashboard URL (default: http://localhost:5173)
        #[arg(long)]
        dashboard_url: Option<String>,

        /// Chrome/Chromium executable (path or name on PATH)
        #[arg(long)]
        chrome: Option<PathBuf>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,
    },

    /// Check that the event server is healthy
    Health {
        /// Event server base URL (default: http://localhost:4000)
        #[arg(long)]
        server_url: Option<String>,
    },

    /// Post a single event to the event server
    Send {
        /// Event server base URL (default: http://localhost:4000)
        #[arg(long)]
        server_url: Option<String>,

        /// Event type, e.g. UserPromptSubmit or PreToolUse
        #[arg(long, short = 't')]
        event_type: Option<String>,

        /// Source application name
        #[arg(long)]
        source_app: Option<String>,

        /// Prompt text (default: a generated probe message)
        #[arg(long, short)]
        prompt: Option<String>,

        /// Session id (default: a generated unique id)
        #[arg(long)]
        session_id: Option<String>,

        /// Extra payload entries as key=value; values that parse as JSON are
        /// sent as JSON. Can be specified multiple times
        #[arg(long = "data", short = 'd', value_name = "KEY=VALUE")]
        data: Vec<String>,
    },
}
