//! CLI command definitions
//!
//! Defines the clap commands for the conformance CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// List all sandboxes
    Sandboxes,

    /// List a sandbox's scenario modules with their conformance statuses
    #[command(alias = "ls")]
    Scenarios {
        /// Sandbox id
        sandbox_id: String,
    },

    /// Start (or restart) a scenario
    Start {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,

        /// Skip the confirmation prompt for restarts with existing traffic
        #[arg(long, short)]
        yes: bool,
    },

    /// Stop the running scenario
    Stop {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show a scenario's live status and conformance report
    Status {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,
    },

    /// Drive a scenario interactively, action by action
    Run {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,

        /// Skip confirmation prompts
        #[arg(long, short)]
        yes: bool,
    },

    /// Submit input for the current action
    Submit {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,

        /// Action input text (free text, or JSON for JSON-expecting actions)
        input: Option<String>,

        /// Read the action input from a file instead
        #[arg(long, short, conflicts_with = "input")]
        file: Option<PathBuf>,

        /// Submit an acknowledgement without any input
        #[arg(long, conflicts_with_all = ["input", "file"])]
        no_input: bool,
    },

    /// Mark the current action complete
    Complete {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,

        /// Skip the current action instead of completing it
        #[arg(long)]
        skip: bool,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Show a scenario's conformance report tree
    Report {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,
    },

    /// Dump the current action's exchange log
    Exchanges {
        /// Sandbox id
        sandbox_id: String,

        /// Scenario id
        scenario_id: String,
    },

    /// Ask the sandbox to notify the counterpart party
    NotifyParty {
        /// Sandbox id
        sandbox_id: String,
    },

    /// Reset the counterpart party
    ResetParty {
        /// Sandbox id
        sandbox_id: String,
    },

    /// Sandbox configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print a sandbox's configuration as JSON
    Get {
        /// Sandbox id
        sandbox_id: String,
    },

    /// Update a sandbox's configuration from a JSON file
    Update {
        /// Sandbox id
        sandbox_id: String,

        /// File holding the updated configuration
        file: PathBuf,
    },
}
