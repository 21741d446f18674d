use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use ramp::commands::{
    display_name, down, ports, prune, rebase, refresh, rename, run, status, up,
};
use ramp::completions::{complete_dynamic, generate_completions, CompletionContext, Shell};
use ramp::error::is_cancelled;
use ramp::orchestrator::{DownOptions, UpOptions};
use ramp::validation::clap_feature_name_validator;
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ramp")]
#[command(about = "Feature worktrees across several repositories", long_about = None)]
#[command(version)]
struct Cli {
    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a feature: one worktree per repository, ports and setup
    Up {
        /// Feature name (alphanumeric, dash, underscore, dot)
        #[arg(value_parser = clap_feature_name_validator)]
        name: String,

        /// Branch prefix, overriding the project default
        #[arg(long)]
        prefix: Option<String>,

        /// Feature, branch or remote ref to branch from
        #[arg(short, long)]
        target: Option<String>,

        /// Fetch and pull source repositories first
        #[arg(short, long)]
        refresh: bool,
    },

    /// Remove a feature: cleanup script, worktrees, branches and ports
    Down {
        #[arg(value_parser = clap_feature_name_validator)]
        name: String,

        /// Branch prefix used when the branch cannot be detected
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Rename a feature, its worktrees, branches, ports and display name
    Rename {
        #[arg(value_parser = clap_feature_name_validator)]
        from: String,

        #[arg(value_parser = clap_feature_name_validator)]
        to: String,
    },

    /// Switch every source repository to a branch
    Rebase {
        /// Branch to check out (local or origin/<branch>)
        branch: String,
    },

    /// Remove every feature merged into its base branch
    Prune,

    /// Show every feature, grouped by state
    Status,

    /// Fetch and pull every source repository
    Refresh,

    /// Run a custom command from the project config
    Run {
        /// Command name
        command: String,

        /// Feature to run the command in (source repositories if omitted)
        #[arg(value_parser = clap_feature_name_validator)]
        feature: Option<String>,
    },

    /// Show port allocations
    Ports,

    /// Show, set or clear a feature's display name
    DisplayName {
        #[arg(value_parser = clap_feature_name_validator)]
        feature: String,

        /// New display name
        name: Option<String>,

        /// Remove the display name
        #[arg(long, conflicts_with = "name")]
        clear: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish)
        shell: String,
    },

    /// Internal: Dynamic completion helper (invoked by shell)
    #[command(hide = true)]
    Complete {
        /// Shell type
        shell: String,
        /// Command line arguments being completed
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn dispatch(cli: Cli) -> Result<()> {
    let yes = cli.yes;
    match cli.command {
        Commands::Up {
            name,
            prefix,
            target,
            refresh,
        } => up::execute(
            name,
            UpOptions {
                prefix,
                target,
                refresh,
            },
            yes,
        ),
        Commands::Down { name, prefix } => down::execute(name, DownOptions { prefix }, yes),
        Commands::Rename { from, to } => rename::execute(from, to, yes),
        Commands::Rebase { branch } => rebase::execute(branch, yes),
        Commands::Prune => prune::execute(yes),
        Commands::Status => status::execute(),
        Commands::Refresh => refresh::execute(),
        Commands::Run { command, feature } => run::execute(command, feature),
        Commands::Ports => ports::execute(),
        Commands::DisplayName {
            feature,
            name,
            clear,
        } => display_name::execute(feature, name, clear),
        Commands::Completions { shell } => {
            let shell = Shell::from_str(&shell)?;
            let mut cmd = Cli::command();
            generate_completions(&mut cmd, shell);
            Ok(())
        }
        Commands::Complete { shell, args } => {
            let ctx = CompletionContext::from_args(&shell, &args);
            complete_dynamic(&ctx)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RAMP_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        // Interrupted by Ctrl-C; the shell convention is 128 + SIGINT
        Err(e) if is_cancelled(&e) => ExitCode::from(130),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
