use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use line_stager::Config;
use line_stager::Stager;
use line_stager::diff::{FileDiff, format_numbered};
use line_stager::git::Stream;
use line_stager::parse::parse_file_refs;
use line_stager::status::{ChangeStatus, FileChange};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "line-stager", version)]
#[command(about = "Non-interactive line-level git staging tool")]
struct Cli {
    /// Run as if started in DIR
    #[arg(short = 'C', value_name = "DIR", default_value = ".", global = true)]
    directory: PathBuf,

    /// Read configuration from FILE instead of the default location
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Git executable to run
    #[arg(long, value_name = "PROGRAM", global = true)]
    git: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List staged and unstaged changes
    Status,
    /// Show a file's diff with line numbers usable as references
    Diff {
        path: String,
        /// Show staged changes (numbers are then valid for `unstage`)
        #[arg(long)]
        cached: bool,
    },
    /// Stage specific lines by reference (e.g., file.nix:10..15,-20)
    Stage {
        /// File and line references (e.g., "flake.nix:137" or "flake.nix:10..15")
        #[arg(required = true)]
        file_refs: Vec<String>,
    },
    /// Unstage specific lines, numbered as in `diff --cached`
    Unstage {
        #[arg(required = true)]
        file_refs: Vec<String>,
    },
    /// Stage whole files
    Add {
        #[arg(required_unless_present = "all")]
        paths: Vec<String>,
        /// Stage every change in the repository
        #[arg(short = 'A', long, conflicts_with = "paths")]
        all: bool,
    },
    /// Unstage whole files
    Reset {
        #[arg(required_unless_present = "all")]
        paths: Vec<String>,
        /// Unstage everything
        #[arg(long, conflicts_with = "paths")]
        all: bool,
    },
    /// Throw away work tree changes to whole files, deleting untracked ones
    Discard {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Commit the staged changes
    Commit {
        #[arg(short, long)]
        message: String,
    },
    /// Print the effective configuration as TOML
    Config,
    /// Generate shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_overrides(cli.git.clone());

    init_tracing(&config);

    let stager = Stager::with_config(cli.directory.clone(), &config);

    match cli.command {
        Commands::Status => {
            let lists = stager.status()?;
            print_changes("Staged", &lists.staged);
            print_changes("Unstaged", &lists.unstaged);
        }
        Commands::Diff { path, cached } => {
            let diff = load_diff(&stager, &path, cached)?;
            if diff.is_empty() {
                eprintln!("No changes in {}", path);
            } else {
                print!("{}", format_numbered(&diff));
            }
        }
        Commands::Stage { file_refs } => {
            for file_ref in &file_refs {
                stager.stage_refs(&parse_file_refs(file_ref)?)?;
                eprintln!("Staged {}", file_ref);
            }
        }
        Commands::Unstage { file_refs } => {
            for file_ref in &file_refs {
                stager.unstage_refs(&parse_file_refs(file_ref)?)?;
                eprintln!("Unstaged {}", file_ref);
            }
        }
        Commands::Add { paths, all } => {
            if all {
                stager.stage_all()?;
            } else {
                stager.stage_files(&paths)?;
            }
        }
        Commands::Reset { paths, all } => {
            if all {
                stager.unstage_all()?;
            } else {
                stager.unstage_files(&paths)?;
            }
        }
        Commands::Discard { paths } => {
            stager.discard_files(&paths)?;
            eprintln!("Discarded changes to {} file(s)", paths.len());
        }
        Commands::Commit { message } => {
            stager.commit(&message, &mut |stream, chunk| match stream {
                Stream::Stdout => print!("{}", chunk),
                Stream::Stderr => eprint!("{}", chunk),
            })?;
        }
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "line-stager", &mut io::stdout());
        }
        Commands::Man => {
            let mut out = io::stdout().lock();
            clap_mangen::Man::new(Cli::command()).render(&mut out)?;
            out.flush()?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured filter; logs go to stderr.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Untracked files have no git diff; show their contents as additions.
fn load_diff(
    stager: &Stager,
    path: &str,
    cached: bool,
) -> Result<FileDiff, line_stager::StagerError> {
    if !cached {
        let lists = stager.status()?;
        if let Some(change) = lists
            .unstaged
            .iter()
            .find(|change| change.path == path && change.status == ChangeStatus::Untracked)
        {
            return Ok(stager.load_session(change, false)?.diff().clone());
        }
    }
    stager.diff(path, cached)
}

fn print_changes(title: &str, changes: &[FileChange]) {
    if changes.is_empty() {
        return;
    }
    println!("{}:", title);
    for change in changes {
        println!("  {} {}", change.status, change.path);
    }
}
