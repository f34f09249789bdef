//! LinkNest CLI
//!
//! Command-line interface for LinkNest - a personal bookmark manager.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use linknest_core::{Config, SortMode, Store};

mod commands;
mod editor;
mod metadata;
mod output;

use commands::link::{Edits, NewLink, Selection};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "linknest")]
#[command(about = "LinkNest - Save, organize and search your links")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage links
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },
    /// Search links by relevance
    Search {
        /// Search query
        query: String,
        /// Only links in this folder (id, id prefix or name)
        #[arg(short, long)]
        folder: Option<String>,
        /// Only links with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Sort mode (defaults to relevance)
        #[arg(short, long)]
        sort: Option<SortMode>,
    },
    /// Manage folders
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// List all tags
    Tags,
    /// Show collection statistics
    Stats,
    /// Export all links and folders to a JSON backup
    Export {
        /// Output file (defaults to linknest-backup-<date>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace all links and folders with a JSON backup
    Import {
        /// Backup file to import
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Suggest folders for unfiled links
    Organize {
        /// File the links under the suggested folders
        #[arg(long)]
        apply: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Save a new link
    #[command(alias = "create")]
    Add {
        /// URL to save
        url: String,
        /// Title (defaults to the page title with --fetch, else the URL)
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Folder to file the link under (id, id prefix or name)
        #[arg(short, long)]
        folder: Option<String>,
        /// Fill missing title, description and tags from the page
        #[arg(long)]
        fetch: bool,
    },
    /// List links
    #[command(alias = "ls")]
    List {
        /// Only links in this folder (id, id prefix or name)
        #[arg(short, long)]
        folder: Option<String>,
        /// Only links with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Sort mode (date-desc, date-asc, title-asc, title-desc, url-asc, url-desc)
        #[arg(short, long)]
        sort: Option<SortMode>,
    },
    /// Show link details
    Show {
        /// Link ID (full UUID or prefix)
        id: String,
    },
    /// Edit a link (prompts when no flags are given)
    Edit {
        /// Link ID (full UUID or prefix)
        id: String,
        #[arg(short = 'T', long)]
        title: Option<String>,
        #[arg(short, long)]
        url: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Replace tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,
        /// Move to this folder (id, id prefix or name)
        #[arg(short, long, conflicts_with = "no_folder")]
        folder: Option<String>,
        /// Take the link out of its folder
        #[arg(long)]
        no_folder: bool,
    },
    /// Delete a link
    #[command(alias = "rm")]
    Delete {
        /// Link ID (full UUID or prefix)
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Open a link in the browser
    Open {
        /// Link ID (full UUID or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum FolderCommands {
    /// Create a folder
    #[command(alias = "create")]
    Add {
        /// Folder name
        name: String,
    },
    /// List folders
    #[command(alias = "ls")]
    List,
    /// Rename a folder
    Rename {
        /// Folder (id, id prefix or name)
        folder: String,
        /// New name
        name: String,
    },
    /// Delete a folder, keeping its links as unfiled
    #[command(alias = "rm")]
    Delete {
        /// Folder (id, id prefix or name)
        folder: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, default_sort, log_file, fetch_timeout_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening the store
    let command = match cli.command {
        Commands::Config { command } => {
            return handle_config_command(command, config_path, &output);
        }
        command => command,
    };

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut store = Store::open_with_config(&config);
    if let Some(problem) = store.load_problem() {
        output.storage_problem(problem);
    }

    let result = match command {
        Commands::Link { command } => {
            handle_link_command(command, &mut store, &config, &output).await
        }
        Commands::Search {
            query,
            folder,
            tag,
            sort,
        } => commands::link::list(
            &store,
            &config,
            Selection {
                query: Some(query),
                folder,
                tag,
                sort,
            },
            &output,
        ),
        Commands::Folder { command } => handle_folder_command(command, &mut store, &output),
        Commands::Tags => commands::tag::list(&store, &output),
        Commands::Stats => commands::stats::show(&store, &output),
        Commands::Export { output: path } => commands::backup::export(&store, path, &output),
        Commands::Import { file, yes } => commands::backup::import(&mut store, file, yes, &output),
        Commands::Organize { apply } => {
            commands::organize::organize(&mut store, &config, apply, &output).await
        }
        Commands::Config { .. } => Ok(()), // Handled above
    };

    if let Some(problem) = store.save_problem() {
        output.storage_problem(problem);
    }

    result
}

async fn handle_link_command(
    command: LinkCommands,
    store: &mut Store,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        LinkCommands::Add {
            url,
            title,
            description,
            tag,
            folder,
            fetch,
        } => {
            let new = NewLink {
                url,
                title,
                description,
                tags: tag,
                folder,
                fetch,
            };
            commands::link::create(store, config, new, output).await
        }
        LinkCommands::List { folder, tag, sort } => commands::link::list(
            store,
            config,
            Selection {
                query: None,
                folder,
                tag,
                sort,
            },
            output,
        ),
        LinkCommands::Show { id } => commands::link::show(store, id, output),
        LinkCommands::Edit {
            id,
            title,
            url,
            description,
            tags,
            folder,
            no_folder,
        } => {
            let edits = Edits {
                title,
                url,
                description,
                tags,
                folder,
                no_folder,
            };
            commands::link::edit(store, id, edits, output)
        }
        LinkCommands::Delete { id, yes } => commands::link::delete(store, id, yes, output),
        LinkCommands::Open { id } => commands::link::open(store, id, output),
    }
}

fn handle_folder_command(command: FolderCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        FolderCommands::Add { name } => commands::folder::create(store, name, output),
        FolderCommands::List => commands::folder::list(store, output),
        FolderCommands::Rename { folder, name } => {
            commands::folder::rename(store, folder, name, output)
        }
        FolderCommands::Delete { folder, yes } => {
            commands::folder::delete(store, folder, yes, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Initialize logging
///
/// Only initializes if LINKNEST_LOG environment variable is set.
/// Logs to config.log_file when configured, otherwise stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("LINKNEST_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "linknest_core={},linknest={}",
        log_level, log_level
    ));

    match &config.log_file {
        Some(log_path) => {
            let log_file = match File::options().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();

            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
