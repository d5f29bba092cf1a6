mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nous-notion", about = "Import Notion exports into a Markdown vault", version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Layout options shared by `import` and `plan`
#[derive(Args, Debug)]
pub struct LayoutArgs {
    /// Settings file (TOML); flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Vault folder receiving the import
    #[arg(long)]
    output_folder: Option<String>,

    /// Attachment sub-folder ("" puts attachments next to the notes)
    #[arg(long)]
    attachment_folder: Option<String>,

    /// Give every page its own folder
    #[arg(long)]
    parents_in_subfolders: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import one or more Notion exports into a vault
    Import {
        /// Export ZIP files or extracted export folders
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// Vault folder
        #[arg(long)]
        vault: PathBuf,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Show where everything would go, without writing
    Plan {
        /// Export ZIP files or extracted export folders
        #[arg(required = true)]
        archives: Vec<PathBuf>,
        /// Vault folder, used to avoid existing files
        #[arg(long)]
        vault: Option<PathBuf>,
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Write a settings file with the default values
    InitConfig {
        /// Destination file
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();

    match cli.command {
        Command::Import { archives, vault, layout } => {
            let settings = app::load_settings(&layout)?;
            commands::import::run(&archives, &vault, settings, &cli.format, use_color)?;
        }
        Command::Plan { archives, vault, layout } => {
            let settings = app::load_settings(&layout)?;
            commands::plan::run(&archives, vault.as_deref(), settings, &cli.format, use_color)?;
        }
        Command::InitConfig { path, force } => {
            commands::config::run(&path, force)?;
        }
    }

    Ok(())
}
