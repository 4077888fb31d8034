mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use cardstack_lib::settings::PromptKind;

#[derive(Parser)]
#[command(name = "cardstack-cli", about = "Flashcard decks and study sessions", version)]
struct Cli {
    /// Settings file (default: {config_dir}/cardstack/settings.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory, overriding settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

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

#[derive(Subcommand)]
enum Command {
    /// List decks with card counts
    Decks,

    /// Create or delete decks
    #[command(subcommand)]
    Deck(DeckCommand),

    /// List the cards of a deck
    Cards {
        /// Deck id or name (case-insensitive prefix match)
        deck: String,
    },

    /// Add a card to a deck
    Add {
        /// Deck id or name
        deck: String,
        front: String,
        back: String,
    },

    /// Bulk-import cards, one "front|back" per line (tab and comma also work)
    Import {
        /// Deck id or name
        deck: String,
        /// File to read, or "-" for stdin (default: stdin)
        file: Option<PathBuf>,
    },

    /// Study a deck interactively
    Study {
        /// Deck id or name
        deck: String,
        /// Resume a saved session without asking
        #[arg(long, conflicts_with = "fresh")]
        resume: bool,
        /// Discard a saved session without asking
        #[arg(long)]
        fresh: bool,
    },

    /// Serve the REST API
    Serve {
        /// Listen address (default: server.addr from settings)
        #[arg(long)]
        addr: Option<String>,
        /// Create starter decks when none exist
        #[arg(long)]
        seed: bool,
    },

    /// Ask the AI to explain a card
    Explain {
        card_id: i64,
        /// Prompt template: analyze or memory
        #[arg(long, default_value = "analyze")]
        template: PromptKind,
    },
}

#[derive(Subcommand)]
enum DeckCommand {
    /// Create a deck
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a deck with its cards and saved session
    Delete {
        /// Deck id or name
        deck: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let app = app::App::new(cli.config.as_deref(), cli.data_dir)?;

    match cli.command {
        Command::Decks => {
            commands::decks::run_list(&app, &cli.format, use_color)?;
        }
        Command::Deck(DeckCommand::Create { name, description }) => {
            commands::decks::run_create(&app, &name, description, &cli.format)?;
        }
        Command::Deck(DeckCommand::Delete { deck }) => {
            commands::decks::run_delete(&app, &deck, &cli.format)?;
        }
        Command::Cards { deck } => {
            commands::cards::run_list(&app, &deck, &cli.format, use_color)?;
        }
        Command::Add { deck, front, back } => {
            commands::cards::run_add(&app, &deck, &front, &back, &cli.format)?;
        }
        Command::Import { deck, file } => {
            commands::cards::run_import(&app, &deck, file.as_deref(), &cli.format)?;
        }
        Command::Study { deck, resume, fresh } => {
            let mode = if resume {
                commands::study::ResumeMode::Resume
            } else if fresh {
                commands::study::ResumeMode::Fresh
            } else {
                commands::study::ResumeMode::Ask
            };
            commands::study::run(&app, &deck, mode, use_color).await?;
        }
        Command::Serve { addr, seed } => {
            commands::serve::run(&app, addr.as_deref(), seed).await?;
        }
        Command::Explain { card_id, template } => {
            commands::explain::run(&app, card_id, template, &cli.format).await?;
        }
    }

    Ok(())
}
