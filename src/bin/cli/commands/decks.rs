use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, truncate, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let decks = app.storage.list_decks().context("Failed to list decks")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&decks)?);
        }
        OutputFormat::Plain => {
            if decks.is_empty() {
                println!("No decks. Create one with `cardstack-cli deck create NAME`.");
                return Ok(());
            }

            let name_width = decks.iter().map(|d| d.deck.name.chars().count()).max().unwrap_or(4).min(40).max(4);

            println!("{:>4}  {:<nw$}  {:>5}  {:>8}  {}",
                "ID", "Name", "Cards", "Mastered", "Last studied",
                nw = name_width);
            println!("{}", "-".repeat(name_width + 38));

            for d in &decks {
                let studied = d.deck.last_studied_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string());
                let name = format!("{:<nw$}", truncate(&d.deck.name, name_width), nw = name_width);
                println!("{:>4}  {}  {:>5}  {:>8}  {}",
                    d.deck.id,
                    paint(&name, Color::BOLD, use_color),
                    d.card_count,
                    d.mastered_count,
                    paint(&studied, Color::DIM, use_color));
            }
        }
    }

    Ok(())
}

pub fn run_create(
    app: &App,
    name: &str,
    description: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Deck name must not be empty");
    }

    let created = app.storage
        .create_deck(name.to_string(), description)
        .context("Failed to create deck")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        OutputFormat::Plain => {
            println!("Created deck \"{}\"", created.deck.name);
            println!("  ID: {}", created.deck.id);
        }
    }

    Ok(())
}

pub fn run_delete(app: &App, query: &str, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(query)?;
    app.storage.delete_deck(deck.deck.id)
        .with_context(|| format!("Failed to delete deck {}", deck.deck.id))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": deck.deck.id,
                "deleted": true,
                "cardsDeleted": deck.card_count,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Deleted deck \"{}\" and its {} cards", deck.deck.name, deck.card_count);
        }
    }

    Ok(())
}
