use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::app::App;
use crate::render::terminal::{paint, status_color, truncate};
use crate::OutputFormat;

pub fn run_list(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let deck = app.find_deck(query)?;
    let cards = app.storage.list_cards(deck.deck.id)
        .context("Failed to list cards")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Plain => {
            println!("{} ({} cards, {} mastered)", deck.deck.name, deck.card_count, deck.mastered_count);
            if cards.is_empty() {
                println!("  (no cards)");
                return Ok(());
            }

            for card in &cards {
                // pad before coloring so escape codes don't skew the columns
                let status = paint(&format!("{:<6}", card.status), status_color(card.status), use_color);
                println!("{:>5}  {}  {}  |  {}",
                    card.id,
                    status,
                    truncate(&card.front, 40),
                    truncate(&card.back, 40));
            }
        }
    }

    Ok(())
}

pub fn run_add(app: &App, query: &str, front: &str, back: &str, format: &OutputFormat) -> Result<()> {
    if front.trim().is_empty() || back.trim().is_empty() {
        bail!("Front and back must not be empty");
    }

    let deck = app.find_deck(query)?;
    let card = app.storage
        .create_card(deck.deck.id, front.trim().to_string(), back.trim().to_string())
        .context("Failed to create card")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        OutputFormat::Plain => {
            println!("Added card {} to \"{}\"", card.id, deck.deck.name);
        }
    }

    Ok(())
}

pub fn run_import(app: &App, query: &str, file: Option<&Path>, format: &OutputFormat) -> Result<()> {
    let deck = app.find_deck(query)?;

    let text = match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let count = app.storage.import_cards(deck.deck.id, &text)
        .context("Failed to import cards")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "deckId": deck.deck.id,
                "count": count,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Imported {} cards into \"{}\"", count, deck.deck.name);
        }
    }

    Ok(())
}
