use std::io::{BufRead, Lines, Write};

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use cardstack_lib::flashcards::SessionState;
use cardstack_lib::study::{InitOutcome, Outcome, ResumeDecision, SessionEngine, SessionWarning};

use crate::app::App;
use crate::render::terminal::{paint, stats_line, Color};

/// What to do with a saved session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeMode {
    Ask,
    Resume,
    Fresh,
}

/// How the interactive loop ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Finished,
    Quit,
}

enum Input {
    Line(String),
    Quit,
}

fn read_input<R: BufRead>(input: &mut Lines<R>) -> Result<Input> {
    match input.next() {
        None => Ok(Input::Quit),
        Some(line) => {
            let line = line.context("Failed to read input")?;
            if line.trim().eq_ignore_ascii_case("q") {
                Ok(Input::Quit)
            } else {
                Ok(Input::Line(line))
            }
        }
    }
}

fn ask_resume<R: BufRead, W: Write>(
    input: &mut Lines<R>,
    out: &mut W,
    saved: &SessionState,
    use_color: bool,
) -> ResumeDecision {
    let _ = writeln!(
        out,
        "Found a saved session: {} cards left ({}).",
        saved.queue.len(),
        stats_line(&saved.stats, use_color)
    );
    let _ = write!(out, "Resume it? [Y/n] ");
    let _ = out.flush();

    match input.next() {
        Some(Ok(answer)) if answer.trim().eq_ignore_ascii_case("n") => ResumeDecision::Discard,
        _ => ResumeDecision::Resume,
    }
}

fn drain_warnings(warnings: &mut mpsc::UnboundedReceiver<SessionWarning>, use_color: bool) {
    while let Ok(warning) = warnings.try_recv() {
        eprintln!("{} {}", paint("warning:", Color::YELLOW, use_color), warning);
    }
}

/// Show head cards and apply answers until the queue drains or the user quits
async fn drive<R: BufRead, W: Write>(
    engine: &mut SessionEngine,
    input: &mut Lines<R>,
    out: &mut W,
    use_color: bool,
) -> Result<SessionEnd> {
    while let Some(card) = engine.head().cloned() {
        writeln!(out)?;
        writeln!(
            out,
            "{}  {}",
            paint(&format!("[{} left]", engine.queue_len()), Color::DIM, use_color),
            paint(&card.front, Color::BOLD, use_color)
        )?;
        write!(out, "Press Enter to reveal (q to quit) ")?;
        out.flush()?;

        if let Input::Quit = read_input(input)? {
            return Ok(SessionEnd::Quit);
        }
        writeln!(out, "  {}", paint(&card.back, Color::CYAN, use_color))?;

        let outcome = loop {
            write!(out, "[e]asy  [g]ood  [a]gain  [q]uit > ")?;
            out.flush()?;
            match read_input(input)? {
                Input::Quit => return Ok(SessionEnd::Quit),
                Input::Line(line) => match line.trim().parse::<Outcome>() {
                    Ok(outcome) => break outcome,
                    Err(e) => writeln!(out, "  {}", e)?,
                },
            }
        };

        let step = engine.apply_outcome(outcome, &card)?;
        if let Some(position) = step.requeued_at {
            writeln!(out, "  Back in the queue at position {}", position + 1)?;
        } else if step.recorded != outcome {
            writeln!(out, "  Requeued too often, counted as {}", step.recorded)?;
        }
    }

    Ok(SessionEnd::Finished)
}

pub async fn run(app: &App, query: &str, mode: ResumeMode, use_color: bool) -> Result<()> {
    let deck = app.find_deck(query)?;
    let deck_id = deck.deck.id;
    let cards = app.storage.list_cards(deck_id)
        .context("Failed to list cards")?;

    let (tx, mut warnings) = mpsc::unbounded_channel();
    let mut engine = SessionEngine::new(
        deck_id,
        app.storage.clone(),
        app.storage.clone(),
        app.settings.study.clone(),
    )
    .with_warnings(tx);

    let stdin = std::io::stdin();
    let mut input = stdin.lock().lines();
    let mut out = std::io::stdout();

    let started = engine
        .load_and_initialize(cards, |saved| match mode {
            ResumeMode::Resume => ResumeDecision::Resume,
            ResumeMode::Fresh => ResumeDecision::Discard,
            ResumeMode::Ask => ask_resume(&mut input, &mut out, saved, use_color),
        })
        .await;

    if engine.is_finished() {
        engine.wait_for_writes().await;
        drain_warnings(&mut warnings, use_color);
        println!("\"{}\" has no cards to study.", deck.deck.name);
        return Ok(());
    }

    let verb = if started == InitOutcome::Resumed { "Resuming" } else { "Studying" };
    println!("{} \"{}\": {} cards", verb, deck.deck.name, engine.queue_len());

    let end = drive(&mut engine, &mut input, &mut out, use_color).await?;

    match end {
        SessionEnd::Finished => {
            app.storage.mark_deck_studied(deck_id)
                .context("Failed to record study time")?;
            engine.wait_for_writes().await;
            drain_warnings(&mut warnings, use_color);
            println!();
            println!("{} {}", paint("Session complete:", Color::GREEN, use_color), stats_line(&engine.stats(), use_color));
        }
        SessionEnd::Quit => {
            let saved = engine.flush().await;
            engine.wait_for_writes().await;
            drain_warnings(&mut warnings, use_color);
            saved.map_err(|e| anyhow::anyhow!(e)).context("Failed to save session")?;
            println!();
            println!("Progress saved, {} cards left ({})", engine.queue_len(), stats_line(&engine.stats(), use_color));
        }
    }

    Ok(())
}
