use std::sync::Arc;

use anyhow::{Context, Result};

use cardstack_lib::ai::{AiError, ChatCompletionsClient};
use cardstack_lib::server::{start_server, AppState};

use crate::app::App;

pub async fn run(app: &App, addr: Option<&str>, seed: bool) -> Result<()> {
    if seed && app.storage.seed_if_empty().context("Failed to seed starter decks")? {
        println!("Created starter decks");
    }

    let mut state = AppState::new(app.storage.clone())
        .with_templates(app.settings.prompt_templates.clone());

    match ChatCompletionsClient::from_settings(&app.settings) {
        Ok(client) => state = state.with_explainer(Arc::new(client)),
        Err(AiError::MissingApiKey) => {
            log::info!("No AI API key configured, /api/explain will answer 503");
        }
        Err(e) => return Err(e).context("Failed to create AI client"),
    }

    let addr = addr.unwrap_or(app.settings.server.addr.as_str());
    let server = start_server(addr, state)
        .await
        .with_context(|| format!("Failed to listen on {}", addr))?;

    println!("Serving on {} (Ctrl-C to stop)", server.base_url());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to wait for Ctrl-C")?;
    server.shutdown().await;

    Ok(())
}
