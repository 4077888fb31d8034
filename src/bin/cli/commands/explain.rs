use anyhow::{Context, Result};

use cardstack_lib::ai::{ChatCompletionsClient, ExplanationProvider};
use cardstack_lib::settings::PromptKind;

use crate::app::App;
use crate::OutputFormat;

pub async fn run(app: &App, card_id: i64, template: PromptKind, format: &OutputFormat) -> Result<()> {
    let card = app.find_card(card_id)?;
    let client = ChatCompletionsClient::from_settings(&app.settings)
        .context("Set ai_api_key in the settings file to use explanations")?;

    let prompt = app.settings.prompt_templates.render(template, &card);
    let text = client
        .generate_explanation(&prompt)
        .await
        .context("Failed to get an explanation")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "cardId": card.id,
                "template": template,
                "text": text,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", card.front);
            println!();
            println!("{}", text);
        }
    }

    Ok(())
}
