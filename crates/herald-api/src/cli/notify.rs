//! Interactive terminal walk through the notification workflow (`herald notify`).
//!
//! This is the plain-trigger variant of the workflow: the terminal plays the
//! role of the chat client, dialoguer renders each prompt, and the answers
//! are fed back to the engine as inbound actions.

use anyhow::{Result, bail};
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select};

use herald_core::adapter::Interaction;
use herald_types::error::WorkflowError;
use herald_types::prompt::{DestinationPrompt, InboundAction, Outcome, Preview, Prompt};
use herald_types::workflow::Initiator;

use crate::state::AppState;

const ORIGIN: &str = "Terminal";

/// Renders engine prompts on stdout.
struct ConsoleInteraction {
    initiator: Initiator,
    json: bool,
}

impl Interaction for ConsoleInteraction {
    fn initiator(&self) -> &Initiator {
        &self.initiator
    }

    fn origin(&self) -> Option<&str> {
        Some(ORIGIN)
    }

    async fn respond(&self, prompt: Prompt) -> Result<(), WorkflowError> {
        if self.json {
            let line = serde_json::to_string(&prompt)
                .map_err(|e| WorkflowError::Adapter(format!("failed to encode prompt: {e}")))?;
            println!("{line}");
            return Ok(());
        }
        for line in describe(&prompt) {
            println!("{line}");
        }
        Ok(())
    }
}

/// Run the interactive workflow until it finishes.
pub async fn run_notify(state: &AppState, as_name: Option<String>, json: bool) -> Result<()> {
    let interaction = ConsoleInteraction {
        initiator: terminal_initiator(as_name, std::env::var("USER").ok()),
        json,
    };
    if state.platform.is_dry_run() && !json {
        println!(
            "  {} {}",
            style("⚠").yellow(),
            style("No bot token configured: deliveries will only be logged.").dim()
        );
    }

    let mut action = InboundAction::Begin;
    let mut last_step: Option<Prompt> = None;

    loop {
        let prompt = state.engine.handle(&interaction, action).await;
        let current = match prompt {
            Prompt::Finished(_) => return Ok(()),
            Prompt::Rejected { .. } => match &last_step {
                Some(step) => step.clone(),
                None => return Ok(()),
            },
            step => {
                last_step = Some(step.clone());
                step
            }
        };
        action = ask(&current)?;
    }
}

/// Ask the user to answer one step prompt.
fn ask(prompt: &Prompt) -> Result<InboundAction> {
    match prompt {
        Prompt::ChooseCategory(p) => {
            let labels: Vec<&str> = p.options.iter().map(|o| o.label.as_str()).collect();
            let selection = Select::new()
                .with_prompt("Choose notification type")
                .items(&labels)
                .default(0)
                .interact()?;
            Ok(InboundAction::PickCategory {
                category: p.options[selection].category,
            })
        }
        Prompt::ChooseDestinations(p) => {
            let items: Vec<String> = p
                .options
                .iter()
                .map(|o| format!("{}  {}", o.label, style(&o.description).dim()))
                .collect();
            let defaults = vec![p.options.len() == 1; p.options.len()];
            let picked = MultiSelect::new()
                .with_prompt(format!(
                    "{}: choose up to {} (space to toggle, enter to accept)",
                    p.title, p.max_choices
                ))
                .items(&items)
                .defaults(&defaults)
                .interact()?;
            Ok(InboundAction::PickDestinations {
                key: p.key,
                values: destination_values(p, &picked),
            })
        }
        Prompt::EnterContent(p) => {
            let message: String = Input::new()
                .with_prompt(format!("{} message ({})", p.title, p.placeholder))
                .interact_text()?;
            let details: String = Input::new()
                .with_prompt("Details (optional)")
                .allow_empty(true)
                .interact_text()?;
            Ok(InboundAction::SubmitContent {
                key: p.key,
                message,
                details: optional_details(details),
            })
        }
        Prompt::Confirm(preview) => {
            let send = Confirm::new()
                .with_prompt("Send this notification?")
                .default(false)
                .interact()?;
            Ok(if send {
                InboundAction::Confirm { key: preview.key }
            } else {
                InboundAction::Cancel { key: preview.key }
            })
        }
        Prompt::Rejected { .. } | Prompt::Finished(_) => {
            bail!("prompt does not expect an answer")
        }
    }
}

/// The terminal user: `--as` wins, then `$USER`.
fn terminal_initiator(as_name: Option<String>, user: Option<String>) -> Initiator {
    let name = as_name
        .or(user)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "herald".to_string());
    Initiator::new(format!("cli:{name}"), name)
}

fn destination_values(prompt: &DestinationPrompt, picked: &[usize]) -> Vec<String> {
    picked
        .iter()
        .filter_map(|&i| prompt.options.get(i))
        .map(|o| o.choice.as_value().to_string())
        .collect()
}

fn optional_details(input: String) -> Option<String> {
    (!input.trim().is_empty()).then_some(input)
}

/// Lines shown for a prompt. Step prompts are rendered by dialoguer itself.
fn describe(prompt: &Prompt) -> Vec<String> {
    match prompt {
        Prompt::Confirm(preview) => describe_preview(preview),
        Prompt::Rejected { message, .. } => {
            vec![format!("  {} {}", style("✗").red(), message)]
        }
        Prompt::Finished(outcome) => vec![format!("  {}", outcome_line(outcome))],
        Prompt::ChooseCategory(_) | Prompt::ChooseDestinations(_) | Prompt::EnterContent(_) => {
            Vec::new()
        }
    }
}

fn describe_preview(preview: &Preview) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!("  {}", style(format!("{} - preview", preview.title)).bold()),
        format!("  {} {}", style("Alert:").dim(), preview.alert.mention()),
        format!("  {} {}", style("Sender:").dim(), preview.initiator.display_name),
        format!("  {}", style("Destinations:").dim()),
    ];
    lines.extend(preview.destinations.iter().map(|d| format!("    {d}")));
    lines.push(format!("  {} {}", style("Message:").dim(), preview.message));
    if let Some(details) = &preview.details {
        lines.push(format!("  {} {}", style("Details:").dim(), details));
    }
    lines.push(format!(
        "  {}",
        style(format!("Expires at {}", preview.expires_at.format("%H:%M:%S UTC"))).dim()
    ));
    lines.push(String::new());
    lines
}

fn outcome_line(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Delivered { .. } => "✅ Notification sent successfully!".to_string(),
        Outcome::Cancelled => "❌ Notification cancelled.".to_string(),
        Outcome::Expired { message } | Outcome::Failed { message } => format!("❌ {message}"),
    }
}
