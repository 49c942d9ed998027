//! CLI command implementations

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::cli::args::ConfigCommand;
use crate::config::Settings;
use crate::storage::{display_value, CallSummaryRecord, SummaryRepository};
use crate::summarize::{log_failure, Stage, SummarizationPipeline, TriggerEvent};

/// Run the summarization pipeline for one event
pub async fn handle_event(settings: &Settings, event_path: Option<PathBuf>) -> Result<()> {
    let input = read_event_input(event_path.as_deref())?;
    let event = TriggerEvent::from_json(&input)?;

    // Reject bad input before any collaborator is constructed.
    if let Err(e) = event.validate() {
        log_failure(&event, Stage::Received, &e);
        return Err(e.into());
    }

    settings.ensure_dirs()?;
    let pipeline = SummarizationPipeline::from_settings(settings)?;

    let outcome = pipeline.handle(&event).await?;
    println!("{}", serde_json::to_string(&outcome)?);

    Ok(())
}

fn read_event_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read event file: {}", p.display())),
        _ => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read event from stdin")?;
            Ok(input)
        }
    }
}

/// Show stored summaries for a contact
pub fn show_summaries(settings: &Settings, contact_id: &str, json: bool) -> Result<()> {
    let repo = SummaryRepository::new(settings)?;

    if json {
        let items = repo.items_for_contact(contact_id)?;
        if items.is_empty() {
            anyhow::bail!("No summaries found for contact {}", contact_id);
        }
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    let records = repo.records_for_contact(contact_id)?;
    if records.is_empty() {
        anyhow::bail!("No summaries found for contact {}", contact_id);
    }

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_record(record);
    }

    Ok(())
}

fn print_record(record: &CallSummaryRecord) {
    let summary = &record.summary;

    println!("Contact: {}", record.contact_id);
    println!("Time: {}", record.timestamp.as_deref().unwrap_or("-"));
    println!("Status: {}", record.status.as_str());
    println!();
    println!("Issue: {}", display_value(&summary.issue));
    println!("Resolution: {}", display_value(&summary.resolution));
    let sentiment = display_value(&summary.sentiment);
    match summary.sentiment_kind() {
        Some(_) => println!("Sentiment: {}", sentiment),
        None => println!("Sentiment: {} (unrecognized)", sentiment),
    }
    println!("Category: {}", display_value(&summary.category));
    if let Some(next_steps) = summary.next_steps.as_ref() {
        println!("Next steps: {}", display_value(next_steps));
    }
}

/// List recently stored summaries
pub fn list_summaries(settings: &Settings, limit: usize) -> Result<()> {
    let repo = SummaryRepository::new(settings)?;
    let records = repo.recent(limit)?;

    if records.is_empty() {
        println!("No summaries found");
        return Ok(());
    }

    println!(
        "{:<24} {:<22} {:<10} {:<12} {:<30}",
        "Contact", "Time", "Sentiment", "Category", "Issue"
    );
    println!("{}", "-".repeat(100));

    for record in records {
        println!(
            "{:<24} {:<22} {:<10} {:<12} {:<30}",
            truncate(&record.contact_id, 22),
            truncate(record.timestamp.as_deref().unwrap_or("-"), 20),
            truncate(&display_value(&record.summary.sentiment), 10),
            truncate(&display_value(&record.summary.category), 12),
            truncate(&display_value(&record.summary.issue), 28),
        );
    }

    Ok(())
}

/// Handle config subcommands
pub fn config_command(settings: &Settings, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let toml = toml::to_string_pretty(settings)?;
            println!("{}", toml);
        }
        ConfigCommand::Path => {
            let path = Settings::config_path()?;
            println!("{}", path.display());
        }
        ConfigCommand::Init { force } => {
            let path = Settings::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {}. Use --force to overwrite.",
                    path.display()
                );
            }
            Settings::write_default(&path)?;
            println!("Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}
