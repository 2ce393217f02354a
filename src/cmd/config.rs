use clap::{Args, Subcommand};

use crate::cmd::prompt::ask;
use crate::config::{StoredConfig, config_file_path};
use crate::domain::status::StatusFilter;
use crate::error::{AppError, AppResult};

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring ticketflow.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!();

    apply_prompt(
        "Backend URL (e.g., https://project.supabase.co)",
        &mut cfg.backend_url,
        false,
    )?;
    apply_prompt("Anon key", &mut cfg.anon_key, true)?;
    apply_prompt(
        "Default status filter (all/in_progress/completed/blocked)",
        &mut cfg.default_status_filter,
        false,
    )?;

    if let Some(filter) = cfg.default_status_filter.as_deref() {
        if StatusFilter::from_str(filter).is_none() {
            return Err(AppError::Configuration(format!(
                "unknown status filter '{filter}'"
            )));
        }
    }

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Backend URL: {}", display_value(&cfg.backend_url));
    println!("Anon key: {}", mask_secret(&cfg.anon_key));
    println!(
        "Default status filter: {}",
        display_value(&cfg.default_status_filter)
    );

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    let label = match (target.as_deref(), secret) {
        (Some(_), true) => format!("{field} [****] (Enter to keep, '-' to clear): "),
        (Some(value), false) => format!("{field} [{value}] (Enter to keep, '-' to clear): "),
        (None, _) => format!("{field} (Enter to skip): "),
    };

    match PromptAction::from_input(&ask(&label)?) {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.len() > 6 => {
            let prefix = &token[..3];
            let suffix = &token[token.len() - 3..];
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

impl PromptAction {
    fn from_input(input: &str) -> Self {
        match input.trim() {
            "" => PromptAction::Keep,
            "-" => PromptAction::Clear,
            value => PromptAction::Set(value.to_string()),
        }
    }
}
