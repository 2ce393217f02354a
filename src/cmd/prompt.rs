use std::io::{self, Write};

use dialoguer::Password;

use crate::error::{AppError, AppResult};

/// Writes `label` and returns the trimmed line typed back.
pub fn ask(label: &str) -> AppResult<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Reads a secret without echoing it to the terminal.
pub fn ask_secret(label: &str) -> AppResult<String> {
    Password::new()
        .with_prompt(label)
        .interact()
        .map_err(input_error)
}

fn input_error(err: dialoguer::Error) -> AppError {
    match err {
        dialoguer::Error::IO(err) => AppError::Io(err),
    }
}

pub fn confirm(question: &str) -> AppResult<bool> {
    let answer = ask(&format!("{question} [y/N]: "))?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "y" | "yes")
}
