use skim::prelude::*;
use std::io::Cursor;

use crate::utils::error::{AppError, Result};

/// Lets the user fuzzy-pick one entry of `names`. `None` when aborted.
pub fn select_name(prompt: &str, names: Vec<String>) -> Result<Option<String>> {
    if names.is_empty() {
        return Ok(None);
    }

    let prompt = format!("{}> ", prompt);
    let options = SkimOptionsBuilder::default()
        .height(Some("40%"))
        .multi(false)
        .prompt(Some(prompt.as_str()))
        .build()
        .map_err(|e| AppError::ValidationError(format!("Invalid selector options: {}", e)))?;

    let item_reader = SkimItemReader::default();

    // Skim wants an owned reader that is Send + 'static
    let cursor = Cursor::new(names.join("\n").into_bytes());
    let items = item_reader.of_bufread(cursor);

    let selected = Skim::run_with(&options, Some(items))
        .filter(|out| !out.is_abort)
        .and_then(|out| {
            out.selected_items
                .first()
                .map(|item| item.output().to_string())
        });

    Ok(selected)
}
