//! # Output
//!
//! Commands return serializable values; this module prints them either as
//! aligned text tables or as JSON (`--json`).

use serde::Serialize;

use crate::error::{CliError, CliResult};

/// Text rendering of a command result.
pub trait Render {
    fn render(&self) -> String;
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Output { json }
    }

    /// Prints a command result to stdout.
    pub fn emit<T: Serialize + Render>(&self, value: &T) -> CliResult<()> {
        println!("{}", self.format(value)?);
        Ok(())
    }

    pub fn format<T: Serialize + Render>(&self, value: &T) -> CliResult<String> {
        if self.json {
            serde_json::to_string_pretty(value)
                .map_err(|e| CliError::new(crate::error::ErrorCode::Internal, e.to_string()))
        } else {
            Ok(value.render())
        }
    }

    /// Prints a failure to stderr (as JSON on stdout with `--json`).
    pub fn emit_error(&self, err: &CliError) {
        if self.json {
            match serde_json::to_string_pretty(err) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("{err}"),
            }
        } else {
            eprintln!("{err}");
        }
    }
}

/// A plain message, e.g. after a successful update.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Message {
            message: message.into(),
        }
    }
}

impl Render for Message {
    fn render(&self) -> String {
        self.message.clone()
    }
}

/// Lays out rows under headers with every column padded to its widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(line(headers));
    out.push(line(&rule.iter().map(String::as_str).collect::<Vec<_>>()));
    for row in rows {
        out.push(line(&row.iter().map(String::as_str).collect::<Vec<_>>()));
    }

    if rows.is_empty() {
        out.push("(none)".to_string());
    }

    out.join("\n")
}
