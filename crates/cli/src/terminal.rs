//! Terminal output: machine-readable results on stdout, colored status on stderr.

use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use serde_json::Value;

/// Color scheme for status lines.
struct Colors;

impl Colors {
    const VALID: Color = Color::Green;
    const REJECTED: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print a JSON document on stdout (one line per document).
    pub fn print_json(&self, value: &Value) -> Result<()> {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer(&mut stdout, value)?;
        writeln!(stdout)?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_valid(&self, msg: &str) -> Result<()> {
        self.status(Colors::VALID, "ok", msg)
    }

    pub fn print_rejected(&self, msg: &str) -> Result<()> {
        self.status(Colors::REJECTED, "rejected", msg)
    }

    pub fn print_error(&self, msg: &str) -> Result<()> {
        self.status(Colors::ERROR, "error", msg)
    }

    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        Ok(())
    }

    fn status(&self, color: Color, label: &str, msg: &str) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(color),
            Print(format!("{label:>8} ")),
            ResetColor,
            Print(format!("{msg}\n")),
        )?;
        Ok(())
    }
}
