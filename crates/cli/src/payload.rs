//! Payload input: files (JSON or YAML by extension) or stdin (JSON).

use std::fs;
use std::io::{self, BufRead, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Read a single payload from `input` (`-` for stdin).
pub fn read_payload(input: &str) -> Result<Value> {
    if input == "-" {
        let mut contents = String::new();
        io::stdin()
            .read_to_string(&mut contents)
            .context("failed to read payload from stdin")?;
        return parse_json(&contents);
    }

    let path = Path::new(input);
    let contents = fs::read_to_string(path).with_context(|| format!("failed to read payload {input}"))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yml") | Some("yaml") => {
            serde_yaml::from_str(&contents).with_context(|| format!("invalid YAML payload {input}"))
        }
        _ => parse_json(&contents).with_context(|| format!("invalid JSON payload {input}")),
    }
}

/// Open `input` for line-by-line reading (`-` for stdin).
pub fn open_lines(input: &str) -> Result<Box<dyn BufRead>> {
    if input == "-" {
        return Ok(Box::new(io::BufReader::new(io::stdin())));
    }
    let file = fs::File::open(input).with_context(|| format!("failed to open payload {input}"))?;
    Ok(Box::new(io::BufReader::new(file)))
}

pub fn parse_json(contents: &str) -> Result<Value> {
    serde_json::from_str(contents).context("payload is not valid JSON")
}
