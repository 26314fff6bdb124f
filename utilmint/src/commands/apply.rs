// Copyright (c) 2024 Botho Foundation

use anyhow::{bail, Context, Result};
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tracing::info;

use super::Session;
use crate::request::Request;
use crate::types::AccountName;

/// Execute a JSON array of requests, one store transaction each.
///
/// `requests` is a file path, or `-` for stdin. Each outcome is printed as a
/// JSON line. Stops at the first rejection unless `keep_going` is set.
pub fn run(
    config_path: &Path,
    caller: Option<&AccountName>,
    requests: &str,
    keep_going: bool,
) -> Result<()> {
    let contents = if requests == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read requests from stdin")?;
        buffer
    } else {
        fs::read_to_string(requests)
            .with_context(|| format!("Failed to read requests from {}", requests))?
    };
    let batch = parse_requests(&contents)?;

    let session = Session::open(config_path)?;
    let mut rejected = 0usize;
    for (index, request) in batch.iter().enumerate() {
        match session.execute(caller, request) {
            Ok(outcome) => {
                let line = serde_json::to_string(&outcome).context("Failed to serialize outcome")?;
                println!("{}", line);
            }
            Err(e) if keep_going => {
                rejected += 1;
                eprintln!("Request {} ({}): {:#}", index, request.action(), e);
            }
            Err(e) => return Err(e.context(format!("Request {} failed", index))),
        }
    }

    info!(
        applied = batch.len() - rejected,
        rejected, "Request batch finished"
    );
    if rejected > 0 {
        bail!("{} of {} requests rejected", rejected, batch.len());
    }
    Ok(())
}

/// Parse a JSON array of requests, or a single request object.
pub fn parse_requests(contents: &str) -> Result<Vec<Request>> {
    let value: serde_json::Value =
        serde_json::from_str(contents).context("Requests are not valid JSON")?;
    if value.is_array() {
        serde_json::from_value(value).context("Invalid request in batch")
    } else {
        let request = serde_json::from_value(value).context("Invalid request")?;
        Ok(vec![request])
    }
}
