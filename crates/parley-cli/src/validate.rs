//! Agent card validation report

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use parley_a2a::{A2aClient, A2aError, validate_card};
use tracing::debug;

use crate::render;

/// How a validation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    /// The card could not be fetched or parsed
    Error,
}

/// Only absolute http(s) URLs are accepted
pub fn check_url(raw: &str) -> std::result::Result<url::Url, String> {
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(parsed),
        _ => Err(format!(
            "❌ ERROR: Invalid URL format. URL must start with http:// or https://\n   Provided: {}",
            raw
        )),
    }
}

/// Fetch the card at `url`, validate it and print the full report to `out`
pub async fn run<W: Write>(url: &str, timeout: Duration, out: &mut W) -> Result<Verdict> {
    writeln!(out, "{}", render::section("A2A Agent Card Validator"))?;
    writeln!(out, "\nFetching agent card from: {}\n", url)?;

    let fetched = match A2aClient::new(timeout) {
        Ok(client) => client.fetch_card_document(url).await,
        Err(e) => Err(e),
    };
    let doc = match fetched {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Fetch failed: {:?}", e);
            write!(out, "{}", fetch_error(&e, timeout))?;
            return Ok(Verdict::Error);
        }
    };

    writeln!(out, "✓ Successfully fetched agent card")?;
    writeln!(out, "  Response status: {}", doc.status)?;
    writeln!(out, "  Content size: {} bytes\n", doc.content_length)?;

    match validate_card(&doc.body) {
        Ok(card) => {
            writeln!(out, "✅ VALIDATION PASSED\n")?;
            write!(out, "{}", render::card_details(&card))?;
            writeln!(out, "\n{}", render::section("Full Validated Model (as JSON):"))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&card)?)?;
            Ok(Verdict::Passed)
        }
        Err(report) => {
            writeln!(out, "❌ VALIDATION FAILED\n")?;
            writeln!(out, "Validation errors ({}):", report.len())?;
            write!(out, "{}", render::THIN_RULE)?;
            for (idx, error) in report.errors.iter().enumerate() {
                write!(out, "{}", render::field_error(idx + 1, error))?;
            }
            writeln!(out, "\n{}", render::section("Raw JSON received:"))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&doc.body)?)?;
            Ok(Verdict::Failed)
        }
    }
}

/// Explain why the card could not be fetched
pub fn fetch_error(err: &A2aError, timeout: Duration) -> String {
    match err {
        A2aError::Timeout { .. } => format!(
            "❌ ERROR: Request timed out after {} seconds\n",
            timeout.as_secs()
        ),
        A2aError::Connection { url, source } => format!(
            "❌ ERROR: Failed to connect to {}\n   Details: {}\n",
            url, source
        ),
        A2aError::Http { status, body, .. } => format!(
            "❌ ERROR: HTTP error occurred\n   Status code: {}\n   Response: {}\n",
            status, body
        ),
        A2aError::InvalidJson { source, .. } => format!(
            "❌ ERROR: Invalid JSON response\n   Details: {}\n",
            source
        ),
        other => format!(
            "❌ ERROR: Unexpected error occurred\n   Type: {}\n   Details: {}\n",
            other.kind(),
            other
        ),
    }
}
