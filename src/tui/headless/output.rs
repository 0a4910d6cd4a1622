//! Output formatting for headless mode.

use super::HeadlessResult;
use crate::cli::OutputFormat;
use crate::session::{Banner, BannerLevel, Turn, TurnRole};
use serde::Serialize;

/// JSON output structure.
#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    connected: bool,
    db_name: Option<&'a str>,
    banners: &'a [Banner],
    turns: &'a [Turn],
    questions_failed: usize,
    duration_ms: u64,
}

fn level_label(level: BannerLevel) -> &'static str {
    match level {
        BannerLevel::Success => "SUCCESS",
        BannerLevel::Info => "INFO",
        BannerLevel::Warning => "WARNING",
        BannerLevel::Error => "ERROR",
    }
}

/// Formats headless execution results.
pub struct HeadlessOutput {
    format: OutputFormat,
}

impl HeadlessOutput {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the result according to the configured format.
    pub fn format(&self, result: &HeadlessResult) -> String {
        match self.format {
            OutputFormat::Text => self.format_text(result),
            OutputFormat::Json => self.format_json(result),
        }
    }

    /// Banners first, then one block per turn.
    fn format_text(&self, result: &HeadlessResult) -> String {
        let mut out = String::new();

        for banner in &result.banners {
            out.push_str(&format!("[{}] {}\n", level_label(banner.level), banner.text));
        }

        for turn in &result.turns {
            let label = match turn.role {
                TurnRole::Human => "[Human]",
                TurnRole::Ai => "[AI]",
            };
            out.push_str(&format!("\n{label}\n{}\n", turn.content));
        }

        out
    }

    fn format_json(&self, result: &HeadlessResult) -> String {
        let json_output = JsonOutput {
            connected: result.connected,
            db_name: result.db_name.as_deref(),
            banners: &result.banners,
            turns: &result.turns,
            questions_failed: result.questions_failed,
            duration_ms: result.duration.as_millis() as u64,
        };

        let mut json = serde_json::to_string_pretty(&json_output)
            .unwrap_or_else(|e| format!("{{\"error\": \"Failed to serialize: {}\"}}", e));
        json.push('\n');
        json
    }
}
