use crate::domain::BookingIntent;
use crate::infrastructure::SubmissionHook;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Appends every booking intent to a JSON-lines file.
pub struct IntentLogHook {
    path: PathBuf,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogLine<'a> {
    logged_at: String,
    property_id: &'a str,
    #[serde(flatten)]
    intent: &'a BookingIntent,
}

impl IntentLogHook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SubmissionHook for IntentLogHook {
    fn on_booking_intent(&self, property_id: &str, intent: &BookingIntent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let line = LogLine {
            logged_at: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            property_id,
            intent,
        };
        writeln!(file, "{}", serde_json::to_string(&line)?)?;

        Ok(())
    }

    fn name(&self) -> &str {
        "Intent Log"
    }

    fn required(&self) -> bool {
        false
    }
}
