// ABOUTME: Check whether a newer release is available

use crate::config;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ReleaseNote {
    #[serde(rename = "Message")]
    latest: String,
    #[serde(rename = "Info", default)]
    info: ReleaseInfo,
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseInfo {
    #[serde(rename = "details", default)]
    details: String,
    #[serde(rename = "date", default)]
    date: String,
}

/// Asks the release endpoint for the latest version and renders a short
/// notice. Every failure degrades to a printable message; the check never
/// stops the interpreter.
pub fn check_latest() -> String {
    match fetch() {
        Ok(note) => {
            if note.latest == config::VERSION {
                " (latest version)".to_string()
            } else {
                format!(
                    "\nA newer release is available: {} ({})\n  {}\nDownload it from {}",
                    note.latest, note.info.date, note.info.details, config::DOWNLOAD_URL
                )
            }
        }
        Err(message) => format!(" (release check failed: {})", message),
    }
}

fn fetch() -> Result<ReleaseNote, String> {
    let response = ureq::get(config::RELEASE_URL)
        .timeout(Duration::from_secs(3))
        .call()
        .map_err(|error| error.to_string())?;
    response
        .into_json::<ReleaseNote>()
        .map_err(|error| error.to_string())
}
