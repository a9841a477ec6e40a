use crate::ballot_box::*;

use seat_tally::TallyRules;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// The configuration file, in JSON.
///
/// ```text
/// {
///   "contestName": "Board election",
///   "dataDirectory": "data",
///   "seats": 14,
///   "ranksRequired": 14,
///   "adminSecret": "..."
/// }
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct BoxConfig {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    #[serde(rename = "dataDirectory")]
    pub data_directory: Option<String>,
    pub seats: Option<u32>,
    #[serde(rename = "ranksRequired")]
    pub ranks_required: Option<usize>,
    #[serde(rename = "adminSecret")]
    pub admin_secret: Option<String>,
}

pub fn read_config(path: &str) -> BoxResult<BoxConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: BoxConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

/// The resolved settings of a running ballot box.
#[derive(Eq, PartialEq, Clone)]
pub struct Settings {
    pub contest_name: Option<String>,
    pub data_dir: PathBuf,
    pub seats: u32,
    pub ranks_required: usize,
    /// Privileged calls are refused when no secret is configured.
    pub admin_secret: Option<String>,
}

impl Settings {
    pub const DEFAULT_DATA_DIR: &'static str = "data";

    pub fn from_config(config: &BoxConfig) -> Settings {
        let defaults = TallyRules::DEFAULT_RULES;
        Settings {
            contest_name: config.contest_name.clone(),
            data_dir: PathBuf::from(
                config
                    .data_directory
                    .clone()
                    .unwrap_or_else(|| Settings::DEFAULT_DATA_DIR.to_string()),
            ),
            seats: config.seats.unwrap_or(defaults.seats),
            ranks_required: config.ranks_required.unwrap_or(defaults.ranks_required),
            admin_secret: config.admin_secret.clone().filter(|s| !s.is_empty()),
        }
    }

    pub fn with_admin_secret(mut self, secret: &str) -> Settings {
        self.admin_secret = Some(secret.to_string()).filter(|s| !s.is_empty());
        self
    }

    pub fn rules(&self) -> TallyRules {
        TallyRules {
            seats: self.seats,
            ranks_required: self.ranks_required,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::from_config(&BoxConfig::default())
    }
}

// The secret never shows up in the logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("contest_name", &self.contest_name)
            .field("data_dir", &self.data_dir)
            .field("seats", &self.seats)
            .field("ranks_required", &self.ranks_required)
            .field(
                "admin_secret",
                &self.admin_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
