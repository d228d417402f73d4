use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli_args::CommandLineArgs;
use crate::common::constants::{ACCEPT_LANGUAGE, CLIENT_VERSION, HTTP_TIMEOUT_SECS, USER_AGENT};
use crate::youtube_utils::CookieSource;

fn default_user_agent() -> String {
    USER_AGENT.to_string()
}

fn default_timeout() -> u64 {
    HTTP_TIMEOUT_SECS
}

fn default_accept_language() -> String {
    ACCEPT_LANGUAGE.to_string()
}

fn default_client_version() -> String {
    CLIENT_VERSION.to_string()
}

/// HTTP tuning, optionally read from a JSON settings file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            http_timeout_secs: default_timeout(),
            accept_language: default_accept_language(),
            client_version: default_client_version(),
        }
    }
}

impl HttpSettings {
    pub fn load(settings_file: &Path) -> Result<Self> {
        if !settings_file.exists() {
            return Err(anyhow::anyhow!(
                "settings file not found at '{}'. Exiting...",
                settings_file.display()
            ));
        }

        let contents = fs::read_to_string(settings_file).with_context(|| {
            format!("Failed to read settings file: {}", settings_file.display())
        })?;

        let settings: HttpSettings = serde_json::from_str(&contents).with_context(|| {
            format!("Failed to parse settings file: {}", settings_file.display())
        })?;

        info!("Settings loaded from '{}'.", settings_file.display());
        Ok(settings)
    }
}

/// Everything a run needs, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub output_dir: PathBuf,
    pub post_archive: Option<PathBuf>,
    pub track_dates: bool,
    pub reverse: bool,
    pub skip_download: bool,
    pub cookies: CookieSource,
    pub http: HttpSettings,
}

impl Settings {
    pub fn from_args(args: &CommandLineArgs) -> Result<Self> {
        let http = match &args.settings {
            Some(path) => HttpSettings::load(path)?,
            None => {
                debug!("No settings file given, using default HTTP settings");
                HttpSettings::default()
            }
        };

        let output_dir = match &args.directory {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };

        Ok(Self {
            output_dir,
            post_archive: args.post_archive.clone(),
            track_dates: args.dates,
            reverse: args.reverse,
            skip_download: args.skip_download,
            cookies: args
                .cookies
                .clone()
                .map_or(CookieSource::Defaults, CookieSource::File),
            http,
        })
    }
}
