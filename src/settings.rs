use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH_ENV: &str = "CHANNEL_SURF_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "channel-surf.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum StartChannel {
    #[default]
    Random,
    First,
}

/// What happens when the watchdog sees a segment finish.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SegmentEndAction {
    /// Flip to the next channel in the rotation.
    #[default]
    NextChannel,
    /// Stay on the channel and play the video that follows.
    NextVideo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfSettings {
    pub directory_url: String,
    /// Serve channels from a local channel-list file instead of `directory_url`.
    pub catalog_file: Option<PathBuf>,
    pub settle_window_ms: u64,
    pub poll_interval_ms: u64,
    pub volume_step: u8,
    pub initial_volume: u8,
    pub start_channel: StartChannel,
    pub on_segment_end: SegmentEndAction,
    pub max_replacement_attempts: u32,
    pub start_muted: bool,
}

impl Default for SurfSettings {
    fn default() -> Self {
        Self {
            directory_url: "http://localhost:8081".into(),
            catalog_file: None,
            settle_window_ms: 3_500,
            poll_interval_ms: 1_000,
            volume_step: 5,
            initial_volume: 50,
            start_channel: StartChannel::Random,
            on_segment_end: SegmentEndAction::NextChannel,
            max_replacement_attempts: 3,
            start_muted: false,
        }
    }
}

impl SurfSettings {
    /// Reads the settings file named by `CHANNEL_SURF_CONFIG` (or
    /// `channel-surf.json` in the working directory), then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let path = env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut settings = Self::from_file(&path)?;
        settings.apply_env(|key| env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        Ok(serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(
                "Ignoring malformed settings file {}: {err}",
                path.display()
            );
            Self::default()
        }))
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("CHANNEL_SURF_DIRECTORY_URL") {
            self.directory_url = url;
        }
        if let Some(catalog) = var("CHANNEL_SURF_CATALOG") {
            self.catalog_file = Some(PathBuf::from(catalog));
        }

        let debug_mode = var("CHANNEL_SURF_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            self.settle_window_ms = 500;
            self.poll_interval_ms = 250;
        }
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // A zero period would make the watchdog spin.
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
