//! The playback surface: the embeddable widget the scheduler drives.
//!
//! Commands are synchronous fire-and-forget calls. The widget answers on its
//! own timeline through [`SurfaceEvent`]s delivered over a channel.

mod simulated;

pub use simulated::SimulatedSurface;

use serde::{de, Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

impl PlaybackState {
    /// Maps the numeric codes used by iframe-style widget APIs.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(PlaybackState::Unstarted),
            0 => Some(PlaybackState::Ended),
            1 => Some(PlaybackState::Playing),
            2 => Some(PlaybackState::Paused),
            3 => Some(PlaybackState::Buffering),
            5 => Some(PlaybackState::Cued),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "unstarted" => Some(PlaybackState::Unstarted),
            "ended" => Some(PlaybackState::Ended),
            "playing" => Some(PlaybackState::Playing),
            "paused" => Some(PlaybackState::Paused),
            "buffering" => Some(PlaybackState::Buffering),
            "cued" => Some(PlaybackState::Cued),
            _ => None,
        }
    }
}

/// Accepts either the state name or the widget's numeric code, so bridges
/// can forward raw widget notifications.
impl<'de> Deserialize<'de> for PlaybackState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(i32),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Code(code) => PlaybackState::from_code(code)
                .ok_or_else(|| de::Error::custom(format!("unknown playback state code {code}"))),
            Raw::Name(name) => PlaybackState::from_name(&name)
                .ok_or_else(|| de::Error::custom(format!("unknown playback state '{name}'"))),
        }
    }
}

/// Asynchronous notifications pushed by the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SurfaceEvent {
    Ready,
    StateChange { state: PlaybackState },
    Error { code: i32 },
}

pub trait PlaybackSurface: Send + Sync {
    /// Loads `source_ref` positioned at `start_seconds`. Safe to call repeatedly.
    fn cue_segment(&self, source_ref: &str, start_seconds: f64);
    fn play(&self);
    fn pause(&self);
    fn mute(&self);
    fn unmute(&self);
    fn is_muted(&self) -> bool;
    /// Volume in `0..=100`.
    fn volume(&self) -> u8;
    fn set_volume(&self, volume: u8);
    /// Playback offset in seconds. Only meaningful once a playing or paused
    /// state has been reported.
    fn position(&self) -> f64;
    fn playback_state(&self) -> PlaybackState;
}
