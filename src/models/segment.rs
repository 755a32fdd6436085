use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Deserializer, Serialize};

/// Catalog identifier of a video. The directory may hand these out as JSON
/// numbers or strings; both are normalised to their string form.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for VideoId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for VideoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for VideoId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => VideoId::from(n),
            Raw::Text(s) => VideoId(s),
        })
    }
}

/// One playable excerpt `[section_start, section_end)` of an external video.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDescriptor {
    pub id: VideoId,
    #[serde(alias = "url")]
    pub source_ref: String,
    pub section_start: f64,
    pub section_end: f64,
}

impl SegmentDescriptor {
    pub fn new(
        id: impl Into<VideoId>,
        source_ref: impl Into<String>,
        section_start: f64,
        section_end: f64,
    ) -> Self {
        Self {
            id: id.into(),
            source_ref: source_ref.into(),
            section_start,
            section_end,
        }
    }

    /// A segment is playable only when its window is non-empty.
    pub fn is_valid(&self) -> bool {
        self.section_start.is_finite()
            && self.section_end.is_finite()
            && self.section_start >= 0.0
            && self.section_start < self.section_end
    }

    /// Whether a playback offset has reached the end of the window (inclusive).
    pub fn is_finished_at(&self, position: f64) -> bool {
        position >= self.section_end
    }

    /// The reference handed to the playback surface when cueing.
    ///
    /// YouTube watch and short links are reduced to the bare video key; any
    /// other reference is passed through untouched.
    pub fn cue_ref(&self) -> String {
        extract_video_key(&self.source_ref).unwrap_or_else(|| self.source_ref.clone())
    }
}

fn extract_video_key(source_ref: &str) -> Option<String> {
    let url = Url::parse(source_ref).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");

    let key = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "m.youtube.com" | "music.youtube.com" => {
            if url.path() == "/watch" {
                url.query_pairs()
                    .find(|(name, _)| name == "v")
                    .map(|(_, value)| value.into_owned())
            } else {
                let mut segments = url.path_segments()?;
                match segments.next() {
                    Some("embed") | Some("shorts") | Some("live") => {
                        segments.next().map(str::to_string)
                    }
                    _ => None,
                }
            }
        }
        _ => None,
    };

    key.filter(|k| !k.is_empty())
}
