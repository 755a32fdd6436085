use std::{fs, path::Path, sync::Mutex};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::models::{Channel, SegmentDescriptor, VideoId};

use super::{ChannelDirectory, DirectoryConfig};

/// On-disk channel list, the same shape the catalog service accepts on submit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    pub channels: Vec<CatalogChannel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogChannel {
    pub name: String,
    #[serde(default)]
    pub videos: Vec<CatalogVideo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogVideo {
    #[serde(alias = "id")]
    pub url: String,
    #[serde(alias = "segmentStart")]
    pub section_start: f64,
    #[serde(alias = "segmentEnd")]
    pub section_end: f64,
}

impl CatalogFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))
    }
}

struct CatalogEntry {
    channel: Channel,
    videos: Vec<SegmentDescriptor>,
}

#[derive(Default)]
struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    fn from_file(file: CatalogFile) -> Self {
        let mut next_video_id: i64 = 1;
        let entries = file
            .channels
            .into_iter()
            .zip(1i64..)
            .map(|(channel, channel_id)| {
                let videos = channel
                    .videos
                    .into_iter()
                    .map(|video| {
                        let id = next_video_id;
                        next_video_id += 1;
                        SegmentDescriptor::new(id, video.url, video.section_start, video.section_end)
                    })
                    .collect();
                CatalogEntry {
                    channel: Channel::new(channel_id, channel.name),
                    videos,
                }
            })
            .collect();

        Self { entries }
    }

    fn entry(&self, channel_id: i64) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.channel.id == channel_id)
    }
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// A catalog held entirely in memory, loaded from a channel-list file.
///
/// Each channel airs its videos back to back on a loop anchored at the Unix
/// epoch, so the current video depends on the clock. Asking with a prior
/// video yields the one after it from its section start, wrapping around.
pub struct InMemoryDirectory {
    catalog: Mutex<Catalog>,
    config: DirectoryConfig,
    clock: Clock,
}

/// The video airing `now` seconds into the channel's loop, with its
/// section start moved forward to the second currently on air.
fn airing_at(videos: &[SegmentDescriptor], now: i64) -> Option<SegmentDescriptor> {
    let length = |video: &SegmentDescriptor| (video.section_end - video.section_start).max(0.0) as i64;

    let total: i64 = videos.iter().map(length).sum();
    if total <= 0 {
        return videos.first().cloned();
    }

    let mut point = now.rem_euclid(total);
    for video in videos {
        let section = length(video);
        if point < section {
            let mut airing = video.clone();
            airing.section_start += point as f64;
            return Some(airing);
        }
        point -= section;
    }
    videos.first().cloned()
}

impl InMemoryDirectory {
    pub fn new(file: CatalogFile) -> Self {
        Self {
            catalog: Mutex::new(Catalog::from_file(file)),
            config: DirectoryConfig::default(),
            clock: Box::new(|| Utc::now().timestamp()),
        }
    }

    /// Replaces the wall clock (Unix seconds) used to pick the airing video.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Ok(Self::new(CatalogFile::load(path)?))
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.config.readonly = readonly;
        self
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Catalog>> {
        self.catalog
            .lock()
            .map_err(|_| anyhow!("catalog lock poisoned"))
    }
}

#[async_trait]
impl ChannelDirectory for InMemoryDirectory {
    async fn fetch_channels(&self) -> Result<Vec<Channel>> {
        let catalog = self.lock()?;
        Ok(catalog
            .entries
            .iter()
            .map(|entry| entry.channel.clone())
            .collect())
    }

    async fn fetch_current_video(
        &self,
        channel_id: i64,
        prior: Option<&VideoId>,
    ) -> Result<Option<SegmentDescriptor>> {
        let catalog = self.lock()?;
        let Some(entry) = catalog.entry(channel_id) else {
            return Ok(None);
        };

        let Some(prior) = prior else {
            return Ok(airing_at(&entry.videos, (self.clock)()));
        };

        let next_index = entry
            .videos
            .iter()
            .position(|video| &video.id == prior)
            .map(|index| (index + 1) % entry.videos.len())
            .unwrap_or(0);

        Ok(entry.videos.get(next_index).cloned())
    }

    async fn invalidate_video(&self, video_id: &VideoId) -> Result<bool> {
        let mut catalog = self.lock()?;
        let mut removed = false;
        for entry in catalog.entries.iter_mut() {
            let before = entry.videos.len();
            entry.videos.retain(|video| &video.id != video_id);
            removed |= entry.videos.len() != before;
        }
        Ok(removed)
    }

    async fn submit_list(&self, video_list_url: &str) -> Result<bool> {
        if self.config.readonly {
            return Err(anyhow!("catalog is in read-only mode"));
        }

        let file: CatalogFile =
            if video_list_url.starts_with("http://") || video_list_url.starts_with("https://") {
                reqwest::get(video_list_url)
                    .await
                    .with_context(|| format!("Failed to download video list {video_list_url}"))?
                    .error_for_status()?
                    .json()
                    .await
                    .context("Failed to parse downloaded video list")?
            } else {
                CatalogFile::load(Path::new(video_list_url))?
            };

        if file.channels.is_empty() {
            return Ok(false);
        }

        *self.lock()? = Catalog::from_file(file);
        Ok(true)
    }

    async fn fetch_config(&self) -> Result<DirectoryConfig> {
        Ok(self.config.clone())
    }
}
