//! The channel directory: the remote catalog that owns channels and decides
//! which segment is airing on each of them.

mod http;
mod memory;

pub use http::HttpChannelDirectory;
pub use memory::{CatalogChannel, CatalogFile, CatalogVideo, InMemoryDirectory};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Channel, SegmentDescriptor, VideoId};

/// Server-side policy flags exposed by the directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConfig {
    #[serde(default)]
    pub readonly: bool,
}

#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// The full, ordered channel list.
    async fn fetch_channels(&self) -> Result<Vec<Channel>>;

    /// The segment airing on `channel_id`, or the one following `prior` when given.
    /// `Ok(None)` means the channel currently has nothing to show.
    async fn fetch_current_video(
        &self,
        channel_id: i64,
        prior: Option<&VideoId>,
    ) -> Result<Option<SegmentDescriptor>>;

    /// Removes a video from future rotation. Returns the directory's acknowledgement.
    async fn invalidate_video(&self, video_id: &VideoId) -> Result<bool>;

    /// Replaces the whole catalog with the list published at `video_list_url`.
    async fn submit_list(&self, video_list_url: &str) -> Result<bool>;

    async fn fetch_config(&self) -> Result<DirectoryConfig>;
}
