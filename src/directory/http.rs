use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Channel, SegmentDescriptor, VideoId};

use super::{ChannelDirectory, DirectoryConfig};

#[derive(Deserialize)]
struct ChannelsResponse {
    channels: Vec<Channel>,
}

#[derive(Deserialize)]
struct CurrentVideoResponse {
    video: Option<SegmentDescriptor>,
}

#[derive(Deserialize)]
struct SuccessResponse {
    success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitListRequest<'a> {
    video_list_url: &'a str,
}

/// Talks to the catalog service over its JSON HTTP API.
#[derive(Clone)]
pub struct HttpChannelDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChannelDirectory {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("channel-surf/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build directory HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ChannelDirectory for HttpChannelDirectory {
    async fn fetch_channels(&self) -> Result<Vec<Channel>> {
        let response = self
            .client
            .get(self.endpoint("channels"))
            .send()
            .await
            .context("Failed to request channel list")?
            .error_for_status()
            .context("Directory rejected channel list request")?;

        let body: ChannelsResponse = response
            .json()
            .await
            .context("Failed to parse channel list")?;

        Ok(body.channels)
    }

    async fn fetch_current_video(
        &self,
        channel_id: i64,
        prior: Option<&VideoId>,
    ) -> Result<Option<SegmentDescriptor>> {
        let mut query = vec![("channel-id", channel_id.to_string())];
        if let Some(prior) = prior {
            query.push(("video-id", prior.to_string()));
        }

        let response = self
            .client
            .get(self.endpoint("current-video"))
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to request current video for channel {channel_id}"))?
            .error_for_status()
            .with_context(|| format!("Directory rejected current video for channel {channel_id}"))?;

        let body: CurrentVideoResponse = response
            .json()
            .await
            .context("Failed to parse current video")?;

        Ok(body.video)
    }

    async fn invalidate_video(&self, video_id: &VideoId) -> Result<bool> {
        let response = self
            .client
            .delete(self.endpoint("invalidate-video"))
            .query(&[("video-id", video_id.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to request invalidation of video {video_id}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "directory refused to invalidate video {video_id}: {}",
                response.status()
            ));
        }

        let body: SuccessResponse = response
            .json()
            .await
            .context("Failed to parse invalidation response")?;

        Ok(body.success)
    }

    async fn submit_list(&self, video_list_url: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.endpoint("submit-list"))
            .json(&SubmitListRequest { video_list_url })
            .send()
            .await
            .context("Failed to submit video list")?
            .error_for_status()
            .context("Directory rejected video list")?;

        let body: SuccessResponse = response
            .json()
            .await
            .context("Failed to parse submit-list response")?;

        Ok(body.success)
    }

    async fn fetch_config(&self) -> Result<DirectoryConfig> {
        let response = self
            .client
            .get(self.endpoint("config"))
            .send()
            .await
            .context("Failed to request directory config")?
            .error_for_status()
            .context("Directory rejected config request")?;

        response
            .json()
            .await
            .context("Failed to parse directory config")
    }
}
