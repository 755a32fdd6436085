use anyhow::Result;

use crate::models::{Channel, SegmentDescriptor, VideoId};

use super::{state::wrap_index, Scheduler, SurfError, SurfEvent, SurfResult};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Where a navigation request is headed.
enum Target {
    Relative(i64),
    Channel(i64),
    /// Re-fetch whatever is airing on the current channel.
    Current,
}

impl Scheduler {
    /// Moves `offset` channels through the rotation, wrapping in both
    /// directions. With a single channel this re-fetches and re-cues it.
    pub async fn advance(&self, offset: i64) -> SurfResult<Channel> {
        self.navigate(Target::Relative(offset), None).await
    }

    pub async fn jump(&self, channel_id: i64) -> SurfResult<Channel> {
        self.navigate(Target::Channel(channel_id), None).await
    }

    /// Re-tunes the current channel, picking up whatever airs on it now.
    pub async fn refresh(&self) -> SurfResult<Channel> {
        self.navigate(Target::Current, None).await
    }

    /// Plays the video that follows `finished` on the same channel, falling
    /// back to the next channel when the directory has nothing further.
    pub async fn continue_segment(&self, finished: &SegmentDescriptor) -> SurfResult<Channel> {
        match self.navigate(Target::Current, Some(finished.id.clone())).await {
            Err(SurfError::NoContent { channel_id }) => {
                log_info!("Channel {channel_id} has nothing after video {}; moving on", finished.id);
                self.advance(1).await
            }
            Err(SurfError::Directory(err)) => {
                self.release_ending(&finished.id).await;
                Err(SurfError::Directory(err))
            }
            other => other,
        }
    }

    async fn release_ending(&self, video_id: &VideoId) {
        let mut state = self.state.lock().await;
        if state.is_ending(video_id) {
            state.ending = None;
        }
    }

    async fn navigate(&self, target: Target, prior: Option<VideoId>) -> SurfResult<Channel> {
        let (seq, channel) = {
            let mut state = self.state.lock().await;
            if !state.started {
                return Err(SurfError::NotStarted);
            }
            if !state.powered {
                return Err(SurfError::PoweredOff);
            }

            let count = state.channels.len();
            let index = match target {
                Target::Relative(offset) => wrap_index(state.navigation_base(), offset, count),
                Target::Channel(channel_id) => state
                    .channel_index(channel_id)
                    .ok_or(SurfError::UnknownChannel(channel_id))?,
                Target::Current => state.navigation_base(),
            };

            let channel = state.channels[index].clone();
            (state.begin_navigation(index), channel)
        };

        let continuation = prior.is_some();
        let resolved = self.resolve_segment(channel.id, prior).await;

        let mut state = self.state.lock().await;
        if !state.is_latest_navigation(seq) {
            log_info!("Discarding stale result for channel {}", channel.id);
            return Err(SurfError::Superseded);
        }
        state.finish_navigation(seq);

        if !state.powered {
            return Err(SurfError::PoweredOff);
        }

        // A failed plain navigation hands the segment back to the watchdog.
        // Continuations keep the claim while they fall back to the next channel.
        if !continuation && !matches!(resolved, Ok(Some(_))) {
            state.ending = None;
        }

        match resolved {
            Ok(Some(segment)) => {
                self.cue_attempt(&mut state, channel.clone(), segment);
                Ok(channel)
            }
            Ok(None) => {
                log_warn!("No content on channel {} ({})", channel.name, channel.id);
                self.emit(SurfEvent::NoContent {
                    channel_id: channel.id,
                });
                Err(SurfError::NoContent {
                    channel_id: channel.id,
                })
            }
            Err(err) => {
                log_warn!("Directory unavailable for channel {}: {err:#}", channel.id);
                Err(SurfError::Directory(err))
            }
        }
    }

    /// Fetches a playable segment for the channel. Segments with an empty
    /// window are invalidated and replaced, up to the configured attempts.
    async fn resolve_segment(
        &self,
        channel_id: i64,
        prior: Option<VideoId>,
    ) -> Result<Option<SegmentDescriptor>> {
        let mut prior = prior;
        for _ in 0..=self.settings.max_replacement_attempts {
            let Some(segment) = self
                .directory
                .fetch_current_video(channel_id, prior.as_ref())
                .await?
            else {
                return Ok(None);
            };

            if segment.is_valid() {
                return Ok(Some(segment));
            }

            log_warn!(
                "Video {} on channel {channel_id} has an empty window [{}, {}); requesting a replacement",
                segment.id,
                segment.section_start,
                segment.section_end
            );
            if let Err(err) = self.directory.invalidate_video(&segment.id).await {
                log_warn!("Failed to invalidate video {}: {err:#}", segment.id);
            }
            prior = Some(segment.id);
        }

        Ok(None)
    }
}
