//! Autoplay policy. Hosts refuse audible autoplay until the user has
//! interacted, so every cue starts muted and playing, and the user's real
//! mute preference is only restored once the settle window has passed.

use tokio_util::sync::CancellationToken;

use crate::models::{Channel, SegmentDescriptor, VideoId};

use super::{controller::lock_slot, PlaybackAttempt, Scheduler, SessionState, SurfEvent};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

impl Scheduler {
    /// Cues `segment`, forces muted playback and commits the new
    /// channel/segment pair. The caller holds the session lock, so the pair
    /// is never observed half-updated.
    pub(super) fn cue_attempt(
        &self,
        state: &mut SessionState,
        channel: Channel,
        segment: SegmentDescriptor,
    ) {
        self.stop_watchdog();
        self.cancel_settle();

        state.attempt = PlaybackAttempt::Cueing(segment.id.clone());
        self.surface.cue_segment(&segment.cue_ref(), segment.section_start);
        self.surface.mute();
        self.surface.play();

        log_info!(
            "Tuned to {} ({}): video {} [{}s, {}s)",
            channel.name,
            channel.id,
            segment.id,
            segment.section_start,
            segment.section_end
        );

        state.current_channel = Some(channel.clone());
        state.current_segment = Some(segment.clone());
        state.is_muted = true;
        state.is_playing = false;
        state.ending = None;
        let epoch = state.begin_attempt(segment.id.clone());

        self.emit(SurfEvent::ChannelChanged {
            channel,
            segment: segment.clone(),
        });
        self.emit(SurfEvent::Buffering { active: true });

        self.start_settle(segment.id, epoch);
    }

    fn start_settle(&self, video_id: VideoId, epoch: u64) {
        let token = CancellationToken::new();
        {
            let mut slot = lock_slot(&self.settle);
            if let Some(previous) = slot.replace(token.clone()) {
                previous.cancel();
            }
        }

        let scheduler = self.clone();
        let window = self.settings.settle_window();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log_debug!("Settle window for video {video_id} cancelled");
                }
                _ = tokio::time::sleep(window) => {
                    scheduler.finish_settle(video_id, epoch).await;
                }
            }
        });
    }

    pub(super) fn cancel_settle(&self) {
        if let Some(token) = lock_slot(&self.settle).take() {
            token.cancel();
        }
    }

    async fn finish_settle(&self, video_id: VideoId, epoch: u64) {
        let mut state = self.state.lock().await;
        if !state.is_settling(epoch) || !state.powered {
            return;
        }

        if state.has_user_interacted && !state.user_muted {
            self.surface.unmute();
            state.is_muted = false;
            self.emit(SurfEvent::MuteChanged { muted: false });
        }

        state.attempt = PlaybackAttempt::Settled(video_id);
        if state.is_playing {
            self.emit(SurfEvent::Buffering { active: false });
        }
    }
}
