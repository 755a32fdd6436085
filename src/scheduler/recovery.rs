use super::{Scheduler, SurfEvent, SurfResult};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

impl Scheduler {
    /// Handles a widget playback error: the failing video is reported to the
    /// directory and the scheduler skips to the next channel.
    ///
    /// Every error code is handled the same way since the widget's codes do
    /// not tell a transient failure from a permanent one. A failed
    /// invalidation is logged and does not hold up the skip.
    pub async fn recover_from_error(&self, code: i32) -> SurfResult<()> {
        let failing = {
            let mut state = self.state.lock().await;
            if !state.started || !state.powered {
                return Ok(());
            }

            match state.current_segment.as_ref().map(|segment| segment.id.clone()) {
                Some(id) if state.recovering.as_ref() == Some(&id) => {
                    log_info!("Already recovering from video {id}; ignoring error {code}");
                    return Ok(());
                }
                Some(id) => {
                    state.recovering = Some(id.clone());
                    state.is_playing = false;
                    Some(id)
                }
                None => None,
            }
        };

        log_warn!(
            "Playback error {code} on video {}",
            failing.as_ref().map_or("<none>".to_string(), |id| id.to_string())
        );

        self.stop_watchdog();
        self.cancel_settle();
        self.emit(SurfEvent::Buffering { active: true });

        if let Some(video_id) = &failing {
            let acknowledged = match self.directory.invalidate_video(video_id).await {
                Ok(acknowledged) => acknowledged,
                Err(err) => {
                    log_error!("Failed to invalidate video {video_id}: {err:#}");
                    false
                }
            };
            self.emit(SurfEvent::SegmentInvalidated {
                video_id: video_id.clone(),
                acknowledged,
            });
        }

        let result = self.advance(1).await;

        if let Some(video_id) = failing {
            let mut state = self.state.lock().await;
            if state.recovering.as_ref() == Some(&video_id) {
                state.recovering = None;
            }
        }

        result.map(|_| ())
    }
}
