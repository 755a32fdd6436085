//! Segment watchdog. The widget never announces that a segment boundary was
//! reached, so a single polling loop reads the playback position and hands
//! over to the segment-end action once `section_end` is hit.

use std::sync::atomic::Ordering;

use tokio::time::{self, MissedTickBehavior};

use crate::{
    models::{SegmentDescriptor, VideoId},
    settings::SegmentEndAction,
};

use super::{
    controller::{lock_slot, WatchdogSlot},
    Scheduler, SessionState,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

impl Scheduler {
    /// Starts polling for the end of `segment`, replacing any running loop.
    pub(super) fn start_watchdog(&self, segment: SegmentDescriptor) {
        let mut slot = lock_slot(&self.watchdog);
        if let Some(previous) = slot.take() {
            previous.handle.abort();
        }

        let epoch = self.watchdog_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let video_id = segment.id.clone();
        let scheduler = self.clone();
        let handle = tokio::spawn(async move { scheduler.watch_segment(epoch, segment).await });

        *slot = Some(WatchdogSlot {
            epoch,
            video_id,
            handle,
        });
    }

    pub(super) fn stop_watchdog(&self) {
        if let Some(previous) = lock_slot(&self.watchdog).take() {
            previous.handle.abort();
        }
    }

    /// Whether a watchdog loop is currently registered.
    pub fn watchdog_active(&self) -> bool {
        lock_slot(&self.watchdog).is_some()
    }

    /// Stops the loop watching `video_id` and claims its segment end.
    /// Whoever claims it owns the segment-end transition, so it fires at
    /// most once per segment.
    pub(super) fn claim_watchdog(&self, state: &mut SessionState, video_id: &VideoId) -> bool {
        if state.is_ending(video_id) {
            return false;
        }
        let mut slot = lock_slot(&self.watchdog);
        match slot.as_ref() {
            Some(current) if &current.video_id == video_id => {
                if let Some(claimed) = slot.take() {
                    claimed.handle.abort();
                }
                state.ending = Some(video_id.clone());
                true
            }
            _ => false,
        }
    }

    /// Removes this loop's own registration. False means it was superseded.
    fn release_watchdog(&self, epoch: u64) -> bool {
        let mut slot = lock_slot(&self.watchdog);
        match slot.as_ref() {
            Some(current) if current.epoch == epoch => {
                slot.take();
                true
            }
            _ => false,
        }
    }

    async fn watch_segment(&self, epoch: u64, segment: SegmentDescriptor) {
        let mut ticker = time::interval(self.settings.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let mut state = self.state.lock().await;
            let still_current = state
                .current_segment
                .as_ref()
                .is_some_and(|current| current.id == segment.id);
            if !still_current || !state.powered || state.is_ending(&segment.id) {
                self.release_watchdog(epoch);
                return;
            }

            let position = self.surface.position();
            log_debug!(
                "Watchdog video {}: position {position:.1}s of {}s",
                segment.id,
                segment.section_end
            );

            if !segment.is_finished_at(position) {
                continue;
            }

            // The end is claimed under the session lock; PLAYING notifications
            // during the hand-off see it and do not start another loop. Once
            // released, nobody holds this task's handle, so the transition
            // below cannot be aborted halfway.
            if !self.release_watchdog(epoch) {
                return;
            }
            state.ending = Some(segment.id.clone());
            break;
        }

        log_info!("Segment {} reached its end", segment.id);
        self.on_segment_end(segment).await;
    }

    pub(super) async fn on_segment_end(&self, segment: SegmentDescriptor) {
        let result = match self.settings.on_segment_end {
            SegmentEndAction::NextChannel => self.advance(1).await.map(|_| ()),
            SegmentEndAction::NextVideo => self.continue_segment(&segment).await.map(|_| ()),
        };

        if let Err(err) = result {
            log_warn!("Auto-advance after video {} failed: {err}", segment.id);
        }
    }
}
