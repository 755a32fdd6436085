use crate::models::Channel;

use super::{Scheduler, SurfError, SurfEvent, SurfResult};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

impl Scheduler {
    /// Records that the user touched a control. Only the first call has an
    /// effect; the flag is never cleared.
    pub async fn mark_interaction(&self) {
        if self.state.lock().await.mark_interaction() {
            log_info!("First user interaction; audio may be restored after settling");
        }
    }

    pub async fn channel_up(&self) -> SurfResult<Channel> {
        self.mark_interaction().await;
        self.advance(1).await
    }

    pub async fn channel_down(&self) -> SurfResult<Channel> {
        self.mark_interaction().await;
        self.advance(-1).await
    }

    pub async fn channel_jump(&self, channel_id: i64) -> SurfResult<Channel> {
        self.mark_interaction().await;
        self.jump(channel_id).await
    }

    pub async fn volume_up(&self) -> u8 {
        self.mark_interaction().await;
        self.set_volume_step(1).await
    }

    pub async fn volume_down(&self) -> u8 {
        self.mark_interaction().await;
        self.set_volume_step(-1).await
    }

    pub async fn mute_toggle(&self) -> bool {
        self.mark_interaction().await;
        self.toggle_mute().await
    }

    pub async fn power_toggle(&self) -> bool {
        self.mark_interaction().await;
        self.toggle_power().await
    }

    /// Moves the volume one step in `direction`, clamped to `0..=100`.
    /// Turning the knob always unmutes. Returns the applied volume.
    pub async fn set_volume_step(&self, direction: i8) -> u8 {
        let mut state = self.state.lock().await;

        let step = i16::from(self.settings.volume_step) * i16::from(direction.signum());
        let volume = (i16::from(self.surface.volume()) + step).clamp(0, 100) as u8;
        self.surface.set_volume(volume);
        self.surface.unmute();

        let was_muted = state.is_muted;
        state.is_muted = false;
        state.user_muted = false;

        self.emit(SurfEvent::VolumeChanged { volume });
        if was_muted {
            self.emit(SurfEvent::MuteChanged { muted: false });
        }
        volume
    }

    /// Flips the mute state without touching the volume. Returns the new state.
    pub async fn toggle_mute(&self) -> bool {
        let mut state = self.state.lock().await;

        let muted = !state.is_muted;
        if muted {
            self.surface.mute();
        } else {
            self.surface.unmute();
        }
        state.is_muted = muted;
        state.user_muted = muted;

        self.emit(SurfEvent::MuteChanged { muted });
        muted
    }

    /// Switches playback off or back on. Returns whether it is now on.
    ///
    /// Switching on re-tunes the current channel, since what airs on a
    /// channel moves on while the set is off.
    pub async fn toggle_power(&self) -> bool {
        {
            let mut state = self.state.lock().await;
            state.powered = !state.powered;

            if !state.powered {
                state.supersede_navigation();
                self.stop_watchdog();
                self.cancel_settle();
                self.surface.pause();
                state.is_playing = false;
                self.emit(SurfEvent::PowerChanged { on: false });
                self.emit(SurfEvent::Buffering { active: true });
                log_info!("Powered off");
                return false;
            }
        }

        self.emit(SurfEvent::PowerChanged { on: true });
        log_info!("Powered on");

        match self.refresh().await {
            Ok(_) | Err(SurfError::NotStarted) | Err(SurfError::Superseded) => {}
            Err(err) => {
                log_warn!("Could not re-tune after power on, resuming previous video: {err}");
                self.surface.play();
            }
        }
        true
    }

    /// Asks the directory to replace its catalog with the list at `video_list_url`.
    pub async fn submit_list(&self, video_list_url: &str) -> SurfResult<bool> {
        if self.state.lock().await.readonly {
            return Err(SurfError::ReadOnly);
        }

        let replaced = self.directory.submit_list(video_list_url).await?;
        if replaced {
            log_info!("Catalog replaced from {video_list_url}");
            self.emit(SurfEvent::CatalogReplaced);
        }
        Ok(replaced)
    }
}
