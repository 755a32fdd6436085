use std::sync::{
    atomic::AtomicU64,
    Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard,
};

use rand::Rng;
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    directory::ChannelDirectory,
    models::{Channel, VideoId},
    settings::{StartChannel, SurfSettings},
    surface::{PlaybackState, PlaybackSurface, SurfaceEvent},
};

use super::{SessionSnapshot, SessionState, SurfError, SurfEvent, SurfResult};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

pub(super) struct WatchdogSlot {
    pub(super) epoch: u64,
    pub(super) video_id: VideoId,
    pub(super) handle: JoinHandle<()>,
}

/// Owns the session and drives the playback surface.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct Scheduler {
    pub(super) state: Arc<Mutex<SessionState>>,
    pub(super) surface: Arc<dyn PlaybackSurface>,
    pub(super) directory: Arc<dyn ChannelDirectory>,
    pub(super) settings: Arc<SurfSettings>,
    events: broadcast::Sender<SurfEvent>,
    pub(super) watchdog: Arc<StdMutex<Option<WatchdogSlot>>>,
    pub(super) watchdog_epoch: Arc<AtomicU64>,
    pub(super) settle: Arc<StdMutex<Option<CancellationToken>>>,
}

impl Scheduler {
    pub fn new(
        surface: Arc<dyn PlaybackSurface>,
        directory: Arc<dyn ChannelDirectory>,
        settings: SurfSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(SessionState::new(settings.start_muted))),
            surface,
            directory,
            settings: Arc::new(settings),
            events,
            watchdog: Arc::new(StdMutex::new(None)),
            watchdog_epoch: Arc::new(AtomicU64::new(0)),
            settle: Arc::new(StdMutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SurfEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn channels(&self) -> Vec<Channel> {
        self.state.lock().await.channels.clone()
    }

    /// Loads the channel list and picks the starting channel.
    ///
    /// An empty or unreachable catalog is fatal for the session and leaves
    /// the surface untouched; both report `NoChannels`. Playback begins once
    /// the surface is ready.
    pub async fn start(&self) -> SurfResult<()> {
        let channels = match self.directory.fetch_channels().await {
            Ok(channels) => channels,
            Err(err) => {
                log_error!("Failed to load channel list: {err:#}");
                return Err(SurfError::NoChannels);
            }
        };

        if channels.is_empty() {
            log_error!("Directory returned no channels; not starting playback");
            return Err(SurfError::NoChannels);
        }

        let readonly = match self.directory.fetch_config().await {
            Ok(config) => config.readonly,
            Err(err) => {
                log_warn!("Failed to load directory config, assuming writable: {err:#}");
                false
            }
        };

        let initial_index = match self.settings.start_channel {
            StartChannel::First => 0,
            StartChannel::Random => rand::thread_rng().gen_range(0..channels.len()),
        };

        let tune_now = {
            let mut state = self.state.lock().await;
            if state.started {
                log_warn!("Scheduler already started");
                return Ok(());
            }
            state.current_channel = Some(channels[initial_index].clone());
            state.channels = channels;
            state.readonly = readonly;
            state.started = true;
            log_info!(
                "Session {} starting on channel {} of {}",
                state.session_id,
                initial_index + 1,
                state.channels.len()
            );
            state.surface_ready
        };

        self.surface.set_volume(self.settings.initial_volume.min(100));

        if tune_now {
            self.tune_in().await;
        }
        Ok(())
    }

    /// Plays the current channel; used on first readiness of the surface.
    async fn tune_in(&self) {
        if let Err(err) = self.refresh().await {
            log_warn!("Initial tune-in failed: {err}");
        }
    }

    /// Reacts to one widget notification.
    pub async fn handle_surface_event(&self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Ready => self.on_ready().await,
            SurfaceEvent::StateChange { state } => self.on_state_change(state).await,
            SurfaceEvent::Error { code } => {
                if let Err(err) = self.recover_from_error(code).await {
                    log_warn!("Recovery after playback error {code} did not change channel: {err}");
                }
            }
        }
    }

    /// Forwards widget notifications into the scheduler until the surface
    /// drops its sender.
    ///
    /// State changes are handled in arrival order; ready and error
    /// notifications involve directory round-trips and run on their own tasks.
    pub fn spawn_event_pump(&self, mut rx: mpsc::UnboundedReceiver<SurfaceEvent>) -> JoinHandle<()> {
        let scheduler = self.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    SurfaceEvent::StateChange { .. } => scheduler.handle_surface_event(event).await,
                    other => {
                        let scheduler = scheduler.clone();
                        tokio::spawn(async move { scheduler.handle_surface_event(other).await });
                    }
                }
            }
            log_info!("Playback surface closed its notification stream");
        })
    }

    async fn on_ready(&self) {
        let tune_now = {
            let mut state = self.state.lock().await;
            state.surface_ready = true;
            state.started && state.current_segment.is_none()
        };

        if tune_now {
            self.tune_in().await;
        }
    }

    async fn on_state_change(&self, playback: PlaybackState) {
        let mut state = self.state.lock().await;
        state.is_muted = self.surface.is_muted();

        if !state.powered {
            return;
        }

        match playback {
            PlaybackState::Playing => {
                state.is_playing = true;
                if state.attempt.is_settled() {
                    self.emit(SurfEvent::Buffering { active: false });
                }
                match state.current_segment.clone() {
                    Some(segment) if !state.is_ending(&segment.id) => self.start_watchdog(segment),
                    _ => {}
                }
            }
            PlaybackState::Unstarted | PlaybackState::Cued => {
                self.surface.play();
            }
            PlaybackState::Ended => {
                state.is_playing = false;
                self.emit(SurfEvent::Buffering { active: true });
                // The source ran out before `section_end`; treat it as the
                // segment boundary unless the watchdog already fired.
                if let Some(segment) = state.current_segment.clone() {
                    if self.claim_watchdog(&mut state, &segment.id) {
                        let scheduler = self.clone();
                        tokio::spawn(async move { scheduler.on_segment_end(segment).await });
                    }
                }
            }
            PlaybackState::Paused | PlaybackState::Buffering => {
                state.is_playing = false;
                self.emit(SurfEvent::Buffering { active: true });
            }
        }
    }

    pub(super) fn emit(&self, event: SurfEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Locks a timer slot, recovering from poisoning: the slot only holds
/// handles, so a panic elsewhere cannot leave it inconsistent.
pub(super) fn lock_slot<T>(slot: &StdMutex<T>) -> StdMutexGuard<'_, T> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
