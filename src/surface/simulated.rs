use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use tokio::{sync::mpsc, time::Instant};

use super::{PlaybackState, PlaybackSurface, SurfaceEvent};

/// Error code reported for sources marked as broken (matches the widget's
/// "not embeddable" code).
pub const SIMULATED_ERROR_CODE: i32 = 150;

struct SimState {
    source: Option<String>,
    state: PlaybackState,
    muted: bool,
    volume: u8,
    /// Offset at the last play/pause/cue transition.
    base_position: f64,
    /// Set while playing; position advances from here on the tokio clock.
    playing_since: Option<Instant>,
    broken_sources: HashSet<String>,
}

impl SimState {
    fn position(&self) -> f64 {
        match self.playing_since {
            Some(since) => self.base_position + since.elapsed().as_secs_f64(),
            None => self.base_position,
        }
    }
}

/// A headless widget stand-in. Position advances with the tokio clock while
/// playing, so it follows paused time in tests.
pub struct SimulatedSurface {
    inner: Mutex<SimState>,
    events: mpsc::UnboundedSender<SurfaceEvent>,
}

impl SimulatedSurface {
    /// Creates the surface and the notification stream it pushes to. A
    /// `Ready` notification is queued immediately.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let surface = Self {
            inner: Mutex::new(SimState {
                source: None,
                state: PlaybackState::Unstarted,
                muted: false,
                volume: 100,
                base_position: 0.0,
                playing_since: None,
                broken_sources: HashSet::new(),
            }),
            events: tx,
        };
        surface.emit(SurfaceEvent::Ready);
        (surface, rx)
    }

    /// Any later cue of `source_ref` reports a playback error instead of loading.
    pub fn mark_broken(&self, source_ref: impl Into<String>) {
        self.lock().broken_sources.insert(source_ref.into());
    }

    pub fn current_source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn emit(&self, event: SurfaceEvent) {
        // The receiver going away just means nobody is listening anymore.
        let _ = self.events.send(event);
    }

    fn transition(&self, sim: &mut SimState, state: PlaybackState) {
        if sim.state != state {
            sim.state = state;
            self.emit(SurfaceEvent::StateChange { state });
        }
    }
}

impl PlaybackSurface for SimulatedSurface {
    fn cue_segment(&self, source_ref: &str, start_seconds: f64) {
        let mut sim = self.lock();
        sim.source = Some(source_ref.to_string());
        sim.base_position = start_seconds.max(0.0);
        sim.playing_since = None;

        if sim.broken_sources.contains(source_ref) {
            sim.state = PlaybackState::Unstarted;
            self.emit(SurfaceEvent::Error {
                code: SIMULATED_ERROR_CODE,
            });
            return;
        }

        // A fresh cue always reports, even when already cued.
        sim.state = PlaybackState::Cued;
        self.emit(SurfaceEvent::StateChange {
            state: PlaybackState::Cued,
        });
    }

    fn play(&self) {
        let mut sim = self.lock();
        if sim.source.is_none() || sim.state == PlaybackState::Playing {
            return;
        }
        if sim.source.as_ref().is_some_and(|s| sim.broken_sources.contains(s)) {
            return;
        }
        sim.playing_since = Some(Instant::now());
        self.transition(&mut sim, PlaybackState::Playing);
    }

    fn pause(&self) {
        let mut sim = self.lock();
        if sim.state != PlaybackState::Playing {
            return;
        }
        sim.base_position = sim.position();
        sim.playing_since = None;
        self.transition(&mut sim, PlaybackState::Paused);
    }

    fn mute(&self) {
        self.lock().muted = true;
    }

    fn unmute(&self) {
        self.lock().muted = false;
    }

    fn is_muted(&self) -> bool {
        self.lock().muted
    }

    fn volume(&self) -> u8 {
        self.lock().volume
    }

    fn set_volume(&self, volume: u8) {
        self.lock().volume = volume.min(100);
    }

    fn position(&self) -> f64 {
        self.lock().position()
    }

    fn playback_state(&self) -> PlaybackState {
        self.lock().state
    }
}
