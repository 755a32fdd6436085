#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use channel_surf_lib::{
    directory::{ChannelDirectory, DirectoryConfig},
    models::{Channel, SegmentDescriptor, VideoId},
    scheduler::Scheduler,
    settings::{StartChannel, SurfSettings},
    surface::{PlaybackState, PlaybackSurface, SurfaceEvent},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Cue(String, f64),
    Play,
    Pause,
    Mute,
    Unmute,
    SetVolume(u8),
}

struct FakeSurfaceInner {
    calls: Vec<Call>,
    muted: bool,
    volume: u8,
    positions: VecDeque<f64>,
    position: f64,
}

/// Records every command; positions are scripted.
pub struct FakeSurface {
    inner: Mutex<FakeSurfaceInner>,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(FakeSurfaceInner {
                calls: Vec::new(),
                muted: false,
                volume: 50,
                positions: VecDeque::new(),
                position: 0.0,
            }),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.lock().unwrap().calls.clear();
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn cues(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Cue(source, _) => Some(source),
                _ => None,
            })
            .collect()
    }

    /// Commands issued since the most recent cue.
    pub fn after_last_cue(&self) -> Vec<Call> {
        let calls = self.calls();
        match calls.iter().rposition(|call| matches!(call, Call::Cue(..))) {
            Some(index) => calls[index + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Each poll consumes one position; the last one sticks.
    pub fn script_positions(&self, positions: &[f64]) {
        self.inner.lock().unwrap().positions = positions.iter().copied().collect();
    }

    pub fn set_position(&self, position: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.positions.clear();
        inner.position = position;
    }

    pub fn set_volume_raw(&self, volume: u8) {
        self.inner.lock().unwrap().volume = volume;
    }
}

impl PlaybackSurface for FakeSurface {
    fn cue_segment(&self, source_ref: &str, start_seconds: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Cue(source_ref.to_string(), start_seconds));
        inner.position = start_seconds;
    }

    fn play(&self) {
        self.inner.lock().unwrap().calls.push(Call::Play);
    }

    fn pause(&self) {
        self.inner.lock().unwrap().calls.push(Call::Pause);
    }

    fn mute(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Mute);
        inner.muted = true;
    }

    fn unmute(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::Unmute);
        inner.muted = false;
    }

    fn is_muted(&self) -> bool {
        self.inner.lock().unwrap().muted
    }

    fn volume(&self) -> u8 {
        self.inner.lock().unwrap().volume
    }

    fn set_volume(&self, volume: u8) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(Call::SetVolume(volume));
        inner.volume = volume;
    }

    fn position(&self) -> f64 {
        let mut inner = self.inner.lock().unwrap();
        if let Some(next) = inner.positions.pop_front() {
            inner.position = next;
        }
        inner.position
    }

    fn playback_state(&self) -> PlaybackState {
        PlaybackState::Playing
    }
}

#[derive(Default)]
struct FakeDirectoryInner {
    videos: HashMap<i64, Vec<SegmentDescriptor>>,
    delays: HashMap<i64, Duration>,
    fetches: Vec<(i64, Option<VideoId>)>,
    invalidated: Vec<VideoId>,
    submitted: Vec<String>,
}

/// In-memory directory with switches for the failure paths.
pub struct FakeDirectory {
    channels: Vec<Channel>,
    inner: Mutex<FakeDirectoryInner>,
    pub fail_channels: Mutex<bool>,
    pub fail_fetch: Mutex<bool>,
    pub fail_invalidate: Mutex<bool>,
    pub invalidate_delay: Mutex<Duration>,
    pub readonly: bool,
}

impl FakeDirectory {
    /// Channels `1..=n`, each airing one video `v{id}` over `[10, 20)`.
    pub fn with_channels(n: i64) -> Self {
        let directory = Self::empty((1..=n).map(|id| Channel::new(id, format!("ch{id}"))).collect());
        for id in 1..=n {
            directory.set_videos(
                id,
                vec![SegmentDescriptor::new(
                    VideoId::new(format!("v{id}")),
                    format!("ref{id}"),
                    10.0,
                    20.0,
                )],
            );
        }
        directory
    }

    pub fn empty(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            inner: Mutex::new(FakeDirectoryInner::default()),
            fail_channels: Mutex::new(false),
            fail_fetch: Mutex::new(false),
            fail_invalidate: Mutex::new(false),
            invalidate_delay: Mutex::new(Duration::ZERO),
            readonly: false,
        }
    }

    pub fn set_videos(&self, channel_id: i64, videos: Vec<SegmentDescriptor>) {
        self.inner.lock().unwrap().videos.insert(channel_id, videos);
    }

    pub fn set_delay(&self, channel_id: i64, delay: Duration) {
        self.inner.lock().unwrap().delays.insert(channel_id, delay);
    }

    pub fn fetches(&self) -> Vec<(i64, Option<VideoId>)> {
        self.inner.lock().unwrap().fetches.clone()
    }

    pub fn fetch_count(&self, channel_id: i64) -> usize {
        self.fetches().iter().filter(|(id, _)| *id == channel_id).count()
    }

    pub fn invalidated(&self) -> Vec<VideoId> {
        self.inner.lock().unwrap().invalidated.clone()
    }

    pub fn submitted(&self) -> Vec<String> {
        self.inner.lock().unwrap().submitted.clone()
    }
}

#[async_trait]
impl ChannelDirectory for FakeDirectory {
    async fn fetch_channels(&self) -> Result<Vec<Channel>> {
        if *self.fail_channels.lock().unwrap() {
            return Err(anyhow!("directory offline"));
        }
        Ok(self.channels.clone())
    }

    async fn fetch_current_video(
        &self,
        channel_id: i64,
        prior: Option<&VideoId>,
    ) -> Result<Option<SegmentDescriptor>> {
        let delay = {
            let mut inner = self.inner.lock().unwrap();
            inner.fetches.push((channel_id, prior.cloned()));
            inner.delays.get(&channel_id).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if *self.fail_fetch.lock().unwrap() {
            return Err(anyhow!("directory offline"));
        }

        let inner = self.inner.lock().unwrap();
        let videos = inner.videos.get(&channel_id).cloned().unwrap_or_default();
        Ok(match prior {
            None => videos.first().cloned(),
            Some(prior) => videos
                .iter()
                .position(|video| &video.id == prior)
                .and_then(|index| videos.get(index + 1).cloned()),
        })
    }

    async fn invalidate_video(&self, video_id: &VideoId) -> Result<bool> {
        let delay = *self.invalidate_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.invalidated.push(video_id.clone());
        if *self.fail_invalidate.lock().unwrap() {
            return Err(anyhow!("directory unreachable"));
        }
        Ok(true)
    }

    async fn submit_list(&self, video_list_url: &str) -> Result<bool> {
        self.inner
            .lock()
            .unwrap()
            .submitted
            .push(video_list_url.to_string());
        Ok(true)
    }

    async fn fetch_config(&self) -> Result<DirectoryConfig> {
        Ok(DirectoryConfig {
            readonly: self.readonly,
        })
    }
}

pub fn test_settings() -> SurfSettings {
    SurfSettings {
        start_channel: StartChannel::First,
        ..SurfSettings::default()
    }
}

/// A started scheduler tuned to channel 1.
pub async fn tuned_scheduler(
    directory: FakeDirectory,
    settings: SurfSettings,
) -> (Scheduler, Arc<FakeSurface>, Arc<FakeDirectory>) {
    let surface = Arc::new(FakeSurface::new());
    let directory = Arc::new(directory);
    let scheduler = Scheduler::new(surface.clone(), directory.clone(), settings);

    scheduler.start().await.unwrap();
    scheduler.handle_surface_event(SurfaceEvent::Ready).await;

    (scheduler, surface, directory)
}

pub async fn current_channel_id(scheduler: &Scheduler) -> Option<i64> {
    scheduler.snapshot().await.current_channel.map(|channel| channel.id)
}

pub fn playing() -> SurfaceEvent {
    SurfaceEvent::StateChange {
        state: PlaybackState::Playing,
    }
}
