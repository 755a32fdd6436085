use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{Channel, SegmentDescriptor, VideoId};

/// Progress of one autoplay attempt: `Cueing -> Buffering -> Settled`.
/// Every cue restarts the machine.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", tag = "phase", content = "videoId")]
pub enum PlaybackAttempt {
    #[default]
    Idle,
    Cueing(VideoId),
    /// Forced muted and playing while the widget settles.
    Buffering(VideoId),
    Settled(VideoId),
}

impl PlaybackAttempt {
    pub fn is_settled(&self) -> bool {
        matches!(self, PlaybackAttempt::Settled(_) | PlaybackAttempt::Idle)
    }
}

/// The single mutable record of what the session is doing.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub channels: Vec<Channel>,
    pub current_channel: Option<Channel>,
    /// Only ever set together with `current_channel`, after a successful fetch.
    pub current_segment: Option<SegmentDescriptor>,
    pub is_playing: bool,
    /// Last mute state observed on the surface.
    pub is_muted: bool,
    /// What the user asked for; applied once the settle window closes.
    pub user_muted: bool,
    pub has_user_interacted: bool,
    pub readonly: bool,
    pub powered: bool,
    pub started: bool,
    pub surface_ready: bool,
    pub attempt: PlaybackAttempt,
    /// Segment currently being invalidated after a playback error.
    pub recovering: Option<VideoId>,
    /// Segment whose end has been claimed; its hand-off is in flight.
    pub ending: Option<VideoId>,
    nav_seq: u64,
    pending_target: Option<usize>,
    attempt_epoch: u64,
}

impl SessionState {
    pub fn new(user_muted: bool) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            channels: Vec::new(),
            current_channel: None,
            current_segment: None,
            is_playing: false,
            is_muted: false,
            user_muted,
            has_user_interacted: false,
            readonly: false,
            powered: true,
            started: false,
            surface_ready: false,
            attempt: PlaybackAttempt::Idle,
            recovering: None,
            ending: None,
            nav_seq: 0,
            pending_target: None,
            attempt_epoch: 0,
        }
    }

    /// Records a control-surface event. Returns true only for the first one.
    pub fn mark_interaction(&mut self) -> bool {
        if self.has_user_interacted {
            return false;
        }
        self.has_user_interacted = true;
        true
    }

    pub fn channel_index(&self, channel_id: i64) -> Option<usize> {
        self.channels.iter().position(|channel| channel.id == channel_id)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_channel
            .as_ref()
            .and_then(|channel| self.channel_index(channel.id))
    }

    /// Index relative moves are measured from: the newest requested target
    /// if a navigation is in flight, otherwise the current channel.
    pub fn navigation_base(&self) -> usize {
        self.pending_target
            .or_else(|| self.current_index())
            .unwrap_or(0)
    }

    pub fn begin_navigation(&mut self, target: usize) -> u64 {
        self.nav_seq += 1;
        self.pending_target = Some(target);
        self.nav_seq
    }

    pub fn is_latest_navigation(&self, seq: u64) -> bool {
        self.nav_seq == seq
    }

    pub fn finish_navigation(&mut self, seq: u64) {
        if self.is_latest_navigation(seq) {
            self.pending_target = None;
        }
    }

    /// Invalidates any in-flight navigation without starting a new one.
    pub fn supersede_navigation(&mut self) {
        self.nav_seq += 1;
        self.pending_target = None;
    }

    /// Starts a new autoplay attempt and returns its epoch. Re-cueing the
    /// same video still yields a fresh epoch.
    pub fn begin_attempt(&mut self, video_id: VideoId) -> u64 {
        self.attempt_epoch += 1;
        self.attempt = PlaybackAttempt::Buffering(video_id);
        self.attempt_epoch
    }

    /// Whether `epoch` is the attempt still waiting to settle.
    pub fn is_settling(&self, epoch: u64) -> bool {
        self.attempt_epoch == epoch && matches!(self.attempt, PlaybackAttempt::Buffering(_))
    }

    /// Whether the end of `video_id` has already been claimed.
    pub fn is_ending(&self, video_id: &VideoId) -> bool {
        self.ending.as_ref() == Some(video_id)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            current_channel: self.current_channel.clone(),
            current_segment: self.current_segment.clone(),
            is_playing: self.is_playing,
            is_muted: self.is_muted,
            has_user_interacted: self.has_user_interacted,
            readonly: self.readonly,
            powered: self.powered,
            attempt: self.attempt.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub current_channel: Option<Channel>,
    pub current_segment: Option<SegmentDescriptor>,
    pub is_playing: bool,
    pub is_muted: bool,
    pub has_user_interacted: bool,
    pub readonly: bool,
    pub powered: bool,
    pub attempt: PlaybackAttempt,
}

/// `(base + offset) mod n`, wrapping in both directions. `n` must be non-zero.
pub fn wrap_index(base: usize, offset: i64, n: usize) -> usize {
    debug_assert!(n > 0);
    let n = n as i64;
    (base as i64 + offset).rem_euclid(n) as usize
}
