use serde::Serialize;

use crate::models::{Channel, SegmentDescriptor, VideoId};

/// Outbound notifications for whatever renders the control surface
/// (loading indicator, channel-name flash, volume bar).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SurfEvent {
    #[serde(rename_all = "camelCase")]
    ChannelChanged {
        channel: Channel,
        segment: SegmentDescriptor,
    },
    Buffering {
        active: bool,
    },
    VolumeChanged {
        volume: u8,
    },
    MuteChanged {
        muted: bool,
    },
    #[serde(rename_all = "camelCase")]
    NoContent {
        channel_id: i64,
    },
    PowerChanged {
        on: bool,
    },
    #[serde(rename_all = "camelCase")]
    SegmentInvalidated {
        video_id: VideoId,
        acknowledged: bool,
    },
    CatalogReplaced,
}
