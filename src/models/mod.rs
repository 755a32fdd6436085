mod channel;
mod segment;

pub use channel::Channel;
pub use segment::{SegmentDescriptor, VideoId};
