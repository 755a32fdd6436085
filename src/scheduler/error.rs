use thiserror::Error;

pub type SurfResult<T> = std::result::Result<T, SurfError>;

#[derive(Error, Debug)]
pub enum SurfError {
    #[error("the directory has no channels")]
    NoChannels,

    #[error("no content available on channel {channel_id}")]
    NoContent { channel_id: i64 },

    #[error("unknown channel {0}")]
    UnknownChannel(i64),

    #[error("catalog submissions are disabled in read-only mode")]
    ReadOnly,

    #[error("scheduler has not been started")]
    NotStarted,

    #[error("playback is powered off")]
    PoweredOff,

    #[error("navigation superseded by a newer request")]
    Superseded,

    #[error("directory error: {0:#}")]
    Directory(#[from] anyhow::Error),
}
