//! The channel playback scheduler: session state, navigation, autoplay
//! policy, segment watchdog and fault recovery.

mod autoplay;
pub mod commands;
mod controller;
mod controls;
mod error;
mod events;
mod navigator;
mod recovery;
mod state;
mod watchdog;

pub use controller::Scheduler;
pub use error::{SurfError, SurfResult};
pub use events::SurfEvent;
pub use state::{wrap_index, PlaybackAttempt, SessionSnapshot, SessionState};
