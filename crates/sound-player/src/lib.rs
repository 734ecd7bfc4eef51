//! `sound-player` — driver for the `aplay` playback subprocess.
//!
//! The doorbot plays an audio cue while the door is held open. Playback is
//! delegated to `aplay` as an independent child process so the control loop
//! never blocks on audio:
//!
//! ```text
//! Selector        ← parsed from the server's `sound` field
//!     │
//!     ▼
//! SoundLibrary    ← scans the clip directory, resolves the selector
//!     │              (named clip, random fallback, or nothing)
//!     ▼
//! Playback        ← spawned `aplay -D <device> <clip>` child with a
//!                    poll-for-completion + force-kill handle
//! ```
//!
//! The handle is deliberately minimal: the caller only ever asks "is it
//! still running?" and "stop it now". Cancellation is a forced kill, not a
//! cooperative shutdown — `aplay` has no graceful stop.

pub mod error;
pub mod library;
pub mod playback;

pub use error::SoundPlayerError;
pub use library::{Selector, SoundLibrary, SOUND_EXTENSION};
pub use playback::{AplayPlayer, Playback};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, SoundPlayerError>;
