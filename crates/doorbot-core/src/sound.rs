use crate::error::Result;
use sound_player::{AplayPlayer, Playback, Selector};

// ---------------------------------------------------------------------------
// CueHandle / CuePlayer
// ---------------------------------------------------------------------------

/// A cancellable audio cue spawned for one ceremony. Cancellation is an
/// unconditional forced termination, not a cooperative shutdown.
pub trait CueHandle: Send {
    /// Whether the cue is still playing (non-blocking).
    fn is_running(&mut self) -> bool;
    /// Forcibly stop playback.
    fn cancel(&mut self);
}

/// The sequencer's view of the audio backend, so the playback mechanism is
/// swappable and testable without spawning real audio processes.
pub trait CuePlayer: Send {
    /// Begin playback for `selector`. `Ok(None)` means nothing to play:
    /// sneaky mode, or an empty sound library.
    fn start(&mut self, selector: &Selector) -> Result<Option<Box<dyn CueHandle>>>;
    /// Names of the locally available clips, for the server sound-list sync.
    fn available(&self) -> Vec<String>;
}

// ---------------------------------------------------------------------------
// aplay backend
// ---------------------------------------------------------------------------

impl CueHandle for Playback {
    fn is_running(&mut self) -> bool {
        Playback::is_running(self)
    }

    fn cancel(&mut self) {
        self.stop();
    }
}

impl CuePlayer for AplayPlayer {
    fn start(&mut self, selector: &Selector) -> Result<Option<Box<dyn CueHandle>>> {
        let playback = AplayPlayer::start(self, selector)?;
        Ok(playback.map(|p| Box::new(p) as Box<dyn CueHandle>))
    }

    fn available(&self) -> Vec<String> {
        AplayPlayer::available(self)
    }
}

// ---------------------------------------------------------------------------
// Test fakes
// ---------------------------------------------------------------------------
