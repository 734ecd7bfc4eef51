use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::info;

use crate::library::{Selector, SoundLibrary};
use crate::{Result, SoundPlayerError};

// ─── Playback ─────────────────────────────────────────────────────────────

/// A running playback child.
///
/// The handle supports exactly two operations: a non-blocking liveness
/// check and a forced kill. The child runs unsupervised — nothing awaits
/// it — so a finished clip is only observed when the caller next asks.
#[derive(Debug)]
pub struct Playback {
    child: Child,
    clip: String,
}

impl Playback {
    /// Spawn `cmd` as a playback task labelled with `clip`. All stdio is
    /// discarded. Unit tests substitute a harmless command here.
    pub(crate) fn spawn(mut cmd: Command, clip: impl Into<String>) -> Result<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let child = cmd.spawn().map_err(SoundPlayerError::Spawn)?;
        Ok(Self {
            child,
            clip: clip.into(),
        })
    }

    /// The clip file name this playback was started with.
    pub fn clip(&self) -> &str {
        &self.clip
    }

    /// Whether the child is still running (non-blocking).
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Forcibly terminate playback (best-effort; errors are ignored). The
    /// runtime reaps the child in the background once it exits.
    pub fn stop(&mut self) {
        let _ = self.child.start_kill();
    }
}

// ─── AplayPlayer ──────────────────────────────────────────────────────────

/// Resolves selectors against the sound library and spawns `aplay`
/// children on the configured ALSA device.
#[derive(Debug, Clone)]
pub struct AplayPlayer {
    library: SoundLibrary,
    device: String,
}

impl AplayPlayer {
    pub fn new(sounds_dir: impl Into<PathBuf>, device: impl Into<String>) -> Self {
        Self {
            library: SoundLibrary::new(sounds_dir),
            device: device.into(),
        }
    }

    /// File names of the locally available clips.
    pub fn available(&self) -> Vec<String> {
        self.library.available()
    }

    /// Begin playback for `selector`. `Ok(None)` means there is nothing to
    /// play: sneaky mode, or a library with no clips.
    pub fn start(&self, selector: &Selector) -> Result<Option<Playback>> {
        if *selector == Selector::Silent {
            info!("sneaky mode, no sound");
            return Ok(None);
        }
        let Some((clip, path)) = self.library.resolve(selector) else {
            return Ok(None);
        };

        let mut cmd = Command::new("aplay");
        cmd.arg("-D").arg(&self.device).arg(&path);
        let playback = Playback::spawn(cmd, &clip)?;
        info!(clip = %clip, "playing sound");
        Ok(Some(playback))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
