use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::warn;

/// The one clip format `aplay` handles on the door controller.
pub const SOUND_EXTENSION: &str = "wav";

// ─── Selector ─────────────────────────────────────────────────────────────

/// The server's `sound` field, parsed.
///
/// `"none"` suppresses playback entirely (sneaky mode); an empty string
/// leaves the choice to a uniformly-random pick; anything else names a clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Silent,
    Random,
    Named(String),
}

impl Selector {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "none" => Selector::Silent,
            "" => Selector::Random,
            name => Selector::Named(name.to_string()),
        }
    }

    /// The label recorded in the unlock event for this selector. A named
    /// clip keeps its requested name even if playback later falls back to a
    /// random clip.
    pub fn event_label(&self) -> &str {
        match self {
            Selector::Silent => "none",
            Selector::Random => "random",
            Selector::Named(name) => name,
        }
    }
}

// ─── SoundLibrary ─────────────────────────────────────────────────────────

/// The on-disk clip directory.
#[derive(Debug, Clone)]
pub struct SoundLibrary {
    dir: PathBuf,
}

impl SoundLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File names of the available clips, sorted. An unreadable directory
    /// yields an empty list rather than an error — the door must keep
    /// working with no sounds installed.
    pub fn available(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .flatten()
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext == SOUND_EXTENSION)
            })
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    /// Resolve a selector to a concrete clip: `(file name, full path)`.
    ///
    /// A named clip that does not exist falls back to a random pick; a
    /// random pick over an empty library resolves to nothing.
    pub fn resolve(&self, selector: &Selector) -> Option<(String, PathBuf)> {
        match selector {
            Selector::Silent => None,
            Selector::Named(name) => {
                let path = self.dir.join(name);
                if path.is_file() {
                    Some((name.clone(), path))
                } else {
                    warn!(clip = %name, "sound not found, picking random");
                    self.pick_random()
                }
            }
            Selector::Random => self.pick_random(),
        }
    }

    fn pick_random(&self) -> Option<(String, PathBuf)> {
        let names = self.available();
        let Some(name) = names.choose(&mut rand::thread_rng()) else {
            warn!(dir = %self.dir.display(), "no sound clips available");
            return None;
        };
        Some((name.clone(), self.dir.join(name)))
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
