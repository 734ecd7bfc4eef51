use thiserror::Error;

#[derive(Debug, Error)]
pub enum SoundPlayerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn playback process: {0}")]
    Spawn(#[source] std::io::Error),
}
