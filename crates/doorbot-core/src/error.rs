use thiserror::Error;

#[derive(Debug, Error)]
pub enum DoorbotError {
    #[error("invalid configuration for {key}: {value:?}")]
    Config { key: &'static str, value: String },

    #[error("hardware fault: {0}")]
    Hardware(String),

    #[error(transparent)]
    Sound(#[from] sound_player::SoundPlayerError),

    #[error(transparent)]
    Transport(#[from] crate::api::TransportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DoorbotError>;
