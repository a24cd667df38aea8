use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("section not registered: {0}")]
    NotRegistered(&'static str),

    #[error("section already registered: {0}")]
    AlreadyRegistered(&'static str),

    #[error("invalid settings: {0}")]
    Invalid(&'static str),
}
