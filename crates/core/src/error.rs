use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("missing configuration: {0} is not set")]
    MissingKey(String),

    #[error("invalid configuration for {key}: {reason}")]
    Invalid { key: String, reason: String },
}
