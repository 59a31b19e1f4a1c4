use thiserror::Error;

/// Errors surfaced by the session model.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Bags can only be registered on a session that has not started yet.
    #[error("cannot register bag '{bag}': session already started")]
    AlreadyStarted { bag: String },

    /// Attribute access against a bag that was never registered.
    #[error("unknown session bag '{bag}'")]
    UnknownBag { bag: String },
}

/// Errors raised while loading configuration parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read parameter file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse parameters: {0}")]
    Parse(#[from] serde_json::Error),
}
