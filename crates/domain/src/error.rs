/// Shared error type used across all SessionBridge crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    /// The caller sent a request that cannot be served (missing or empty
    /// parameters, a malformed session id).  Raised before any store or
    /// engine interaction.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("dialog engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),
}

impl Error {
    /// Whether the failure came from an upstream dependency (store or
    /// dialog engine) rather than from the caller or local setup.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::EngineUnavailable(_) | Self::Timeout(_) | Self::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
