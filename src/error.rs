use thiserror::Error;

/// Failures of a vault server call, surfaced to the UI layer as a state
/// transition plus a message. None of them are fatal; the caller may retry.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault server is unreachable")]
    Unreachable(#[source] reqwest::Error),

    #[error("vault is locked")]
    Locked,

    #[error("invalid master password")]
    InvalidPassword,

    #[error("vault is locked: session token missing or rejected")]
    AuthRejected,

    #[error("vault server rejected the request: {0}")]
    ServerRejected(String),

    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("unexpected response from vault server")]
    MalformedResponse(#[source] reqwest::Error),

    #[error("failed to set up the HTTP client")]
    HttpClient(#[source] reqwest::Error),
}

impl VaultError {
    /// True when a reachable server refused the caller's credentials.
    pub fn is_lock_signal(&self) -> bool {
        matches!(
            self,
            VaultError::Locked | VaultError::AuthRejected | VaultError::InvalidPassword
        )
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, VaultError::Unreachable(_))
    }
}
