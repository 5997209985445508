//! Per-surface vault session: the token holder and lock-state machine.
//!
//! Each UI surface owns one [`VaultSession`] for its own lifetime. The state is
//! derived from the outcome of the most recent call and never persisted.

use std::fmt;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::client::{validate_entry, VaultClient};
use crate::error::VaultError;
use crate::models::{PasswordMap, SessionToken, VaultStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    /// No call has completed yet.
    Unknown,
    /// The server answered and refused access.
    Locked,
    /// A token is held and was accepted by the server.
    Unlocked,
    /// The server could not be reached or timed out.
    Unreachable,
}

impl fmt::Display for VaultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VaultState::Unknown => "Checking...",
            VaultState::Locked => "Vault: Locked",
            VaultState::Unlocked => "Vault: Unlocked",
            VaultState::Unreachable => "App unreachable",
        };
        f.write_str(label)
    }
}

pub struct VaultSession {
    client: VaultClient,
    token: Option<SessionToken>,
    state: VaultState,
}

impl VaultSession {
    pub fn new(client: VaultClient) -> Self {
        Self {
            client,
            token: None,
            state: VaultState::Unknown,
        }
    }

    pub fn client(&self) -> &VaultClient {
        &self.client
    }

    pub fn state(&self) -> VaultState {
        self.state
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn is_unlocked(&self) -> bool {
        self.state == VaultState::Unlocked && self.token.is_some()
    }

    /// Requests a fresh bearer token. Success moves to `Unlocked`; any failure
    /// clears the held token and moves to `Locked` or `Unreachable`.
    pub async fn request_token(&mut self) -> Result<&SessionToken, VaultError> {
        let result = self.client.request_token().await;
        match result {
            Ok(token) => {
                debug!("session token acquired");
                self.state = VaultState::Unlocked;
                Ok(self.token.insert(token))
            }
            Err(err) => {
                self.token = None;
                self.state = if err.is_lock_signal() {
                    VaultState::Locked
                } else {
                    VaultState::Unreachable
                };
                Err(err)
            }
        }
    }

    /// Sends the master password to the unlock endpoint. The password buffer is
    /// wiped when this returns, whatever the outcome. On success the state is
    /// left as is; call [`request_token`](Self::request_token) to obtain a token.
    /// A refusal from a reachable server, including a 5xx, leaves the session
    /// `Locked` with no token.
    pub async fn unlock(&mut self, master_password: Zeroizing<String>) -> Result<(), VaultError> {
        let result = self.client.unlock(master_password.as_str()).await;
        drop(master_password);

        match result {
            Ok(()) => {
                info!("vault unlocked");
                Ok(())
            }
            Err(VaultError::InvalidInput(msg)) => Err(VaultError::InvalidInput(msg)),
            Err(err) => {
                warn!(error = %err, "unlock failed");
                self.token = None;
                self.state = if err.is_unreachable() {
                    VaultState::Unreachable
                } else {
                    VaultState::Locked
                };
                Err(err)
            }
        }
    }

    /// Unlock followed by a token request, the handshake a popup performs.
    pub async fn unlock_and_connect(
        &mut self,
        master_password: Zeroizing<String>,
    ) -> Result<&SessionToken, VaultError> {
        self.unlock(master_password).await?;
        self.request_token().await
    }

    /// Asks the server whether the held token still opens the vault.
    pub async fn status(&mut self) -> Result<VaultStatus, VaultError> {
        let token = self.token.as_ref().ok_or(VaultError::AuthRejected)?;
        let result = self.client.status(token).await;
        match result {
            Ok(VaultStatus::Unlocked) => {
                self.state = VaultState::Unlocked;
                Ok(VaultStatus::Unlocked)
            }
            Ok(VaultStatus::Locked) => {
                self.fail(&VaultError::AuthRejected);
                Ok(VaultStatus::Locked)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    pub async fn list_passwords(&mut self) -> Result<PasswordMap, VaultError> {
        let token = self.token.as_ref().ok_or(VaultError::AuthRejected)?;
        let result = self.client.list_passwords(token).await;
        self.observe(result)
    }

    pub async fn save_password(&mut self, name: &str, password: &str) -> Result<(), VaultError> {
        validate_entry(name, password)?;
        let token = self.token.as_ref().ok_or(VaultError::AuthRejected)?;
        let result = self.client.save_password(token, name, password).await;
        self.observe(result)
    }

    /// Drops the held token and returns to `Unknown`.
    pub fn forget(&mut self) {
        self.token = None;
        self.state = VaultState::Unknown;
    }

    fn observe<T>(&mut self, result: Result<T, VaultError>) -> Result<T, VaultError> {
        if let Err(err) = &result {
            self.fail(err);
        }
        result
    }

    fn fail(&mut self, err: &VaultError) {
        if err.is_unreachable() {
            self.token = None;
            self.state = VaultState::Unreachable;
        } else if err.is_lock_signal() {
            self.token = None;
            self.state = VaultState::Locked;
        }
    }
}
