//! HTTP client for the local vault server's REST API.
//!
//! Every call is independent: the client keeps no token of its own, so several
//! calls may be in flight at once. Non-2xx replies are classified by status and
//! never decoded as a success body.

use reqwest::{Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::VaultError;
use crate::models::{
    ErrorResponse, PasswordMap, SavePasswordRequest, SaveResponse, SessionToken, StatusResponse,
    TokenResponse, UnlockRequest, VaultStatus,
};

#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    base_url: String,
}

impl VaultClient {
    fn user_agent() -> String {
        format!("absconditus/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, VaultError> {
        let http = reqwest::Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()
            .map_err(VaultError::HttpClient)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, VaultError> {
        Self::new(&config.server_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `POST /api/request-token`. Succeeds only while the vault is unlocked.
    pub async fn request_token(&self) -> Result<SessionToken, VaultError> {
        let resp = self
            .http
            .post(self.url("/api/request-token"))
            .send()
            .await
            .map_err(VaultError::Unreachable)?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%status, "token request refused");
            return Err(VaultError::Locked);
        }

        let body: TokenResponse = resp.json().await.map_err(VaultError::MalformedResponse)?;
        let token = SessionToken::new(body.token);
        if token.is_empty() {
            warn!("vault server issued an empty token");
            return Err(VaultError::Locked);
        }
        Ok(token)
    }

    /// `POST /api/unlock`. Establishes the server-side session only; a token
    /// must be requested afterwards.
    pub async fn unlock(&self, master_password: &str) -> Result<(), VaultError> {
        if master_password.is_empty() {
            return Err(VaultError::InvalidInput("Password cannot be empty."));
        }

        let resp = self
            .http
            .post(self.url("/api/unlock"))
            .json(&UnlockRequest {
                password: master_password,
            })
            .send()
            .await
            .map_err(VaultError::Unreachable)?;

        match resp.status() {
            s if s.is_success() => Ok(()),
            StatusCode::BAD_REQUEST => Err(VaultError::ServerRejected(error_message(resp).await)),
            s if s.is_server_error() => Err(VaultError::ServerRejected(error_message(resp).await)),
            _ => Err(VaultError::InvalidPassword),
        }
    }

    /// `GET /api/status`.
    pub async fn status(&self, token: &SessionToken) -> Result<VaultStatus, VaultError> {
        ensure_token(token)?;

        let resp = self
            .http
            .get(self.url("/api/status"))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(VaultError::Unreachable)?;

        let resp = check_authenticated(resp).await?;
        let body: StatusResponse = resp.json().await.map_err(VaultError::MalformedResponse)?;
        Ok(body.status)
    }

    /// `POST /api/get-all-passwords`.
    pub async fn list_passwords(&self, token: &SessionToken) -> Result<PasswordMap, VaultError> {
        ensure_token(token)?;

        let resp = self
            .http
            .post(self.url("/api/get-all-passwords"))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(VaultError::Unreachable)?;

        let resp = check_authenticated(resp).await?;
        resp.json::<PasswordMap>()
            .await
            .map_err(VaultError::MalformedResponse)
    }

    /// `POST /api/save-password`. Name and password are validated before any I/O.
    pub async fn save_password(
        &self,
        token: &SessionToken,
        name: &str,
        password: &str,
    ) -> Result<(), VaultError> {
        validate_entry(name, password)?;
        ensure_token(token)?;

        let resp = self
            .http
            .post(self.url("/api/save-password"))
            .bearer_auth(token.as_str())
            .json(&SavePasswordRequest { name, password })
            .send()
            .await
            .map_err(VaultError::Unreachable)?;

        let resp = check_authenticated(resp).await?;
        let body: SaveResponse = resp.json().await.map_err(VaultError::MalformedResponse)?;
        if body.is_success() {
            Ok(())
        } else {
            Err(VaultError::ServerRejected(
                body.error.unwrap_or_else(|| "save was not acknowledged".to_string()),
            ))
        }
    }
}

pub(crate) fn validate_entry(name: &str, password: &str) -> Result<(), VaultError> {
    if name.trim().is_empty() {
        return Err(VaultError::InvalidInput("Please enter a name for the password."));
    }
    if password.is_empty() {
        return Err(VaultError::InvalidInput("Password cannot be empty."));
    }
    Ok(())
}

fn ensure_token(token: &SessionToken) -> Result<(), VaultError> {
    if token.is_empty() {
        return Err(VaultError::AuthRejected);
    }
    Ok(())
}

/// 400 is a validation failure; every other non-2xx on an authenticated
/// endpoint means the token no longer opens the vault.
async fn check_authenticated(resp: Response) -> Result<Response, VaultError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::BAD_REQUEST {
        return Err(VaultError::ServerRejected(error_message(resp).await));
    }
    debug!(%status, "authenticated call rejected");
    Err(VaultError::AuthRejected)
}

async fn error_message(resp: Response) -> String {
    let status = resp.status();
    resp.json::<ErrorResponse>()
        .await
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| format!("status {}", status.as_u16()))
}
