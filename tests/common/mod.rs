//! In-process stand-in for the vault server's `/api/*` routes.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use absconditus::{VaultClient, VaultSession};

pub const MASTER_PASSWORD: &str = "correct horse battery staple";

#[derive(Default)]
struct FakeVaultState {
    token: Option<String>,
    issued: u32,
    passwords: BTreeMap<String, String>,
}

/// Mirrors the server's rules: a token exists only after a successful unlock,
/// authenticated routes compare the bearer token, and saves are validated.
#[derive(Clone, Default)]
pub struct FakeVault {
    state: Arc<Mutex<FakeVaultState>>,
}

impl FakeVault {
    pub async fn start() -> (MockServer, FakeVault) {
        let server = MockServer::start().await;
        let vault = FakeVault::default();
        Mock::given(any())
            .respond_with(vault.clone())
            .mount(&server)
            .await;
        (server, vault)
    }

    pub fn unlocked(self) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.issued += 1;
            state.token = Some(format!("token-{}", state.issued));
        }
        self
    }

    /// Simulates the tray "Lock Vault" action.
    pub fn lock(&self) {
        self.state.lock().unwrap().token = None;
    }

    pub fn insert(&self, name: &str, password: &str) {
        self.state
            .lock()
            .unwrap()
            .passwords
            .insert(name.to_string(), password.to_string());
    }

    pub fn stored(&self) -> BTreeMap<String, String> {
        self.state.lock().unwrap().passwords.clone()
    }

    fn authorized(state: &FakeVaultState, request: &Request) -> bool {
        let header = request
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok());
        match (header, &state.token) {
            (Some(h), Some(token)) => h.strip_prefix("Bearer ") == Some(token.as_str()),
            _ => false,
        }
    }
}

fn error(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(json!({ "error": message }))
}

impl Respond for FakeVault {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().unwrap();
        let method = request.method.as_str();

        match (method, request.url.path()) {
            ("POST", "/api/request-token") => match &state.token {
                Some(token) => ResponseTemplate::new(200).set_body_json(json!({ "token": token })),
                None => error(403, "Vault is locked"),
            },
            ("POST", "/api/unlock") => {
                let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
                match body.get("password").and_then(Value::as_str) {
                    None | Some("") => error(400, "Password is required"),
                    Some(MASTER_PASSWORD) => {
                        state.issued += 1;
                        state.token = Some(format!("token-{}", state.issued));
                        ResponseTemplate::new(200).set_body_json(json!({ "status": "success" }))
                    }
                    Some(_) => {
                        state.token = None;
                        error(401, "Invalid password")
                    }
                }
            }
            ("GET", "/api/status") => {
                let status = if Self::authorized(&state, request) { "unlocked" } else { "locked" };
                ResponseTemplate::new(200).set_body_json(json!({ "status": status }))
            }
            ("POST", "/api/get-all-passwords") => {
                if !Self::authorized(&state, request) {
                    return error(401, "Unauthorized");
                }
                ResponseTemplate::new(200).set_body_json(&state.passwords)
            }
            ("POST", "/api/save-password") => {
                if !Self::authorized(&state, request) {
                    return error(401, "Unauthorized");
                }
                let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
                let name = body.get("name").and_then(Value::as_str).unwrap_or("");
                let password = body.get("password").and_then(Value::as_str).unwrap_or("");
                if name.is_empty() || password.is_empty() {
                    return error(400, "Missing name or password");
                }
                state.passwords.insert(name.to_string(), password.to_string());
                ResponseTemplate::new(200).set_body_json(json!({ "status": "success" }))
            }
            _ => ResponseTemplate::new(404),
        }
    }
}

pub fn client_for(server: &MockServer) -> VaultClient {
    VaultClient::new(&server.uri(), Duration::from_secs(2)).unwrap()
}

pub fn session_for(server: &MockServer) -> VaultSession {
    VaultSession::new(client_for(server))
}
