pub mod cli;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod debug;
pub mod error;
pub mod generator;
pub mod models;
pub mod search;
pub mod session;
pub mod tui;

// Re-export commonly used types for tests and external use
pub use client::VaultClient;
pub use config::ClientConfig;
pub use error::VaultError;
pub use generator::{generate, GeneratorError};
pub use models::*;
pub use session::{VaultSession, VaultState};
