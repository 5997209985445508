use crate::config::ClientConfig;
use crate::models::VaultStatus;
use crate::session::{VaultSession, VaultState};

pub async fn debug_vault(config: &ClientConfig, session: &mut VaultSession) {
    println!("🔍 Absconditus Debug Information");
    println!("================================");

    match ClientConfig::config_path() {
        Ok(path) => {
            println!("Config path: {}", path.display());
            println!("Config file exists: {}", path.exists());
        }
        Err(e) => println!("❌ Failed to determine config path: {}", e),
    }

    println!("Server URL: {}", session.client().base_url());
    println!("Request timeout: {} ms", config.timeout_ms);
    println!("Default password length: {}", config.password_length);

    match session.request_token().await {
        Ok(_) => println!("Token request: ✅"),
        Err(e) => println!("Token request: ❌ ({})", e),
    }

    if session.state() == VaultState::Unlocked {
        match session.status().await {
            Ok(VaultStatus::Unlocked) => println!("Token accepted: ✅"),
            Ok(VaultStatus::Locked) => println!("Token accepted: ❌ (server reports locked)"),
            Err(e) => println!("Token accepted: ❌ ({})", e),
        }
    }

    println!("State: {}", session.state());
}
