//! Environment-based Configuration
//!
//! All sensitive values (signer keys) MUST come from environment variables,
//! never from hardcoded values.
//!
//! # Environment Variables
//!
//! ## Network Configuration
//! - `PRIVACY_NETWORK` - "mainnet", "testnet", or "devnet" (default: "devnet")
//! - `PRIVACY_SOLANA_RPC` - Solana RPC endpoint URL
//!
//! ## Program Addressing
//! - `PRIVACY_PROGRAM_ID` - privacy pool program ID
//!
//! ## Cryptographic Backend
//! - `PRIVACY_BACKEND` - "simulated" or "real" (default: "simulated")
//! - `PRIVACY_SIGNER_KEY` - Base58-encoded relayer keypair. Required for the
//!   real backend: if it is absent, the backend is forced to simulated at
//!   startup and the downgrade is logged. The mode is never re-inferred per
//!   call.
//!
//! ## Optional Settings
//! - `PRIVACY_DB_PATH` - SQLite path for durable commitment/nullifier sets
//!   (in-memory stores when unset)
//! - `PRIVACY_API_PORT` - REST API port (default: 3001)
//! - `PRIVACY_LOG_LEVEL` - Logging level (debug, info, warn, error)

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("network mismatch: expected {0}, got {1}")]
    NetworkMismatch(String, String),

    #[error("simulated backend not allowed on {0}")]
    SimulatedNotAllowed(String),
}

/// Network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "devnet" | "dev" => Ok(Network::Devnet),
            _ => Err(ConfigError::InvalidValue(
                "PRIVACY_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    /// Simulated artifacts are acceptable everywhere except mainnet
    pub fn allows_simulated_backend(&self) -> bool {
        matches!(self, Network::Devnet | Network::Testnet)
    }

    pub fn default_solana_rpc(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.mainnet-beta.solana.com",
            Network::Testnet => "https://api.testnet.solana.com",
            Network::Devnet => "https://api.devnet.solana.com",
        }
    }
}

/// Cryptographic backend selection, fixed once at startup.
///
/// The orchestrator never re-detects the backend at call time; it holds this
/// tag for the lifetime of the process so behavior stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Clearly labeled simulated artifacts; no real proving keys involved
    Simulated,
    /// Bulletproofs range proofs and ledger submission via the relayer key
    Real,
}

impl FromStr for BackendMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simulated" | "sim" | "demo" => Ok(BackendMode::Simulated),
            "real" => Ok(BackendMode::Real),
            _ => Err(ConfigError::InvalidValue(
                "PRIVACY_BACKEND".to_string(),
                format!("unknown backend: {} (use 'simulated' or 'real')", s),
            )),
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct PrivacyConfig {
    /// Network environment
    pub network: Network,

    /// Solana RPC endpoint
    pub solana_rpc: String,

    /// Privacy pool program ID
    pub program_id: String,

    /// Resolved cryptographic backend
    pub backend: BackendMode,

    /// Whether the backend was downgraded from "real" due to a missing key
    pub backend_forced_simulated: bool,

    /// Base58-encoded relayer keypair (real backend only)
    pub signer_key: Option<String>,

    /// SQLite path for durable stores; in-memory when None
    pub db_path: Option<String>,

    /// REST API port
    pub api_port: u16,

    /// Log level
    pub log_level: String,
}

impl PrivacyConfig {
    /// Load configuration from environment variables.
    ///
    /// Backend resolution is explicit: "real" without `PRIVACY_SIGNER_KEY`
    /// downgrades to simulated here, once, and records the downgrade so it is
    /// inspectable via `print_summary` and the result status of every
    /// operation.
    pub fn from_env() -> Result<Self, ConfigError> {
        let network: Network = env::var("PRIVACY_NETWORK")
            .unwrap_or_else(|_| "devnet".to_string())
            .parse()?;

        let solana_rpc = env::var("PRIVACY_SOLANA_RPC")
            .unwrap_or_else(|_| network.default_solana_rpc().to_string());

        let program_id = get_required_or_devnet_default(
            "PRIVACY_PROGRAM_ID",
            "EHHETRGEjk4E3AHanetjienJzzN5MhidSSoJvPzZMK8T",
            network,
        )?;

        let requested: BackendMode = env::var("PRIVACY_BACKEND")
            .unwrap_or_else(|_| "simulated".to_string())
            .parse()?;

        let signer_key = env::var("PRIVACY_SIGNER_KEY").ok().filter(|k| !k.is_empty());

        let (backend, backend_forced_simulated) = match (requested, &signer_key) {
            (BackendMode::Real, Some(_)) => (BackendMode::Real, false),
            (BackendMode::Real, None) => (BackendMode::Simulated, true),
            (BackendMode::Simulated, _) => (BackendMode::Simulated, false),
        };

        let db_path = env::var("PRIVACY_DB_PATH").ok().filter(|p| !p.is_empty());

        let api_port = env::var("PRIVACY_API_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let log_level = env::var("PRIVACY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            network,
            solana_rpc,
            program_id,
            backend,
            backend_forced_simulated,
            signer_key,
            db_path,
            api_port,
            log_level,
        })
    }

    /// Validate configuration for production readiness
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.network != Network::Mainnet {
            return Err(ConfigError::NetworkMismatch(
                "mainnet".to_string(),
                format!("{:?}", self.network),
            ));
        }

        if self.backend != BackendMode::Real {
            return Err(ConfigError::SimulatedNotAllowed("mainnet".to_string()));
        }

        if self.signer_key.is_none() {
            return Err(ConfigError::MissingEnvVar("PRIVACY_SIGNER_KEY".to_string()));
        }

        Ok(())
    }

    /// Print configuration summary (hiding sensitive values)
    pub fn print_summary(&self) {
        println!("=== Privacy Pool Configuration ===");
        println!("Network: {:?}", self.network);
        println!("Solana RPC: {}", self.solana_rpc);
        println!("Program ID: {}", self.program_id);
        println!(
            "Backend: {:?}{}",
            self.backend,
            if self.backend_forced_simulated {
                " (forced: PRIVACY_SIGNER_KEY not set)"
            } else {
                ""
            }
        );
        println!("Signer Key: {}", if self.signer_key.is_some() { "set" } else { "not set" });
        println!(
            "Storage: {}",
            self.db_path.as_deref().unwrap_or("in-memory")
        );
        println!("API Port: {}", self.api_port);
        println!("Log Level: {}", self.log_level);
        println!("==================================");
    }
}

/// Get required env var, or use default for devnet only
fn get_required_or_devnet_default(
    var_name: &str,
    devnet_default: &str,
    network: Network,
) -> Result<String, ConfigError> {
    match env::var(var_name) {
        Ok(value) => Ok(value),
        Err(_) => {
            if network == Network::Devnet {
                Ok(devnet_default.to_string())
            } else {
                Err(ConfigError::MissingEnvVar(var_name.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_parsing() {
        assert!(matches!("mainnet".parse::<Network>(), Ok(Network::Mainnet)));
        assert!(matches!("testnet".parse::<Network>(), Ok(Network::Testnet)));
        assert!(matches!("devnet".parse::<Network>(), Ok(Network::Devnet)));
        assert!("invalid".parse::<Network>().is_err());
    }

    #[test]
    fn test_backend_parsing() {
        assert!(matches!(
            "simulated".parse::<BackendMode>(),
            Ok(BackendMode::Simulated)
        ));
        assert!(matches!("real".parse::<BackendMode>(), Ok(BackendMode::Real)));
        assert!("quantum".parse::<BackendMode>().is_err());
    }

    #[test]
    fn test_simulated_backend_restrictions() {
        assert!(Network::Devnet.allows_simulated_backend());
        assert!(Network::Testnet.allows_simulated_backend());
        assert!(!Network::Mainnet.allows_simulated_backend());
    }
}
