//! Otus Privacy Backend
//!
//! Server-side services for the shielded pool and vault engine:
//! 1. REST API - client-facing deposit/withdraw/vault/commission operations
//! 2. Demo - walks one shielded deposit/withdraw cycle locally
//!
//! Run modes:
//!   cargo run -- api             - Start REST API (for frontend)
//!   cargo run -- demo            - Run interactive demo

use std::env;

use otus_privacy::config::PrivacyConfig;
use otus_privacy::orchestrator::PrivacyService;
use otus_privacy::tokens::{format_units, SupportedToken};
use otus_privacy::{api, logging};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    match args[1].as_str() {
        "api" => run_api_server(&args[2..]).await,
        "demo" => run_demo().await,
        "help" | "--help" | "-h" => print_usage(),
        _ => print_usage(),
    }
}

fn print_usage() {
    println!("Otus Privacy Backend - Shielded Pool Services");
    println!();
    println!("Usage:");
    println!("  otus-privacy-api api [--port <port>]   Start REST API server (default: 3001)");
    println!("  otus-privacy-api demo                  Run interactive demo");
    println!();
    println!("Environment Variables:");
    println!("  PRIVACY_NETWORK       mainnet, testnet or devnet (default: devnet)");
    println!("  PRIVACY_SOLANA_RPC    Solana RPC endpoint");
    println!("  PRIVACY_PROGRAM_ID    Privacy pool program ID");
    println!("  PRIVACY_BACKEND       'simulated' or 'real' (default: simulated)");
    println!("  PRIVACY_SIGNER_KEY    Base58 relayer keypair (required for 'real')");
    println!("  PRIVACY_DB_PATH       SQLite path (in-memory stores when unset)");
    println!("  PRIVACY_API_PORT      REST API port (default: 3001)");
    println!("  PRIVACY_LOG_LEVEL     Logging level (default: info)");
}

fn load_config() -> PrivacyConfig {
    match PrivacyConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Start REST API server
async fn run_api_server(args: &[String]) {
    let config = load_config();

    if let Err(e) = logging::init_from_config(&config) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let mut port = config.api_port;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                port = args[i + 1].parse().unwrap_or(port);
                i += 2;
            }
            _ => i += 1,
        }
    }

    config.print_summary();
    if config.backend_forced_simulated {
        tracing::warn!(
            target: "privacy::system",
            "PRIVACY_BACKEND=real requested without PRIVACY_SIGNER_KEY; running simulated"
        );
    }

    let service = match PrivacyService::from_config(config).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to build service: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = api::start_server(service, port).await {
        eprintln!("API server error: {}", e);
    }
}

/// Walk one shielded deposit/withdraw cycle against an in-memory service
async fn run_demo() {
    let mut config = load_config();
    config.db_path = None;

    println!("\n=== Otus Privacy Demo ===\n");
    config.print_summary();
    println!();

    let service = match PrivacyService::from_config(config).await {
        Ok(service) => service,
        Err(e) => {
            eprintln!("Failed to build service: {}", e);
            return;
        }
    };

    let wallet = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
    let amount = 100_000_000; // 100 USDC
    let token = SupportedToken::Usdc;

    println!("1. DEPOSIT {} for {}", format_units(amount, token), wallet);
    let deposit = match service.deposit(wallet, amount, token).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Deposit failed: {}", e);
            return;
        }
    };
    println!("   tx:         {}", deposit.tx_reference);
    println!("   commitment: {}...", &deposit.commitment[..16]);
    println!("   status:     {:?}", deposit.status);
    println!("   (note secret returned to caller, never stored server-side)");
    println!();

    println!("2. WITHDRAW {} using the note secret", format_units(amount / 2, token));
    match service
        .withdraw(wallet, None, amount / 2, token, Some(&deposit.secret))
        .await
    {
        Ok(outcome) => {
            println!("   tx:      {}", outcome.tx_reference);
            println!("   message: {}", outcome.message);
        }
        Err(e) => eprintln!("   Withdraw failed: {}", e),
    }
    println!();

    println!("3. REPLAY the same note secret (must be rejected)");
    match service
        .withdraw(wallet, None, amount / 4, token, Some(&deposit.secret))
        .await
    {
        Ok(_) => eprintln!("   UNEXPECTED: replay accepted"),
        Err(e) => println!("   rejected as expected: {}", e),
    }
    println!();

    println!("4. MILESTONES");
    match service.check_milestones(token).await {
        Ok(statuses) => {
            for status in statuses {
                println!(
                    "   {:>4}: {}",
                    status.label,
                    if status.reached { "reached" } else { "not reached" }
                );
            }
        }
        Err(e) => eprintln!("   Milestone check failed: {}", e),
    }

    println!("\n=== Demo Complete ===");
}
