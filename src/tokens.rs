//! Supported Settlement Tokens
//!
//! The privacy pool settles in a fixed set of stablecoins. Amounts travel
//! through the system in micro-units (10^-6 of a token), matching the SPL
//! mint decimals of both supported assets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::Network;

/// Micro-units per whole token (both supported mints use 6 decimals)
pub const MICRO_UNITS_PER_TOKEN: u64 = 1_000_000;

/// Stablecoins accepted for pool and vault operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SupportedToken {
    Usdc,
    Usd1,
}

impl SupportedToken {
    /// All supported tokens, in display order
    pub const ALL: [SupportedToken; 2] = [SupportedToken::Usdc, SupportedToken::Usd1];

    pub fn symbol(&self) -> &'static str {
        match self {
            SupportedToken::Usdc => "USDC",
            SupportedToken::Usd1 => "USD1",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SupportedToken::Usdc => "USD Coin",
            SupportedToken::Usd1 => "USD1 (World Liberty)",
        }
    }

    pub fn decimals(&self) -> u8 {
        6
    }

    /// Mint address for the given network
    pub fn mint(&self, network: Network) -> &'static str {
        match (self, network) {
            (SupportedToken::Usdc, Network::Mainnet) => {
                "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
            }
            (SupportedToken::Usdc, _) => "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
            // USD1 uses the same mint on all networks
            (SupportedToken::Usd1, _) => "USD1ttGY1N17NEEHLmELoaybftRBUSErhqYiQzvEmuB",
        }
    }
}

impl FromStr for SupportedToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USDC" => Ok(SupportedToken::Usdc),
            "USD1" => Ok(SupportedToken::Usd1),
            other => Err(format!("unsupported token: {} (supported: USDC, USD1)", other)),
        }
    }
}

impl fmt::Display for SupportedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Convert a whole-token amount to micro-units with proper rounding
pub fn to_micro(amount: f64) -> u64 {
    (amount * MICRO_UNITS_PER_TOKEN as f64).round() as u64
}

pub fn from_micro(units: u64) -> f64 {
    units as f64 / MICRO_UNITS_PER_TOKEN as f64
}

pub fn format_units(units: u64, token: SupportedToken) -> String {
    format!("{:.2} {}", from_micro(units), token.symbol())
}
