//! Vault Share Accounting
//!
//! Deposits mint proportional shares, withdrawals burn them. All rounding
//! is floor, toward the vault: repeated deposit/withdraw cycles can never
//! extract more than was deposited.
//!
//! Fee composition is fixed so share price stays deterministic and
//! auditable:
//! 1. management fee accrued pro-rata on elapsed time against total assets
//! 2. performance fee on share-price gains above the high-water mark
//! 3. withdrawal fee on the gross payout
//!
//! Fees move to `fees_collected`, outside `total_assets`, so the
//! empty-vault invariant (`total_assets == 0 <=> total_shares == 0`)
//! survives the last withdrawal.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::common::{PrivacyError, Result};

const BPS_DENOM: u128 = 10_000;
const SECONDS_PER_YEAR: u128 = 31_536_000;

/// Share price scale: price is tracked in micro-units per share
const PRICE_SCALE: u128 = 1_000_000;

/// Fee schedule in basis points
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FeeSchedule {
    pub management_fee_bps: u16,
    pub performance_fee_bps: u16,
    pub withdrawal_fee_bps: u16,
}

/// Per-wallet share position
#[derive(Debug, Clone)]
pub struct ShareAccount {
    pub shares: u64,
    pub last_deposit_at: DateTime<Utc>,
}

/// Public vault snapshot for listings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultInfo {
    pub id: String,
    pub name: String,
    pub total_assets: u64,
    pub total_shares: u64,
    pub management_fee_bps: u16,
    pub performance_fee_bps: u16,
    pub withdrawal_fee_bps: u16,
    pub lock_period_days: u32,
    pub halted: bool,
}

/// A pooled-asset vault. Single writer: the registry hands out one lock
/// per vault, so every method here runs inside a critical section.
pub struct Vault {
    id: String,
    name: String,
    total_assets: u64,
    total_shares: u64,
    fees: FeeSchedule,
    lock_period_days: u32,
    accounts: HashMap<String, ShareAccount>,
    /// Accrued fees held outside total_assets
    fees_collected: u64,
    /// High-water mark of the share price, in micro-units per share
    high_water_mark: u64,
    last_accrual: DateTime<Utc>,
    /// Set on invariant violation; all further mutation is rejected
    halted: bool,
}

impl Vault {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        fees: FeeSchedule,
        lock_period_days: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            total_assets: 0,
            total_shares: 0,
            fees,
            lock_period_days,
            accounts: HashMap::new(),
            fees_collected: 0,
            high_water_mark: PRICE_SCALE as u64,
            last_accrual: now,
            halted: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn total_assets(&self) -> u64 {
        self.total_assets
    }

    pub fn total_shares(&self) -> u64 {
        self.total_shares
    }

    pub fn fees_collected(&self) -> u64 {
        self.fees_collected
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn shares_of(&self, wallet: &str) -> u64 {
        self.accounts.get(wallet).map(|a| a.shares).unwrap_or(0)
    }

    pub fn info(&self) -> VaultInfo {
        VaultInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            total_assets: self.total_assets,
            total_shares: self.total_shares,
            management_fee_bps: self.fees.management_fee_bps,
            performance_fee_bps: self.fees.performance_fee_bps,
            withdrawal_fee_bps: self.fees.withdrawal_fee_bps,
            lock_period_days: self.lock_period_days,
            halted: self.halted,
        }
    }

    /// Reject mutation on a halted or corrupted vault. A corrupted state is
    /// never silently repaired: the vault halts and the error surfaces.
    fn guard(&mut self) -> Result<()> {
        if self.halted {
            return Err(PrivacyError::InvariantViolation(format!(
                "vault {} is halted",
                self.id
            )));
        }

        let empty_mismatch = (self.total_assets == 0) != (self.total_shares == 0);
        if empty_mismatch {
            self.halted = true;
            return Err(PrivacyError::InvariantViolation(format!(
                "vault {}: total_assets={} total_shares={}",
                self.id, self.total_assets, self.total_shares
            )));
        }

        Ok(())
    }

    /// Accrue management and performance fees up to `now`.
    ///
    /// Runs before the share-price division of any deposit or withdrawal
    /// so the price every caller sees is post-fee.
    fn accrue_fees(&mut self, now: DateTime<Utc>) {
        if self.total_shares == 0 {
            self.last_accrual = now;
            return;
        }

        let elapsed = (now - self.last_accrual).num_seconds().max(0) as u128;
        self.last_accrual = now;

        // 1. management fee, pro-rata per year on total assets
        if self.fees.management_fee_bps > 0 && elapsed > 0 {
            let fee = (self.total_assets as u128 * self.fees.management_fee_bps as u128 * elapsed)
                / (BPS_DENOM * SECONDS_PER_YEAR);
            // never drain assets to zero while shares are outstanding
            let fee = (fee as u64).min(self.total_assets.saturating_sub(1));
            self.total_assets -= fee;
            self.fees_collected += fee;
        }

        // 2. performance fee on gains above the high-water mark
        if self.fees.performance_fee_bps > 0 {
            let price = (self.total_assets as u128 * PRICE_SCALE) / self.total_shares as u128;
            if price > self.high_water_mark as u128 {
                let gain_assets = ((price - self.high_water_mark as u128)
                    * self.total_shares as u128)
                    / PRICE_SCALE;
                let fee = (gain_assets * self.fees.performance_fee_bps as u128) / BPS_DENOM;
                let fee = (fee as u64).min(self.total_assets.saturating_sub(1));
                self.total_assets -= fee;
                self.fees_collected += fee;

                self.high_water_mark =
                    ((self.total_assets as u128 * PRICE_SCALE) / self.total_shares as u128) as u64;
            }
        }
    }

    /// Deposit `amount` underlying units, minting proportional shares.
    ///
    /// Bootstrap: an empty vault mints 1:1. Otherwise
    /// `floor(amount * total_shares / total_assets)`; the floor may mint
    /// zero shares for dust deposits; the dust stays with the vault.
    pub fn deposit(&mut self, wallet: &str, amount: u64, now: DateTime<Utc>) -> Result<u64> {
        self.guard()?;

        if amount == 0 {
            return Err(PrivacyError::validation("deposit amount must be positive"));
        }

        self.accrue_fees(now);

        let shares_minted = if self.total_shares == 0 {
            amount
        } else {
            // guard() already established total_assets > 0 here
            ((amount as u128 * self.total_shares as u128) / self.total_assets as u128) as u64
        };

        self.total_assets = self
            .total_assets
            .checked_add(amount)
            .ok_or_else(|| PrivacyError::InvariantViolation("total_assets overflow".to_string()))?;
        self.total_shares = self
            .total_shares
            .checked_add(shares_minted)
            .ok_or_else(|| PrivacyError::InvariantViolation("total_shares overflow".to_string()))?;

        let account = self
            .accounts
            .entry(wallet.to_string())
            .or_insert_with(|| ShareAccount {
                shares: 0,
                last_deposit_at: now,
            });
        account.shares += shares_minted;
        account.last_deposit_at = now;

        Ok(shares_minted)
    }

    /// Burn `shares` and return the net payout in underlying units.
    ///
    /// The lock-period policy check runs before any arithmetic; the
    /// withdrawal fee is taken from the gross payout.
    pub fn withdraw(&mut self, wallet: &str, shares: u64, now: DateTime<Utc>) -> Result<u64> {
        self.guard()?;

        if shares == 0 {
            return Err(PrivacyError::validation("share amount must be positive"));
        }

        let account = self
            .accounts
            .get(wallet)
            .ok_or_else(|| PrivacyError::validation(format!("no position for wallet {}", wallet)))?;

        if shares > account.shares {
            return Err(PrivacyError::validation(format!(
                "insufficient shares: have {}, requested {}",
                account.shares, shares
            )));
        }

        let unlock_at = account.last_deposit_at + Duration::days(self.lock_period_days as i64);
        if now < unlock_at {
            let remaining = (unlock_at - now).num_days() + 1;
            return Err(PrivacyError::VaultLocked(format!(
                "locked for {} more day(s)",
                remaining
            )));
        }

        self.accrue_fees(now);

        if self.total_shares == 0 || self.total_assets == 0 {
            self.halted = true;
            return Err(PrivacyError::InvariantViolation(format!(
                "vault {}: shares outstanding with empty totals",
                self.id
            )));
        }

        let gross =
            ((shares as u128 * self.total_assets as u128) / self.total_shares as u128) as u64;
        let fee = ((gross as u128 * self.fees.withdrawal_fee_bps as u128) / BPS_DENOM) as u64;
        let net = gross - fee;

        self.total_assets -= gross;
        self.total_shares -= shares;
        self.fees_collected += fee;

        let account = self.accounts.get_mut(wallet).expect("position checked above");
        account.shares -= shares;

        Ok(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_fees() -> FeeSchedule {
        FeeSchedule::default()
    }

    fn vault(fees: FeeSchedule, lock_days: u32) -> (Vault, DateTime<Utc>) {
        let now = Utc::now();
        (Vault::new("v1", "Test Vault", fees, lock_days, now), now)
    }

    #[test]
    fn test_bootstrap_one_to_one() {
        let (mut v, now) = vault(no_fees(), 0);

        let shares = v.deposit("alice", 1000, now).unwrap();
        assert_eq!(shares, 1000);
        assert_eq!(v.total_assets(), 1000);
        assert_eq!(v.total_shares(), 1000);
    }

    #[test]
    fn test_proportional_deposit_and_withdraw() {
        let (mut v, now) = vault(no_fees(), 0);
        v.deposit("alice", 1000, now).unwrap();

        let shares = v.deposit("bob", 500, now).unwrap();
        assert_eq!(shares, 500);

        let returned = v.withdraw("bob", 500, now).unwrap();
        assert_eq!(returned, 500);
        assert_eq!(v.total_assets(), 1000);
        assert_eq!(v.total_shares(), 1000);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let (mut v, now) = vault(no_fees(), 0);
        assert!(matches!(
            v.deposit("alice", 0, now),
            Err(PrivacyError::Validation(_))
        ));
        v.deposit("alice", 100, now).unwrap();
        assert!(matches!(
            v.withdraw("alice", 0, now),
            Err(PrivacyError::Validation(_))
        ));
    }

    #[test]
    fn test_withdraw_more_than_held_rejected() {
        let (mut v, now) = vault(no_fees(), 0);
        v.deposit("alice", 100, now).unwrap();

        assert!(matches!(
            v.withdraw("alice", 101, now),
            Err(PrivacyError::Validation(_))
        ));
        assert!(matches!(
            v.withdraw("mallory", 1, now),
            Err(PrivacyError::Validation(_))
        ));
    }

    #[test]
    fn test_rounding_never_favors_withdrawer() {
        // seed an off-balance vault: price slightly above 1
        let now = Utc::now();
        let mut v = Vault::new("v1", "Test Vault", no_fees(), 0, now);
        v.total_assets = 1_000_000;
        v.total_shares = 999_999;
        v.accounts.insert(
            "cycler".to_string(),
            ShareAccount {
                shares: 999_999,
                last_deposit_at: now,
            },
        );

        let mut deposited_total = 0u64;
        let mut extracted_total = 0u64;

        for _ in 0..1000 {
            deposited_total += 1;
            v.deposit("cycler", 1, now).unwrap();
            extracted_total += v.withdraw("cycler", 1, now).unwrap();
        }

        assert!(
            extracted_total <= deposited_total,
            "extracted {} > deposited {}",
            extracted_total,
            deposited_total
        );
    }

    #[test]
    fn test_lock_period_enforced() {
        let (mut v, now) = vault(no_fees(), 7);
        v.deposit("alice", 1000, now).unwrap();

        let day3 = now + Duration::days(3);
        assert!(matches!(
            v.withdraw("alice", 100, day3),
            Err(PrivacyError::VaultLocked(_))
        ));
        // state untouched by the policy rejection
        assert_eq!(v.total_assets(), 1000);
        assert_eq!(v.shares_of("alice"), 1000);

        let day8 = now + Duration::days(8);
        assert_eq!(v.withdraw("alice", 100, day8).unwrap(), 100);
    }

    #[test]
    fn test_new_deposit_resets_lock() {
        let (mut v, now) = vault(no_fees(), 7);
        v.deposit("alice", 1000, now).unwrap();

        let day10 = now + Duration::days(10);
        v.deposit("alice", 100, day10).unwrap();

        let day12 = now + Duration::days(12);
        assert!(matches!(
            v.withdraw("alice", 10, day12),
            Err(PrivacyError::VaultLocked(_))
        ));
    }

    #[test]
    fn test_withdrawal_fee_leaves_total_assets() {
        let fees = FeeSchedule {
            withdrawal_fee_bps: 100, // 1%
            ..Default::default()
        };
        let (mut v, now) = vault(fees, 0);
        v.deposit("alice", 10_000, now).unwrap();

        let net = v.withdraw("alice", 10_000, now).unwrap();
        assert_eq!(net, 9_900);
        assert_eq!(v.fees_collected(), 100);
        // fee does not linger inside total_assets
        assert_eq!(v.total_assets(), 0);
        assert_eq!(v.total_shares(), 0);
    }

    #[test]
    fn test_management_fee_accrues_over_time() {
        let fees = FeeSchedule {
            management_fee_bps: 200, // 2% per year
            ..Default::default()
        };
        let (mut v, now) = vault(fees, 0);
        v.deposit("alice", 1_000_000, now).unwrap();

        // a deposit half a year later triggers accrual
        let later = now + Duration::days(182);
        v.deposit("bob", 1, later).unwrap();

        // roughly 1% of 1M drained to fees
        assert!(v.fees_collected() >= 9_900 && v.fees_collected() <= 10_000);
        assert_eq!(v.total_assets(), 1_000_001 - v.fees_collected());
    }

    #[test]
    fn test_performance_fee_on_gains() {
        let fees = FeeSchedule {
            performance_fee_bps: 2_000, // 20% of gains
            ..Default::default()
        };
        let now = Utc::now();
        let mut v = Vault::new("v1", "Test Vault", fees, 0, now);
        v.deposit("alice", 1_000_000, now).unwrap();

        // simulate yield doubling the assets
        v.total_assets = 2_000_000;

        let later = now + Duration::seconds(60);
        v.deposit("bob", 1, later).unwrap();

        // 20% of the 1M gain
        assert_eq!(v.fees_collected(), 200_000);
        // high-water mark moved up, so a second touch takes nothing more
        let fees_before = v.fees_collected();
        v.deposit("bob", 1, later + Duration::seconds(60)).unwrap();
        assert_eq!(v.fees_collected(), fees_before);
    }

    #[test]
    fn test_corrupted_state_halts_vault() {
        let now = Utc::now();
        let mut v = Vault::new("v1", "Test Vault", no_fees(), 0, now);
        // corrupted: shares outstanding with zero assets
        v.total_shares = 500;
        v.accounts.insert(
            "ghost".to_string(),
            ShareAccount {
                shares: 500,
                last_deposit_at: now,
            },
        );

        let err = v.deposit("alice", 100, now).unwrap_err();
        assert!(matches!(err, PrivacyError::InvariantViolation(_)));
        assert!(v.is_halted());

        // halted vault rejects everything, including otherwise valid calls
        let err = v.deposit("alice", 100, now).unwrap_err();
        assert!(matches!(err, PrivacyError::InvariantViolation(_)));
    }

    #[test]
    fn test_dust_deposit_mints_zero_shares() {
        let now = Utc::now();
        let mut v = Vault::new("v1", "Test Vault", no_fees(), 0, now);
        v.total_assets = 1_000_000;
        v.total_shares = 999_999;
        v.accounts.insert(
            "alice".to_string(),
            ShareAccount {
                shares: 999_999,
                last_deposit_at: now,
            },
        );

        // floor(1 * 999_999 / 1_000_000) == 0: dust stays with the vault
        let minted = v.deposit("alice", 1, now).unwrap();
        assert_eq!(minted, 0);
        assert_eq!(v.total_assets(), 1_000_001);
    }
}
