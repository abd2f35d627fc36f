//! Vault Accounting
//!
//! Share-based proportional ownership accounting for pooled assets, plus
//! the registry that serializes mutations per vault.

pub mod accounting;
pub mod registry;

pub use accounting::{FeeSchedule, ShareAccount, Vault, VaultInfo};
pub use registry::VaultRegistry;
