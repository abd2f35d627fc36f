//! Common types shared across modules

pub mod error;

pub use error::{PrivacyError, Result};
