//! REST API
//!
//! HTTP surface for the privacy pool operations:
//! - `POST /api/privacy/deposit` - shielded pool deposit
//! - `POST /api/privacy/withdraw` - shielded pool withdrawal
//! - `POST /api/privacy/vault-deposit` - shielded vault deposit
//! - `POST /api/privacy/commission` - amount-hidden commission payment
//! - `GET/POST /api/privacy/milestones` - TVL milestone checks and proofs
//! - `GET /api/privacy/balance` - pool balance lookup
//! - `GET /api/privacy/vaults` - vault catalog
//! - `GET /api/health` - liveness and backend mode

pub mod routes;
pub mod server;

pub use server::{build_router, start_server, AppState};
