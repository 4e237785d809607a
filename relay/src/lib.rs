//! Verification relay. Accepts proof bundles over HTTP, checks them against
//! the policy verification key, and forwards verified policies to the policy
//! API on behalf of the prover.

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod state;
