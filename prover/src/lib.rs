//! Client-side pipeline for parametric crop-insurance policies.
//!
//! Everything here orchestrates the three user-facing flows: proving a
//! policy satisfies the validation circuit, verifying that proof over one of
//! several independent paths (local key, remote relay, third-party
//! attestation), and materializing a policy record through the policy API.
//! The cryptographic primitives themselves live in the `zk-policy` crate.

pub mod artifacts;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod submit;
pub mod verify;
