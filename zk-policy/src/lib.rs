//! ZK layer for the parametric-insurance policy pipeline.
//!
//! This crate contains:
//! - Deterministic encoding of free-text policy fields into circuit field elements.
//! - Canonical policy-input validation and assembly.
//! - A SNARK circuit binding policy parameters to a Poseidon commitment and
//!   enforcing the policy's numeric sanity rules.
//! - Groth16 prover/verifier orchestration plus snarkjs-style JSON codecs for
//!   proofs, public signals, and verification keys.

pub mod constants;
pub mod encode;
pub mod input;
pub mod circuit;
pub mod witness;
pub mod groth16;
pub mod proof;
