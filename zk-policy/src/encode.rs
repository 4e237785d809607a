//! Deterministic encoding of free-text policy fields into field elements.
//!
//! Free text (region, crop type, climate parameter) never enters the circuit
//! directly. It is hashed with Keccak-256 and the digest is carried as the
//! decimal rendering of a 256-bit unsigned integer, which is what the proving
//! toolchain expects for circuit inputs. Parsing back into BN254 reduces
//! modulo the field, matching the toolchain's own coercion.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use sha3::{Digest, Keccak256};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("not a numeric field value: {0:?}")]
    NonNumeric(String),
}

/// Hash arbitrary UTF-8 text into a decimal field-value string.
///
/// Deterministic and collision-resistant; the output is the full 256-bit
/// digest in decimal, not yet reduced modulo the scalar field.
pub fn encode(text: &str) -> String {
    let mut hasher = Keccak256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    BigUint::from_bytes_be(&digest).to_str_radix(10)
}

/// Parse a decimal string into a BN254 scalar, reducing modulo the field.
///
/// Strict decimal only; used for wire values (public signals, proof
/// coordinates) which are always emitted in decimal.
pub fn fr_from_decimal(s: &str) -> Result<Fr, EncodeError> {
    Fr::from_str(s.trim()).map_err(|_| EncodeError::NonNumeric(s.to_string()))
}

/// Parse a user-facing numeric string into a BN254 scalar.
///
/// Accepts decimal or `0x`-prefixed hex, the two spellings the original input
/// format admits. Either way the value is reduced modulo the field.
pub fn fr_from_numeric(s: &str) -> Result<Fr, EncodeError> {
    let t = s.trim();
    if let Some(hex_digits) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        let n = BigUint::parse_bytes(hex_digits.as_bytes(), 16)
            .ok_or_else(|| EncodeError::NonNumeric(s.to_string()))?;
        return Ok(Fr::from(n));
    }
    fr_from_decimal(t)
}

/// Canonical decimal rendering of a BN254 scalar.
pub fn fr_to_decimal(x: &Fr) -> String {
    x.to_string()
}

/// 0x-prefixed big-endian hex rendering of a BN254 scalar (32 bytes).
///
/// Used for the `zkProofHash` field of policy submissions.
pub fn fr_to_hex(x: &Fr) -> String {
    format!("0x{}", hex::encode(x.into_bigint().to_bytes_be()))
}
