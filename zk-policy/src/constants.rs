//! Crate-wide constants used by the ZK circuit and host-side orchestration.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{find_poseidon_ark_and_mds, PoseidonConfig};
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

/// Proof system identifier used on every wire format.
pub const PROTOCOL: &str = "groth16";

/// Curve identifier as the proving toolchain spells it (BN254).
pub const CURVE: &str = "bn128";

/// Name of the policy-validation circuit. Artifacts carry it so a prover
/// cannot accidentally feed inputs to a different circuit's keys.
pub const CIRCUIT_NAME: &str = "policy_validation";

/// Bumped whenever the constraint system changes shape. Keys and manifests
/// from different versions must never be mixed.
pub const CIRCUIT_VERSION: u32 = 1;

/// Canonical order of the twelve input fields, as absorbed by the commitment
/// sponge and as carried by `PolicyInput`.
pub const INPUT_ORDER: [&str; 12] = [
    "farmer_hash",
    "coverage_amount",
    "start_date",
    "end_date",
    "region_hash",
    "crop_type_hash",
    "parameter_type_hash",
    "threshold_value",
    "period_in_days",
    "trigger_above",
    "payout_percentage",
    "current_timestamp",
];

/// Number of public signals: commitment, three field hashes, start, end.
pub const NUM_PUBLIC_SIGNALS: usize = 6;

/// Longest admissible observation window, in days (one leap year).
pub const MAX_PERIOD_DAYS: u64 = 366;

/// Payout is a percentage of the covered amount.
pub const MAX_PAYOUT_PERCENT: u64 = 100;

/// Numeric policy fields (amounts, dates, day counts) are range-checked to
/// this many bits inside the circuit. The `*_hash` fields are full field
/// elements and deliberately exempt.
pub const VALUE_BITS: usize = 64;

// Poseidon sponge configuration.
//
// Width-3 sponge (rate=2, capacity=1); the round counts are consistent with
// widely used Poseidon instantiations for BN254.
pub const POSEIDON_RATE: usize = 2;
pub const POSEIDON_CAPACITY: usize = 1;
pub const POSEIDON_FULL_ROUNDS: usize = 8;
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// Poseidon S-box exponent (alpha).
pub const POSEIDON_ALPHA: u64 = 5;

/// Deterministically derive Poseidon parameters for BN254::Fr.
///
/// Uses arkworks' parameter derivation helper (Ark + MDS) so the native
/// hasher and the in-circuit gadget agree on the same constants.
pub fn poseidon_config() -> PoseidonConfig<Fr> {
    let prime_bits = Fr::MODULUS_BIT_SIZE as u64;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        POSEIDON_RATE,
        POSEIDON_FULL_ROUNDS as u64,
        POSEIDON_PARTIAL_ROUNDS as u64,
        0,
    );

    PoseidonConfig::new(
        POSEIDON_FULL_ROUNDS,
        POSEIDON_PARTIAL_ROUNDS,
        POSEIDON_ALPHA,
        mds,
        ark,
        POSEIDON_RATE,
        POSEIDON_CAPACITY,
    )
}

/// Descriptor of the compiled circuit, distributed alongside the proving key.
///
/// The witness calculator refuses to run against a manifest that does not
/// match the circuit this crate was built with; keys produced for one circuit
/// shape must never be used with inputs laid out for another.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CircuitManifest {
    pub name: String,
    pub version: u32,
    pub curve: String,
    pub n_public: usize,
    pub input_order: Vec<String>,
}

impl CircuitManifest {
    /// The manifest describing the circuit built into this crate.
    pub fn builtin() -> Self {
        Self {
            name: CIRCUIT_NAME.to_string(),
            version: CIRCUIT_VERSION,
            curve: CURVE.to_string(),
            n_public: NUM_PUBLIC_SIGNALS,
            input_order: INPUT_ORDER.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Check that this manifest matches the built-in circuit.
    pub fn ensure_supported(&self) -> Result<(), String> {
        let builtin = Self::builtin();
        if self.name != builtin.name {
            return Err(format!("unknown circuit {:?}, expected {:?}", self.name, builtin.name));
        }
        if self.version != builtin.version {
            return Err(format!(
                "circuit version mismatch: artifact is v{}, this build expects v{}",
                self.version, builtin.version
            ));
        }
        if self.curve != builtin.curve {
            return Err(format!("curve mismatch: {:?}, expected {:?}", self.curve, builtin.curve));
        }
        if self.n_public != builtin.n_public {
            return Err(format!(
                "public signal count mismatch: {} vs {}",
                self.n_public, builtin.n_public
            ));
        }
        if self.input_order != builtin.input_order {
            return Err("input field order differs from the built-in circuit".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_manifest_is_supported() {
        CircuitManifest::builtin().ensure_supported().unwrap();
    }

    #[test]
    fn manifest_version_mismatch_is_rejected() {
        let mut m = CircuitManifest::builtin();
        m.version += 1;
        let err = m.ensure_supported().unwrap_err();
        assert!(err.contains("version mismatch"));
    }

    #[test]
    fn manifest_field_order_is_checked() {
        let mut m = CircuitManifest::builtin();
        m.input_order.swap(0, 1);
        assert!(m.ensure_supported().is_err());
    }
}
