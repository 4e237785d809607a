//! Host-side witness computation for the policy circuit.
//!
//! Bridges the string-typed `PolicyInput` into field elements, computes the
//! Poseidon commitment (matching the in-circuit sponge), and serializes the
//! full wire assignment into the byte format handed to the proving backend.

use crate::circuit::PolicyValidationCircuit;
use crate::constants::{poseidon_config, CircuitManifest};
use crate::encode::fr_from_numeric;
use crate::input::PolicyInput;
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::PoseidonSponge;
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WitnessError {
    #[error("circuit manifest rejected: {0}")]
    Manifest(String),

    #[error("field {field} is not a numeric value: {value:?}")]
    NonNumeric { field: &'static str, value: String },

    #[error("witness does not satisfy the policy circuit")]
    Unsatisfied,

    #[error("constraint synthesis error: {0}")]
    Synthesis(String),

    #[error("witness encoding error: {0}")]
    Encoding(String),
}

/// Number of wire values in a serialized witness: six public signals plus
/// seven private fields.
const WITNESS_LEN: usize = 13;

/// Field-element view of a `PolicyInput`, plus its Poseidon commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyAssignment {
    pub farmer_hash: Fr,
    pub coverage_amount: Fr,
    pub start_date: Fr,
    pub end_date: Fr,
    pub region_hash: Fr,
    pub crop_type_hash: Fr,
    pub parameter_type_hash: Fr,
    pub threshold_value: Fr,
    pub period_in_days: Fr,
    pub trigger_above: Fr,
    pub payout_percentage: Fr,
    pub current_timestamp: Fr,
    pub policy_commitment: Fr,
}

impl PolicyAssignment {
    /// Parse every field of a canonical input and derive the commitment.
    ///
    /// `trigger_above` arrives normalized to "true"/"false" from the builder;
    /// other spellings of truth were already folded there.
    pub fn from_input(input: &PolicyInput) -> Result<Self, WitnessError> {
        let parse = |field: &'static str, value: &str| {
            fr_from_numeric(value).map_err(|_| WitnessError::NonNumeric {
                field,
                value: value.to_string(),
            })
        };

        let trigger_above = if input.trigger_above == "true" {
            Fr::from(1u64)
        } else {
            Fr::from(0u64)
        };

        let mut a = Self {
            farmer_hash: parse("farmer_hash", &input.farmer_hash)?,
            coverage_amount: parse("coverage_amount", &input.coverage_amount)?,
            start_date: parse("start_date", &input.start_date)?,
            end_date: parse("end_date", &input.end_date)?,
            region_hash: parse("region_hash", &input.region_hash)?,
            crop_type_hash: parse("crop_type_hash", &input.crop_type_hash)?,
            parameter_type_hash: parse("parameter_type_hash", &input.parameter_type_hash)?,
            threshold_value: parse("threshold_value", &input.threshold_value)?,
            period_in_days: parse("period_in_days", &input.period_in_days)?,
            trigger_above,
            payout_percentage: parse("payout_percentage", &input.payout_percentage)?,
            current_timestamp: parse("current_timestamp", &input.current_timestamp)?,
            policy_commitment: Fr::from(0u64),
        };
        a.policy_commitment = policy_commitment(&a.absorb_order());
        Ok(a)
    }

    /// The twelve fields in canonical absorb order.
    pub fn absorb_order(&self) -> [Fr; 12] {
        [
            self.farmer_hash,
            self.coverage_amount,
            self.start_date,
            self.end_date,
            self.region_hash,
            self.crop_type_hash,
            self.parameter_type_hash,
            self.threshold_value,
            self.period_in_days,
            self.trigger_above,
            self.payout_percentage,
            self.current_timestamp,
        ]
    }

    /// Public signals in verifier order.
    ///
    /// ORDERING MUST MATCH the circuit's `new_input` allocation order.
    pub fn public_signals(&self) -> Vec<Fr> {
        vec![
            self.policy_commitment,
            self.region_hash,
            self.crop_type_hash,
            self.parameter_type_hash,
            self.start_date,
            self.end_date,
        ]
    }

    /// Instantiate the circuit with this assignment.
    pub fn circuit(&self) -> PolicyValidationCircuit {
        PolicyValidationCircuit {
            policy_commitment: self.policy_commitment,
            region_hash: self.region_hash,
            crop_type_hash: self.crop_type_hash,
            parameter_type_hash: self.parameter_type_hash,
            start_date: self.start_date,
            end_date: self.end_date,
            farmer_hash: self.farmer_hash,
            coverage_amount: self.coverage_amount,
            threshold_value: self.threshold_value,
            period_in_days: self.period_in_days,
            trigger_above: self.trigger_above,
            payout_percentage: self.payout_percentage,
            current_timestamp: self.current_timestamp,
        }
    }

    /// Recompute the commitment after a field was edited. Test helper for
    /// exercising individual constraints without tripping the binding check.
    pub fn rebind(&mut self) {
        self.policy_commitment = policy_commitment(&self.absorb_order());
    }
}

/// Compute the Poseidon commitment over the twelve canonical fields.
///
/// This MUST match the circuit's sponge usage absorb-for-absorb.
pub fn policy_commitment(fields: &[Fr; 12]) -> Fr {
    let cfg = poseidon_config();
    let mut sponge = PoseidonSponge::<Fr>::new(&cfg);
    for field in fields {
        sponge.absorb(field);
    }
    sponge.squeeze_field_elements(1)[0]
}

/// Full witness computation: validate the circuit manifest, derive the
/// assignment, and serialize the wire values.
///
/// `sanity_check` additionally synthesizes the constraint system and checks
/// satisfaction before serializing, mirroring the witness toolchain's
/// optional self-check flag. The proving flow passes `false` and lets the
/// proof itself carry soundness.
pub fn compute_witness(
    circuit_manifest: &[u8],
    input: &PolicyInput,
    sanity_check: bool,
) -> Result<Vec<u8>, WitnessError> {
    let manifest: CircuitManifest = serde_json::from_slice(circuit_manifest)
        .map_err(|e| WitnessError::Manifest(format!("unreadable manifest: {e}")))?;
    manifest.ensure_supported().map_err(WitnessError::Manifest)?;

    let assignment = PolicyAssignment::from_input(input)?;

    if sanity_check {
        let cs = ConstraintSystem::<Fr>::new_ref();
        assignment
            .circuit()
            .generate_constraints(cs.clone())
            .map_err(|e| WitnessError::Synthesis(format!("{e}")))?;
        if !cs.is_satisfied().map_err(|e| WitnessError::Synthesis(format!("{e}")))? {
            return Err(WitnessError::Unsatisfied);
        }
    }

    serialize_witness(&assignment)
}

/// Serialize the wire assignment: public signals first, then the remaining
/// private fields, in compressed canonical form.
pub fn serialize_witness(assignment: &PolicyAssignment) -> Result<Vec<u8>, WitnessError> {
    let mut wires = assignment.public_signals();
    wires.extend_from_slice(&[
        assignment.farmer_hash,
        assignment.coverage_amount,
        assignment.threshold_value,
        assignment.period_in_days,
        assignment.trigger_above,
        assignment.payout_percentage,
        assignment.current_timestamp,
    ]);

    let mut out = Vec::new();
    wires
        .serialize_compressed(&mut out)
        .map_err(|e| WitnessError::Encoding(format!("{e}")))?;
    Ok(out)
}

/// Reconstruct the assignment from serialized wire values.
pub fn deserialize_witness(bytes: &[u8]) -> Result<PolicyAssignment, WitnessError> {
    let wires = Vec::<Fr>::deserialize_compressed(bytes)
        .map_err(|e| WitnessError::Encoding(format!("{e}")))?;
    if wires.len() != WITNESS_LEN {
        return Err(WitnessError::Encoding(format!(
            "expected {WITNESS_LEN} wire values, got {}",
            wires.len()
        )));
    }

    Ok(PolicyAssignment {
        policy_commitment: wires[0],
        region_hash: wires[1],
        crop_type_hash: wires[2],
        parameter_type_hash: wires[3],
        start_date: wires[4],
        end_date: wires[5],
        farmer_hash: wires[6],
        coverage_amount: wires[7],
        threshold_value: wires[8],
        period_in_days: wires[9],
        trigger_above: wires[10],
        payout_percentage: wires[11],
        current_timestamp: wires[12],
    })
}
