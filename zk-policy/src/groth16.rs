//! Groth16 prover/verifier orchestration for the policy circuit.
//!
//! SECURITY NOTE (prototype): Groth16 requires a trusted setup that produces
//! a proving key (PK) and verifying key (VK). This crate generates keys
//! locally via `setup_policy_keys`. In production, an MPC ceremony (or a
//! transparent system) should be used.

use crate::circuit::PolicyValidationCircuit;
use crate::witness::{deserialize_witness, policy_commitment, PolicyAssignment, WitnessError};
use ark_bn254::{Bn254, Fr};
use ark_groth16::{prepare_verifying_key, Groth16, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZkError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("witness error: {0}")]
    Witness(#[from] WitnessError),

    #[error("arkworks error: {0}")]
    Ark(String),
}

/// A satisfiable placeholder assignment used to lay out constraints during
/// key generation. Groth16 setup only depends on the constraint shape, but a
/// valid assignment keeps the same values usable as a smoke-test fixture.
fn setup_assignment() -> PolicyAssignment {
    let start = Fr::from(1_750_000_000u64);
    let mut a = PolicyAssignment {
        farmer_hash: Fr::from(1u64),
        coverage_amount: Fr::from(50_000u64),
        start_date: start,
        end_date: Fr::from(1_750_600_000u64),
        region_hash: Fr::from(2u64),
        crop_type_hash: Fr::from(3u64),
        parameter_type_hash: Fr::from(4u64),
        threshold_value: Fr::from(120u64),
        period_in_days: Fr::from(30u64),
        trigger_above: Fr::from(1u64),
        payout_percentage: Fr::from(80u64),
        current_timestamp: start,
        policy_commitment: Fr::from(0u64),
    };
    a.policy_commitment = policy_commitment(&a.absorb_order());
    a
}

/// Generate a Groth16 keypair for the policy circuit.
pub fn setup_policy_keys(rng: &mut impl RngCore) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ZkError> {
    let circuit = setup_assignment().circuit();

    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;

    let vk = pk.vk.clone();
    Ok((pk, vk))
}

/// Prove a policy assignment.
pub fn prove_policy(
    rng: &mut impl RngCore,
    pk: &ProvingKey<Bn254>,
    assignment: &PolicyAssignment,
) -> Result<Proof<Bn254>, ZkError> {
    let proof = Groth16::<Bn254>::create_random_proof_with_reduction(assignment.circuit(), pk, rng)
        .map_err(|e| ZkError::Ark(format!("{e}")))?;
    Ok(proof)
}

/// Prove from serialized artifacts: a proving key and a witness byte blob.
///
/// Returns the proof together with the public signals recovered from the
/// witness, which is what goes on the wire.
pub fn prove_from_bytes(
    rng: &mut impl RngCore,
    pk_bytes: &[u8],
    witness_bytes: &[u8],
) -> Result<(Proof<Bn254>, Vec<Fr>), ZkError> {
    let pk = deserialize_pk(pk_bytes)?;
    let assignment = deserialize_witness(witness_bytes)?;
    let proof = prove_policy(rng, &pk, &assignment)?;
    Ok((proof, assignment.public_signals()))
}

/// Verify a policy proof. Returns the verifier's boolean; an invalid proof is
/// `Ok(false)`, not an error.
pub fn verify_policy_proof(
    vk: &VerifyingKey<Bn254>,
    proof: &Proof<Bn254>,
    public_inputs: &[Fr],
) -> Result<bool, ZkError> {
    let pvk = prepare_verifying_key(vk);
    Groth16::<Bn254>::verify_proof(&pvk, proof, public_inputs).map_err(|e| ZkError::Ark(format!("{e}")))
}

/// Serialize a proving key to bytes.
pub fn serialize_pk(pk: &ProvingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    pk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_pk(bytes: &[u8]) -> Result<ProvingKey<Bn254>, ZkError> {
    ProvingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_vk(vk: &VerifyingKey<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    vk.serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_vk(bytes: &[u8]) -> Result<VerifyingKey<Bn254>, ZkError> {
    VerifyingKey::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}

pub fn serialize_proof(proof: &Proof<Bn254>) -> Result<Vec<u8>, ZkError> {
    let mut out = Vec::new();
    proof
        .serialize_compressed(&mut out)
        .map_err(|e| ZkError::Serialization(format!("{e}")))?;
    Ok(out)
}

pub fn deserialize_proof(bytes: &[u8]) -> Result<Proof<Bn254>, ZkError> {
    Proof::<Bn254>::deserialize_compressed(bytes)
        .map_err(|e| ZkError::Serialization(format!("{e}")))
}
