//! R1CS circuit for policy-parameter validation.
//!
//! What this circuit proves (for one policy):
//! 1) The prover knows the full set of policy fields (amounts, dates, window,
//!    payout, trigger direction) behind a public Poseidon commitment.
//! 2) The numeric fields satisfy the policy sanity rules: coverage and
//!    threshold are nonzero, the coverage window is ordered and starts no
//!    earlier than the proving-time clock, the observation period and payout
//!    percentage sit inside their configured bounds, and the trigger
//!    direction is boolean.
//! 3) The public field hashes (region, crop type, climate parameter) and the
//!    public dates are the same values bound by the commitment.
//!
//! Privacy: coverage amount, threshold, period, trigger, payout and the
//! farmer identifier stay private. Only the commitment, the three text-field
//! hashes and the coverage window are public.

use crate::constants::{poseidon_config, MAX_PAYOUT_PERCENT, MAX_PERIOD_DAYS, VALUE_BITS};
use ark_bn254::Fr;
use ark_crypto_primitives::sponge::constraints::CryptographicSpongeVar;
use ark_crypto_primitives::sponge::poseidon::constraints::PoseidonSpongeVar;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::boolean::Boolean;
use ark_r1cs_std::convert::ToBitsGadget;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_r1cs_std::fields::FieldVar;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

/// Enforce that `v` fits in `VALUE_BITS` bits.
///
/// Numeric policy fields live in u64 range; pinning the upper bits of the
/// canonical decomposition to zero rules out field-wraparound tricks in the
/// ordering comparisons below.
fn constrain_u64(v: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let bits = v.to_bits_le()?;
    for b in &bits[VALUE_BITS..] {
        b.enforce_equal(&Boolean::constant(false))?;
    }
    Ok(())
}

/// Enforce `a <= b` for values already constrained to u64 range.
///
/// `b - a` can only stay inside u64 range when no borrow occurred.
fn enforce_leq_u64(a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let diff = b.clone() - a.clone();
    constrain_u64(&diff)
}

/// Enforce `a < b` for values already constrained to u64 range.
fn enforce_lt_u64(a: &FpVar<Fr>, b: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let diff = b.clone() - a.clone() - FpVar::<Fr>::constant(Fr::from(1u64));
    constrain_u64(&diff)
}

/// Enforce `v != 0`.
fn enforce_nonzero(v: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let nz = v.is_neq(&FpVar::<Fr>::constant(Fr::from(0u64)))?;
    nz.enforce_equal(&Boolean::constant(true))
}

/// Enforce `v * (v - 1) == 0`, i.e. v is 0 or 1.
fn enforce_boolean(v: &FpVar<Fr>) -> Result<(), SynthesisError> {
    let shifted = v.clone() - FpVar::<Fr>::constant(Fr::from(1u64));
    let prod = v.clone() * shifted;
    prod.enforce_equal(&FpVar::<Fr>::constant(Fr::from(0u64)))
}

/// Circuit proving commitment binding and policy-parameter sanity.
#[derive(Clone, Debug)]
pub struct PolicyValidationCircuit {
    /// Public Poseidon commitment over all twelve policy fields.
    pub policy_commitment: Fr,

    /// Public field hashes and coverage window.
    pub region_hash: Fr,
    pub crop_type_hash: Fr,
    pub parameter_type_hash: Fr,
    pub start_date: Fr,
    pub end_date: Fr,

    /// Private policy fields.
    pub farmer_hash: Fr,
    pub coverage_amount: Fr,
    pub threshold_value: Fr,
    pub period_in_days: Fr,
    pub trigger_above: Fr,
    pub payout_percentage: Fr,
    pub current_timestamp: Fr,
}

impl ConstraintSynthesizer<Fr> for PolicyValidationCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // --- Public inputs ---
        // IMPORTANT: Ordering MUST match `witness::PolicyAssignment::public_signals`.
        // We use: commitment, region, crop_type, parameter_type, start, end.
        let public_commitment = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.policy_commitment))?;
        let region_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.region_hash))?;
        let crop_type_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.crop_type_hash))?;
        let parameter_type_hash = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.parameter_type_hash))?;
        let start_date = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.start_date))?;
        let end_date = FpVar::<Fr>::new_input(cs.clone(), || Ok(self.end_date))?;

        // --- Witness (private) fields ---
        let farmer_hash = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.farmer_hash))?;
        let coverage_amount = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.coverage_amount))?;
        let threshold_value = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.threshold_value))?;
        let period_in_days = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.period_in_days))?;
        let trigger_above = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.trigger_above))?;
        let payout_percentage = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.payout_percentage))?;
        let current_timestamp = FpVar::<Fr>::new_witness(cs.clone(), || Ok(self.current_timestamp))?;

        // Range constrain every numeric field so the ordering comparisons are
        // unambiguous. The three text hashes and the farmer identifier are
        // full field elements and stay unconstrained.
        constrain_u64(&coverage_amount)?;
        constrain_u64(&start_date)?;
        constrain_u64(&end_date)?;
        constrain_u64(&threshold_value)?;
        constrain_u64(&period_in_days)?;
        constrain_u64(&payout_percentage)?;
        constrain_u64(&current_timestamp)?;

        // Policy sanity rules.
        enforce_nonzero(&coverage_amount)?;
        enforce_nonzero(&threshold_value)?;
        enforce_lt_u64(&start_date, &end_date)?;
        enforce_leq_u64(&current_timestamp, &start_date)?;

        enforce_nonzero(&period_in_days)?;
        enforce_leq_u64(&period_in_days, &FpVar::<Fr>::constant(Fr::from(MAX_PERIOD_DAYS)))?;

        enforce_nonzero(&payout_percentage)?;
        enforce_leq_u64(&payout_percentage, &FpVar::<Fr>::constant(Fr::from(MAX_PAYOUT_PERCENT)))?;

        enforce_boolean(&trigger_above)?;

        // Commitment binding: absorb all twelve fields in canonical order.
        // IMPORTANT: MUST match `witness::policy_commitment` absorb-for-absorb.
        let poseidon_cfg = poseidon_config();
        let mut sponge = PoseidonSpongeVar::<Fr>::new(cs.clone(), &poseidon_cfg);
        for field in [
            &farmer_hash,
            &coverage_amount,
            &start_date,
            &end_date,
            &region_hash,
            &crop_type_hash,
            &parameter_type_hash,
            &threshold_value,
            &period_in_days,
            &trigger_above,
            &payout_percentage,
            &current_timestamp,
        ] {
            sponge.absorb(field)?;
        }

        let commitment = sponge.squeeze_field_elements(1)?[0].clone();
        commitment.enforce_equal(&public_commitment)?;

        Ok(())
    }
}
