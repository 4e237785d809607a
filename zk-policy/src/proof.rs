//! snarkjs-style JSON wire formats for proofs, public signals, and
//! verification keys, plus the `ProofArtifact` bundle the pipeline carries.
//!
//! Points travel as decimal coordinate strings with the projective tail the
//! proving toolchain emits (`"1"` for G1, `["1","0"]` for G2). Every parsed
//! point is checked for curve and subgroup membership before it reaches the
//! pairing code.

use crate::constants::{CURVE, PROTOCOL};
use crate::encode::{fr_from_decimal, fr_to_decimal, fr_to_hex};
use crate::input::PolicyInput;
use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_groth16::{Proof, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProofCodecError {
    #[error("invalid field value: {0:?}")]
    FieldValue(String),

    #[error("{point}: point is not on the curve")]
    NotOnCurve { point: &'static str },

    #[error("{point}: point is not in the prime-order subgroup")]
    NotInSubgroup { point: &'static str },

    #[error("malformed {what}: {detail}")]
    Shape { what: &'static str, detail: String },
}

/// Groth16 proof as the proving toolchain renders it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofJson {
    pub pi_a: [String; 3],
    pub pi_b: [[String; 2]; 3],
    pub pi_c: [String; 3],
    pub protocol: String,
    pub curve: String,
}

/// Verification key in the toolchain's JSON layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKeyJson {
    pub protocol: String,
    pub curve: String,
    #[serde(rename = "nPublic")]
    pub n_public: usize,
    pub vk_alpha_1: [String; 3],
    pub vk_beta_2: [[String; 2]; 3],
    pub vk_gamma_2: [[String; 2]; 3],
    pub vk_delta_2: [[String; 2]; 3],
    #[serde(rename = "IC")]
    pub ic: Vec<[String; 3]>,
}

/// Everything produced by one successful proof generation. Immutable; the
/// session holds it until reset or until a newer artifact replaces it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofArtifact {
    pub proof: ProofJson,
    #[serde(rename = "publicSignals")]
    pub public_signals: Vec<String>,
    pub input: PolicyInput,
}

impl ProofArtifact {
    /// The commitment signal, first in verifier order.
    pub fn commitment_signal(&self) -> Option<&str> {
        self.public_signals.first().map(|s| s.as_str())
    }

    /// 0x-hex rendering of the policy commitment, used as `zkProofHash` on
    /// policy submissions.
    pub fn zk_proof_hash(&self) -> Result<String, ProofCodecError> {
        let signal = self.commitment_signal().ok_or(ProofCodecError::Shape {
            what: "public signals",
            detail: "empty signal list".to_string(),
        })?;
        let fr = fr_from_decimal(signal).map_err(|_| ProofCodecError::FieldValue(signal.to_string()))?;
        Ok(fr_to_hex(&fr))
    }
}

fn fq_from_decimal(s: &str) -> Result<Fq, ProofCodecError> {
    Fq::from_str(s.trim()).map_err(|_| ProofCodecError::FieldValue(s.to_string()))
}

fn g1_from_json(coords: &[String; 3], point: &'static str) -> Result<G1Affine, ProofCodecError> {
    match coords[2].as_str() {
        "0" => return Ok(G1Affine::identity()),
        "1" => {}
        other => {
            return Err(ProofCodecError::Shape {
                what: point,
                detail: format!("unnormalized projective tail {other:?}"),
            })
        }
    }

    let x = fq_from_decimal(&coords[0])?;
    let y = fq_from_decimal(&coords[1])?;
    let p = G1Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err(ProofCodecError::NotOnCurve { point });
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProofCodecError::NotInSubgroup { point });
    }
    Ok(p)
}

fn g1_to_json(p: &G1Affine) -> [String; 3] {
    if p.infinity {
        return ["0".to_string(), "1".to_string(), "0".to_string()];
    }
    [p.x.to_string(), p.y.to_string(), "1".to_string()]
}

fn g2_from_json(coords: &[[String; 2]; 3], point: &'static str) -> Result<G2Affine, ProofCodecError> {
    let tail = [coords[2][0].as_str(), coords[2][1].as_str()];
    match tail {
        ["0", "0"] => return Ok(G2Affine::identity()),
        ["1", "0"] => {}
        _ => {
            return Err(ProofCodecError::Shape {
                what: point,
                detail: format!("unnormalized projective tail {tail:?}"),
            })
        }
    }

    let x = Fq2::new(fq_from_decimal(&coords[0][0])?, fq_from_decimal(&coords[0][1])?);
    let y = Fq2::new(fq_from_decimal(&coords[1][0])?, fq_from_decimal(&coords[1][1])?);
    let p = G2Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err(ProofCodecError::NotOnCurve { point });
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(ProofCodecError::NotInSubgroup { point });
    }
    Ok(p)
}

fn g2_to_json(p: &G2Affine) -> [[String; 2]; 3] {
    if p.infinity {
        return [
            ["0".to_string(), "0".to_string()],
            ["1".to_string(), "0".to_string()],
            ["0".to_string(), "0".to_string()],
        ];
    }
    [
        [p.x.c0.to_string(), p.x.c1.to_string()],
        [p.y.c0.to_string(), p.y.c1.to_string()],
        ["1".to_string(), "0".to_string()],
    ]
}

pub fn proof_to_json(proof: &Proof<Bn254>) -> ProofJson {
    ProofJson {
        pi_a: g1_to_json(&proof.a),
        pi_b: g2_to_json(&proof.b),
        pi_c: g1_to_json(&proof.c),
        protocol: PROTOCOL.to_string(),
        curve: CURVE.to_string(),
    }
}

pub fn proof_from_json(json: &ProofJson) -> Result<Proof<Bn254>, ProofCodecError> {
    if json.protocol != PROTOCOL {
        return Err(ProofCodecError::Shape {
            what: "proof",
            detail: format!("protocol {:?}, expected {PROTOCOL:?}", json.protocol),
        });
    }
    if json.curve != CURVE {
        return Err(ProofCodecError::Shape {
            what: "proof",
            detail: format!("curve {:?}, expected {CURVE:?}", json.curve),
        });
    }

    Ok(Proof {
        a: g1_from_json(&json.pi_a, "pi_a")?,
        b: g2_from_json(&json.pi_b, "pi_b")?,
        c: g1_from_json(&json.pi_c, "pi_c")?,
    })
}

pub fn vk_to_json(vk: &VerifyingKey<Bn254>) -> VerificationKeyJson {
    VerificationKeyJson {
        protocol: PROTOCOL.to_string(),
        curve: CURVE.to_string(),
        n_public: vk.gamma_abc_g1.len().saturating_sub(1),
        vk_alpha_1: g1_to_json(&vk.alpha_g1),
        vk_beta_2: g2_to_json(&vk.beta_g2),
        vk_gamma_2: g2_to_json(&vk.gamma_g2),
        vk_delta_2: g2_to_json(&vk.delta_g2),
        ic: vk.gamma_abc_g1.iter().map(g1_to_json).collect(),
    }
}

pub fn vk_from_json(json: &VerificationKeyJson) -> Result<VerifyingKey<Bn254>, ProofCodecError> {
    if json.protocol != PROTOCOL || json.curve != CURVE {
        return Err(ProofCodecError::Shape {
            what: "verification key",
            detail: format!("protocol/curve {:?}/{:?}", json.protocol, json.curve),
        });
    }
    if json.ic.len() != json.n_public + 1 {
        return Err(ProofCodecError::Shape {
            what: "verification key",
            detail: format!("IC length {} does not match nPublic {}", json.ic.len(), json.n_public),
        });
    }

    let mut gamma_abc_g1 = Vec::with_capacity(json.ic.len());
    for coords in &json.ic {
        gamma_abc_g1.push(g1_from_json(coords, "IC")?);
    }

    Ok(VerifyingKey {
        alpha_g1: g1_from_json(&json.vk_alpha_1, "vk_alpha_1")?,
        beta_g2: g2_from_json(&json.vk_beta_2, "vk_beta_2")?,
        gamma_g2: g2_from_json(&json.vk_gamma_2, "vk_gamma_2")?,
        delta_g2: g2_from_json(&json.vk_delta_2, "vk_delta_2")?,
        gamma_abc_g1,
    })
}

/// Render public signals in verifier order as decimal strings.
pub fn signals_to_json(signals: &[Fr]) -> Vec<String> {
    signals.iter().map(fr_to_decimal).collect()
}

/// Parse decimal public signals back into field elements.
pub fn signals_from_json(strings: &[String]) -> Result<Vec<Fr>, ProofCodecError> {
    strings
        .iter()
        .map(|s| fr_from_decimal(s).map_err(|_| ProofCodecError::FieldValue(s.clone())))
        .collect()
}
