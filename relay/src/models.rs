use serde::{Deserialize, Serialize};
use zk_policy::proof::ProofJson;

/// Proof bundle as the prover submits it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProofRequest {
    pub proof: ProofJson,
    pub public_signals: Vec<String>,
}

/// Relay reply. `policy_response` carries the policy API's answer verbatim:
/// its JSON body on success, the raw response text otherwise.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyProofResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_response: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Policy API request shape.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicyRequest {
    pub farmer: String,
    pub coverage_amount: u64,
    pub start_date: i64,
    pub end_date: i64,
    pub region: String,
    pub crop_type: String,
    pub parameters: Vec<ClimateParameter>,
    pub zk_proof_hash: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateParameter {
    pub parameter_type: String,
    pub threshold_value: u64,
    pub period_in_days: u32,
    pub trigger_above: bool,
    pub payout_percentage: u32,
}
