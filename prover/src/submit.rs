//! Policy materialization. After a relay verification this derives the
//! display-ready policy record from whatever the relay attached, and for
//! deployments without a relay it can submit the policy straight to the
//! policy API alongside the proof's commitment hash.

use crate::client::{ClimateParameter, CreatePolicyRequest, PolicyApiClient, PolicyCreated, PolicyResponsePayload};
use crate::config::ProverConfig;
use crate::error::SubmitError;
use crate::session::ProverSession;
use crate::verify::RelayOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use zk_policy::input::RawPolicyFields;
use zk_policy::proof::ProofArtifact;

pub const POLICY_ID_PLACEHOLDER: &str = "ID não encontrado";
pub const TX_HASH_PLACEHOLDER: &str = "hash não disponível";
pub const BLOCK_PLACEHOLDER: &str = "bloco não encontrado";

/// Display fields for a created policy. Anything the relay's payload did not
/// carry is filled with its placeholder text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub policy_id: String,
    pub transaction_hash: String,
    pub block_number: String,
}

impl PolicyRecord {
    pub fn placeholders() -> Self {
        Self {
            policy_id: POLICY_ID_PLACEHOLDER.to_string(),
            transaction_hash: TX_HASH_PLACEHOLDER.to_string(),
            block_number: BLOCK_PLACEHOLDER.to_string(),
        }
    }

    /// Pull the three display fields out of a policy payload. Numbers render
    /// as their decimal text; missing or oddly-typed fields fall back to the
    /// placeholders.
    pub fn from_response_value(value: &Value) -> Self {
        Self {
            policy_id: field_as_string(value, "policyId")
                .unwrap_or_else(|| POLICY_ID_PLACEHOLDER.to_string()),
            transaction_hash: field_as_string(value, "transactionHash")
                .unwrap_or_else(|| TX_HASH_PLACEHOLDER.to_string()),
            block_number: field_as_string(value, "blockNumber")
                .unwrap_or_else(|| BLOCK_PLACEHOLDER.to_string()),
        }
    }
}

fn field_as_string(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Error)]
#[error("malformed policy response: {0}")]
pub struct MalformedPolicyResponse(pub String);

/// Normalize the relay's object-or-string payload into one JSON value. A
/// string payload is itself JSON text from the policy API and gets a second
/// parse; if that fails the payload is unusable.
pub fn normalize_policy_response(
    payload: &PolicyResponsePayload,
) -> Result<Value, MalformedPolicyResponse> {
    match payload {
        PolicyResponsePayload::Structured(map) => Ok(Value::Object(map.clone())),
        PolicyResponsePayload::Raw(text) => {
            serde_json::from_str(text).map_err(|e| MalformedPolicyResponse(e.to_string()))
        }
    }
}

/// Outcome of the policy step after a relay round trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyOutcome {
    Recorded(PolicyRecord),
    /// The proof went through but no policy payload came back. A defined
    /// partial success, not an error.
    VerifiedWithoutPolicy,
}

pub struct PolicySubmitter {
    policy_api: PolicyApiClient,
}

impl PolicySubmitter {
    pub fn new(config: &ProverConfig) -> Self {
        Self {
            policy_api: PolicyApiClient::new(config.policy_api_url.clone(), config.call_timeout),
        }
    }

    /// Map a relay outcome to the policy step's result. Only a verified
    /// status with an attached payload counts as a recorded policy.
    pub fn policy_outcome(relay: &RelayOutcome) -> PolicyOutcome {
        match (&*relay.status, &relay.policy) {
            ("verified", Some(record)) => PolicyOutcome::Recorded(record.clone()),
            _ => PolicyOutcome::VerifiedWithoutPolicy,
        }
    }

    /// Submit a policy for the session's current proof directly to the
    /// policy API, bypassing the relay.
    pub async fn submit_direct(
        &self,
        session: &ProverSession,
        raw: &RawPolicyFields,
    ) -> Result<PolicyCreated, SubmitError> {
        let artifact = session
            .artifact()
            .await
            .ok_or(SubmitError::NoProofAvailable)?;

        let request = policy_request(raw, &artifact).map_err(SubmitError::Request)?;
        let created = self.policy_api.create_policy(&request).await?;
        tracing::info!(policy_id = created.policy_id, "policy recorded");
        Ok(created)
    }
}

/// Build the policy API request from the raw form fields and the proof's
/// commitment hash. The free-text fields travel in clear; only the circuit
/// saw their hashes.
pub fn policy_request(
    raw: &RawPolicyFields,
    artifact: &ProofArtifact,
) -> Result<CreatePolicyRequest, String> {
    Ok(CreatePolicyRequest {
        farmer: raw.farmer_hash.trim().to_string(),
        coverage_amount: parse_number(&raw.coverage_amount, "coverage_amount")?,
        start_date: parse_number(&raw.start_date, "start_date")?,
        end_date: parse_number(&raw.end_date, "end_date")?,
        region: raw.region_hash.trim().to_string(),
        crop_type: raw.crop_type_hash.trim().to_string(),
        parameters: vec![ClimateParameter {
            parameter_type: raw.parameter_type_hash.trim().to_string(),
            threshold_value: parse_number(&raw.threshold_value, "threshold_value")?,
            period_in_days: parse_number(&raw.period_in_days, "period_in_days")?,
            trigger_above: raw.trigger_above.trim() == "true" || raw.trigger_above.trim() == "1",
            payout_percentage: parse_number(&raw.payout_percentage, "payout_percentage")?,
        }],
        zk_proof_hash: artifact.zk_proof_hash().map_err(|e| e.to_string())?,
    })
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("field {field} is not numeric: {value:?}"))
}
