//! Typed HTTP clients for the three external services the prover talks to:
//! the verification relay, the third-party attestation service, and the
//! policy API. Every call is bounded by the configured timeout.

use crate::error::ClientError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use zk_policy::proof::ProofJson;

/// Relay reply for a proof submission. `policy_response` carries whatever
/// the policy API answered: a JSON object when the relay could decode it, or
/// the raw body text when it could not.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_response: Option<PolicyResponsePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Object-or-string payload attached by the relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyResponsePayload {
    Structured(serde_json::Map<String, serde_json::Value>),
    Raw(String),
}

#[derive(Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Submit a proof bundle to the relay. The relay answers with its wire
    /// contract on every HTTP status, so the body is decoded regardless.
    pub async fn post_proof(
        &self,
        proof: &ProofJson,
        public_signals: &[String],
    ) -> Result<RelayResponse, ClientError> {
        let url = endpoint(&self.base_url, "/api/verify-proof");
        let body = json!({ "proof": proof, "publicSignals": public_signals });
        let (_, text) = post_json(&self.http, self.timeout, &url, &body).await?;
        decode(&text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttestationKeyInfo {
    protocol: &'static str,
    curve: &'static str,
    #[serde(rename = "nPublic")]
    n_public: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AttestationRequest<'a> {
    protocol: &'static str,
    curve: &'static str,
    proof: &'a ProofJson,
    public_signals: &'a [String],
    verification_key: AttestationKeyInfo,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AttestationResponse {
    pub verified: bool,
}

#[derive(Clone)]
pub struct AttestationClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl AttestationClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Ask the attestation service to check the proof. Only the key metadata
    /// travels with the request; the service holds the full key material.
    pub async fn verify(
        &self,
        proof: &ProofJson,
        public_signals: &[String],
    ) -> Result<AttestationResponse, ClientError> {
        let url = endpoint(&self.base_url, "/v1/verify");
        let body = AttestationRequest {
            protocol: zk_policy::constants::PROTOCOL,
            curve: zk_policy::constants::CURVE,
            proof,
            public_signals,
            verification_key: AttestationKeyInfo {
                protocol: zk_policy::constants::PROTOCOL,
                curve: zk_policy::constants::CURVE,
                n_public: public_signals.len(),
            },
        };
        let (status, text) = post_json(&self.http, self.timeout, &url, &body).await?;
        if !(200..300).contains(&status) {
            return Err(ClientError::Status { status, body: text });
        }
        decode(&text)
    }
}

/// Wire shape of one climate trigger inside a policy request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateParameter {
    pub parameter_type: String,
    pub threshold_value: u64,
    pub period_in_days: u32,
    pub trigger_above: bool,
    pub payout_percentage: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
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

/// Policy API acknowledgement. `warning` appears when the chain write was
/// deferred and the policy exists off-chain only.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCreated {
    pub policy_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct PolicyApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl PolicyApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            timeout,
        }
    }

    pub async fn create_policy(
        &self,
        request: &CreatePolicyRequest,
    ) -> Result<PolicyCreated, ClientError> {
        let url = endpoint(&self.base_url, "/api/policies");
        let (status, text) = post_json(&self.http, self.timeout, &url, request).await?;
        if !(200..300).contains(&status) {
            return Err(ClientError::Status { status, body: text });
        }
        decode(&text)
    }
}

fn endpoint(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

async fn post_json(
    http: &reqwest::Client,
    timeout: Duration,
    url: &str,
    body: &impl Serialize,
) -> Result<(u16, String), ClientError> {
    let exchange = async {
        let response = http.post(url).json(body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        Ok::<_, reqwest::Error>((status, text))
    };
    tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| ClientError::Timeout(timeout))?
        .map_err(ClientError::from)
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ClientError> {
    serde_json::from_str(text).map_err(|e| ClientError::Decode(format!("{e}: {text}")))
}
