//! Verification paths for the session's current proof. Three independent
//! routes exist: checking the proof against the verification key locally,
//! submitting it to the relay (which also creates the policy), and asking a
//! third-party attestation service. Each records its outcome on the session;
//! remote failures are recorded, never propagated as errors.

use crate::artifacts::{ArtifactFetcher, ArtifactSource};
use crate::client::{AttestationClient, RelayClient};
use crate::config::ProverConfig;
use crate::error::VerifyError;
use crate::session::ProverSession;
use crate::submit::{PolicyRecord, normalize_policy_response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use zk_policy::groth16::verify_policy_proof;
use zk_policy::proof::{VerificationKeyJson, proof_from_json, signals_from_json, vk_from_json};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerifyPath {
    Local,
    RemoteRelay,
    ThirdPartyAttestation,
}

/// One verification attempt as recorded on the session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub path: VerifyPath,
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// What the relay said, normalized for display.
#[derive(Clone, Debug)]
pub struct RelayOutcome {
    pub verified: bool,
    pub status: String,
    pub message: Option<String>,
    pub policy: Option<PolicyRecord>,
}

pub struct VerificationCoordinator {
    fetcher: ArtifactFetcher,
    verification_key: ArtifactSource,
    relay: RelayClient,
    attestation: AttestationClient,
}

impl VerificationCoordinator {
    pub fn new(config: &ProverConfig) -> Self {
        Self {
            fetcher: ArtifactFetcher::new(config.call_timeout),
            verification_key: config.verification_key.clone(),
            relay: RelayClient::new(config.relay_url.clone(), config.call_timeout),
            attestation: AttestationClient::new(
                config.attestation_url.clone(),
                config.call_timeout,
            ),
        }
    }

    /// Check the current proof against the configured verification key.
    /// Tampered proofs come back as `Ok(false)`, not as errors.
    pub async fn verify_local(&self, session: &ProverSession) -> Result<bool, VerifyError> {
        let artifact = session
            .artifact()
            .await
            .ok_or(VerifyError::NoProofAvailable)?;

        let material = match self.load_verification_key().await {
            Ok(vk) => vk,
            Err(e) => {
                self.record(session, VerifyPath::Local, false, Some(json!({"error": e.to_string()})))
                    .await;
                return Err(e);
            }
        };

        let proof =
            proof_from_json(&artifact.proof).map_err(|e| VerifyError::Local(e.to_string()))?;
        let signals = signals_from_json(&artifact.public_signals)
            .map_err(|e| VerifyError::Local(e.to_string()))?;

        let verified =
            tokio::task::spawn_blocking(move || verify_policy_proof(&material, &proof, &signals))
                .await
                .map_err(|e| VerifyError::Local(format!("verification task failed: {e}")))?
                .map_err(|e| VerifyError::Local(e.to_string()))?;

        tracing::info!(verified, "local verification finished");
        self.record(session, VerifyPath::Local, verified, None).await;
        Ok(verified)
    }

    /// Submit the current proof to the relay. Network failures degrade to a
    /// recorded unverified outcome; `Err` is reserved for the missing-proof
    /// guard.
    pub async fn verify_via_relay(
        &self,
        session: &ProverSession,
    ) -> Result<RelayOutcome, VerifyError> {
        let artifact = session
            .artifact()
            .await
            .ok_or(VerifyError::NoProofAvailable)?;

        match self
            .relay
            .post_proof(&artifact.proof, &artifact.public_signals)
            .await
        {
            Ok(reply) => {
                let verified = reply.status == "verified";
                let policy = reply.policy_response.as_ref().map(|payload| {
                    match normalize_policy_response(payload) {
                        Ok(value) => PolicyRecord::from_response_value(&value),
                        Err(e) => {
                            tracing::warn!(error = %e, "policy response unusable, using placeholders");
                            PolicyRecord::placeholders()
                        }
                    }
                });
                let detail = serde_json::to_value(&reply).ok();
                self.record(session, VerifyPath::RemoteRelay, verified, detail)
                    .await;
                tracing::info!(status = %reply.status, verified, "relay verification finished");
                Ok(RelayOutcome {
                    verified,
                    status: reply.status,
                    message: reply.message,
                    policy,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "relay verification failed");
                self.record(
                    session,
                    VerifyPath::RemoteRelay,
                    false,
                    Some(json!({"error": e.to_string()})),
                )
                .await;
                Ok(RelayOutcome {
                    verified: false,
                    status: "error".to_string(),
                    message: Some(e.to_string()),
                    policy: None,
                })
            }
        }
    }

    /// Ask the third-party attestation service about the current proof.
    /// Service failures degrade to `Ok(false)` with a recorded outcome.
    pub async fn verify_via_third_party(
        &self,
        session: &ProverSession,
    ) -> Result<bool, VerifyError> {
        let artifact = session
            .artifact()
            .await
            .ok_or(VerifyError::NoProofAvailable)?;

        match self
            .attestation
            .verify(&artifact.proof, &artifact.public_signals)
            .await
        {
            Ok(reply) => {
                tracing::info!(verified = reply.verified, "attestation finished");
                self.record(session, VerifyPath::ThirdPartyAttestation, reply.verified, None)
                    .await;
                Ok(reply.verified)
            }
            Err(e) => {
                tracing::warn!(error = %e, "attestation failed");
                self.record(
                    session,
                    VerifyPath::ThirdPartyAttestation,
                    false,
                    Some(json!({"error": e.to_string()})),
                )
                .await;
                Ok(false)
            }
        }
    }

    async fn load_verification_key(
        &self,
    ) -> Result<ark_groth16::VerifyingKey<ark_bn254::Bn254>, VerifyError> {
        let bytes = self
            .fetcher
            .fetch(&self.verification_key)
            .await
            .map_err(|e| VerifyError::VerificationKeyUnavailable(e.to_string()))?;
        let json: VerificationKeyJson = serde_json::from_slice(&bytes)
            .map_err(|e| VerifyError::VerificationKeyUnavailable(format!("unreadable key: {e}")))?;
        vk_from_json(&json).map_err(|e| VerifyError::VerificationKeyUnavailable(e.to_string()))
    }

    async fn record(
        &self,
        session: &ProverSession,
        path: VerifyPath,
        verified: bool,
        detail: Option<serde_json::Value>,
    ) {
        session
            .record_outcome(VerificationOutcome {
                path,
                verified,
                detail,
            })
            .await;
    }
}
