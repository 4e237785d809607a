//! Proof generation pipeline: validate the form fields, fetch the circuit,
//! compute the witness, fetch the proving key, prove, and install the result
//! on the session. Heavy work runs on blocking threads and every stage is
//! individually bounded and classified.

use crate::artifacts::{ArtifactFetcher, ArtifactSource};
use crate::config::ProverConfig;
use crate::error::ProofError;
use crate::session::ProverSession;
use std::sync::Arc;
use std::time::Duration;
use zk_policy::groth16::{ZkError, prove_from_bytes};
use zk_policy::input::{PolicyInput, PolicyInputBuilder, RawPolicyFields};
use zk_policy::proof::{ProofArtifact, ProofJson, proof_to_json, signals_to_json};
use zk_policy::witness::{WitnessError, compute_witness};

/// Turns a circuit artifact and canonical input into witness bytes.
pub trait WitnessCalculator: Send + Sync {
    fn calculate(
        &self,
        circuit: &[u8],
        input: &PolicyInput,
        sanity_check: bool,
    ) -> Result<Vec<u8>, WitnessError>;
}

/// Turns a proving key and witness bytes into a proof and public signals.
pub trait ProvingBackend: Send + Sync {
    fn prove(&self, proving_key: &[u8], witness: &[u8]) -> Result<(ProofJson, Vec<String>), ZkError>;
}

/// The arkworks implementation of both stages.
#[derive(Clone, Copy, Debug, Default)]
pub struct Groth16Backend;

impl WitnessCalculator for Groth16Backend {
    fn calculate(
        &self,
        circuit: &[u8],
        input: &PolicyInput,
        sanity_check: bool,
    ) -> Result<Vec<u8>, WitnessError> {
        compute_witness(circuit, input, sanity_check)
    }
}

impl ProvingBackend for Groth16Backend {
    fn prove(&self, proving_key: &[u8], witness: &[u8]) -> Result<(ProofJson, Vec<String>), ZkError> {
        let mut rng = rand::rngs::OsRng;
        let (proof, signals) = prove_from_bytes(&mut rng, proving_key, witness)?;
        Ok((proof_to_json(&proof), signals_to_json(&signals)))
    }
}

pub struct ProofEngine {
    fetcher: ArtifactFetcher,
    circuit: ArtifactSource,
    proving_key: ArtifactSource,
    witness: Arc<dyn WitnessCalculator>,
    prover: Arc<dyn ProvingBackend>,
    call_timeout: Duration,
}

impl ProofEngine {
    pub fn new(config: &ProverConfig) -> Self {
        Self::with_backends(config, Arc::new(Groth16Backend), Arc::new(Groth16Backend))
    }

    pub fn with_backends(
        config: &ProverConfig,
        witness: Arc<dyn WitnessCalculator>,
        prover: Arc<dyn ProvingBackend>,
    ) -> Self {
        Self {
            fetcher: ArtifactFetcher::new(config.call_timeout),
            circuit: config.circuit.clone(),
            proving_key: config.proving_key.clone(),
            witness,
            prover,
            call_timeout: config.call_timeout,
        }
    }

    /// Run the full generation pipeline and install the resulting artifact as
    /// the session's current proof. Only one generation per session runs at a
    /// time; a second call while one is in flight fails immediately.
    pub async fn generate(
        &self,
        session: &ProverSession,
        raw: &RawPolicyFields,
    ) -> Result<Arc<ProofArtifact>, ProofError> {
        let _guard = session
            .try_begin_generation()
            .ok_or(ProofError::GenerationInFlight)?;

        // Input validation happens before any artifact is fetched, so a
        // half-filled form never costs a network round trip.
        let input = PolicyInputBuilder::build(raw)?;
        tracing::info!("policy input validated");

        let circuit = self
            .fetcher
            .fetch(&self.circuit)
            .await
            .map_err(ProofError::CircuitUnavailable)?;
        tracing::debug!(bytes = circuit.len(), source = %self.circuit, "circuit fetched");

        let witness = {
            let calculator = self.witness.clone();
            let input = input.clone();
            let task =
                tokio::task::spawn_blocking(move || calculator.calculate(&circuit, &input, false));
            // On timeout the blocking task is abandoned, not cancelled.
            tokio::time::timeout(self.call_timeout, task)
                .await
                .map_err(|_| ProofError::Timeout {
                    stage: "witness computation",
                    after: self.call_timeout,
                })?
                .map_err(|e| ProofError::WitnessComputationFailed(format!("task failed: {e}")))?
                .map_err(|e| ProofError::WitnessComputationFailed(e.to_string()))?
        };
        tracing::debug!(bytes = witness.len(), "witness computed");

        let proving_key = self
            .fetcher
            .fetch(&self.proving_key)
            .await
            .map_err(|e| ProofError::ProvingFailed(format!("proving key unavailable: {e}")))?;

        let (proof, public_signals) = {
            let prover = self.prover.clone();
            let task = tokio::task::spawn_blocking(move || prover.prove(&proving_key, &witness));
            tokio::time::timeout(self.call_timeout, task)
                .await
                .map_err(|_| ProofError::Timeout {
                    stage: "proof generation",
                    after: self.call_timeout,
                })?
                .map_err(|e| ProofError::ProvingFailed(format!("task failed: {e}")))?
                .map_err(|e| ProofError::ProvingFailed(e.to_string()))?
        };
        tracing::info!(signals = public_signals.len(), "proof generated");

        let artifact = ProofArtifact {
            proof,
            public_signals,
            input,
        };
        Ok(session.install_artifact(artifact).await)
    }
}
