//! End-to-end exercises of the prover pipeline against in-process HTTP
//! services. One test drives the real arkworks backend from form fields all
//! the way to a relayed policy record; the rest use stub backends so the
//! coordinator and submitter behavior stays fast to check.

use axum::{Json, Router, routing::post};
use prover::artifacts::ArtifactSource;
use prover::config::ProverConfig;
use prover::engine::{ProofEngine, ProvingBackend, WitnessCalculator};
use prover::error::{SubmitError, VerifyError};
use prover::session::ProverSession;
use prover::submit::{
    BLOCK_PLACEHOLDER, POLICY_ID_PLACEHOLDER, PolicyOutcome, PolicySubmitter, TX_HASH_PLACEHOLDER,
};
use prover::verify::{VerificationCoordinator, VerifyPath};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use zk_policy::constants::CircuitManifest;
use zk_policy::groth16::{ZkError, serialize_pk, setup_policy_keys};
use zk_policy::input::{PolicyInput, RawPolicyFields};
use zk_policy::proof::{ProofJson, vk_to_json};
use zk_policy::witness::WitnessError;

fn valid_raw() -> RawPolicyFields {
    RawPolicyFields {
        farmer_hash: "0xD1BE6aEEbB4c08624730B912Def3Af2d9CdC807B".into(),
        coverage_amount: "50000".into(),
        start_date: "1750000000".into(),
        end_date: "1752000000".into(),
        region_hash: "NORTE".into(),
        crop_type_hash: "SOJA".into(),
        parameter_type_hash: "chuva".into(),
        threshold_value: "120".into(),
        period_in_days: "30".into(),
        trigger_above: "true".into(),
        payout_percentage: "80".into(),
        current_timestamp: "1749000000".into(),
    }
}

fn config_with(dir: &TempDir, relay: &str, attestation: &str, policy_api: &str) -> ProverConfig {
    ProverConfig {
        circuit: ArtifactSource::File(dir.path().join("policy_validation.circuit.json")),
        proving_key: ArtifactSource::File(dir.path().join("policy_validation.pk.bin")),
        verification_key: ArtifactSource::File(dir.path().join("verification_key.json")),
        relay_url: relay.to_string(),
        attestation_url: attestation.to_string(),
        policy_api_url: policy_api.to_string(),
        call_timeout: Duration::from_secs(300),
    }
}

/// Full keygen output for the real backend.
fn write_real_artifacts(dir: &TempDir) {
    let mut rng = StdRng::seed_from_u64(7);
    let (pk, vk) = setup_policy_keys(&mut rng).unwrap();

    std::fs::write(
        dir.path().join("policy_validation.circuit.json"),
        serde_json::to_vec(&CircuitManifest::builtin()).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("policy_validation.pk.bin"),
        serialize_pk(&pk).unwrap(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("verification_key.json"),
        serde_json::to_vec(&vk_to_json(&vk)).unwrap(),
    )
    .unwrap();
}

/// Manifest plus placeholder proving key; enough for the stub backends. No
/// verification key is written.
fn write_stub_artifacts(dir: &TempDir) {
    std::fs::write(
        dir.path().join("policy_validation.circuit.json"),
        serde_json::to_vec(&CircuitManifest::builtin()).unwrap(),
    )
    .unwrap();
    std::fs::write(dir.path().join("policy_validation.pk.bin"), b"placeholder").unwrap();
}

struct StubWitness;

impl WitnessCalculator for StubWitness {
    fn calculate(
        &self,
        _circuit: &[u8],
        _input: &PolicyInput,
        _sanity_check: bool,
    ) -> Result<Vec<u8>, WitnessError> {
        Ok(vec![0])
    }
}

struct StubProver;

impl ProvingBackend for StubProver {
    fn prove(&self, _pk: &[u8], _witness: &[u8]) -> Result<(ProofJson, Vec<String>), ZkError> {
        let proof = ProofJson {
            pi_a: ["1".into(), "2".into(), "1".into()],
            pi_b: [
                ["1".into(), "2".into()],
                ["3".into(), "4".into()],
                ["1".into(), "0".into()],
            ],
            pi_c: ["5".into(), "6".into(), "1".into()],
            protocol: "groth16".into(),
            curve: "bn128".into(),
        };
        let signals = vec![
            "123456".into(),
            "1".into(),
            "2".into(),
            "3".into(),
            "1750000000".into(),
            "1752000000".into(),
        ];
        Ok((proof, signals))
    }
}

async fn spawn_app(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Session holding a stub-generated artifact, for tests that only need the
/// proof to travel over the wire.
async fn stub_session(config: &ProverConfig) -> ProverSession {
    let engine = ProofEngine::with_backends(config, Arc::new(StubWitness), Arc::new(StubProver));
    let session = ProverSession::new();
    engine.generate(&session, &valid_raw()).await.unwrap();
    session
}

fn relay_app(reply: Value) -> Router {
    Router::new().route(
        "/api/verify-proof",
        post(move |_body: Json<Value>| {
            let reply = reply.clone();
            async move { Json(reply) }
        }),
    )
}

#[tokio::test]
async fn full_pipeline_proves_verifies_and_records_the_policy() {
    let dir = TempDir::new().unwrap();
    write_real_artifacts(&dir);

    let relay_url = spawn_app(relay_app(json!({
        "status": "verified",
        "message": "Proof verified and policy created",
        "policyResponse": {"policyId": 7, "transactionHash": "0xabc", "blockNumber": 42}
    })))
    .await;
    let config = config_with(&dir, &relay_url, "http://127.0.0.1:1", "http://127.0.0.1:1");

    let engine = ProofEngine::new(&config);
    let session = ProverSession::new();
    let artifact = engine.generate(&session, &valid_raw()).await.unwrap();
    assert_eq!(artifact.public_signals.len(), 6);
    assert_eq!(artifact.public_signals[4], "1750000000");
    assert_eq!(artifact.public_signals[5], "1752000000");

    let coordinator = VerificationCoordinator::new(&config);
    assert!(coordinator.verify_local(&session).await.unwrap());

    // A doctored signal must fail verification without erroring.
    let tampered = ProverSession::new();
    let mut doctored = (*artifact).clone();
    doctored.public_signals[4] = "1750000001".into();
    tampered.install_artifact(doctored).await;
    assert!(!coordinator.verify_local(&tampered).await.unwrap());

    let relay_outcome = coordinator.verify_via_relay(&session).await.unwrap();
    assert!(relay_outcome.verified);
    match PolicySubmitter::policy_outcome(&relay_outcome) {
        PolicyOutcome::Recorded(record) => {
            assert_eq!(record.policy_id, "7");
            assert_eq!(record.transaction_hash, "0xabc");
            assert_eq!(record.block_number, "42");
        }
        PolicyOutcome::VerifiedWithoutPolicy => panic!("relay attached a policy"),
    }

    let local = session.latest_outcome(VerifyPath::Local).await.unwrap();
    assert!(local.verified);
    let relayed = session.latest_outcome(VerifyPath::RemoteRelay).await.unwrap();
    assert!(relayed.verified);
    assert!(relayed.detail.is_some());

    session.reset().await;
    assert!(session.artifact().await.is_none());
    assert!(session.outcomes().await.is_empty());
}

#[tokio::test]
async fn string_encoded_policy_response_is_reparsed() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);

    let relay_url = spawn_app(relay_app(json!({
        "status": "verified",
        "policyResponse": "{\"policyId\": 7, \"transactionHash\": \"0xabc\", \"blockNumber\": 42}"
    })))
    .await;
    let config = config_with(&dir, &relay_url, "http://127.0.0.1:1", "http://127.0.0.1:1");

    let session = stub_session(&config).await;
    let coordinator = VerificationCoordinator::new(&config);
    let outcome = coordinator.verify_via_relay(&session).await.unwrap();

    assert!(outcome.verified);
    let record = outcome.policy.unwrap();
    assert_eq!(record.policy_id, "7");
    assert_eq!(record.transaction_hash, "0xabc");
    assert_eq!(record.block_number, "42");
}

#[tokio::test]
async fn unparseable_policy_response_degrades_to_placeholders() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);

    let relay_url = spawn_app(relay_app(json!({
        "status": "verified",
        "policyResponse": "Internal Server Error"
    })))
    .await;
    let config = config_with(&dir, &relay_url, "http://127.0.0.1:1", "http://127.0.0.1:1");

    let session = stub_session(&config).await;
    let coordinator = VerificationCoordinator::new(&config);
    let outcome = coordinator.verify_via_relay(&session).await.unwrap();

    assert!(outcome.verified);
    let record = outcome.policy.unwrap();
    assert_eq!(record.policy_id, POLICY_ID_PLACEHOLDER);
    assert_eq!(record.transaction_hash, TX_HASH_PLACEHOLDER);
    assert_eq!(record.block_number, BLOCK_PLACEHOLDER);
}

#[tokio::test]
async fn pending_status_is_a_partial_success_not_an_error() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);

    let relay_url = spawn_app(relay_app(json!({
        "status": "pending",
        "message": "Verification queued"
    })))
    .await;
    let config = config_with(&dir, &relay_url, "http://127.0.0.1:1", "http://127.0.0.1:1");

    let session = stub_session(&config).await;
    let coordinator = VerificationCoordinator::new(&config);
    let outcome = coordinator.verify_via_relay(&session).await.unwrap();

    assert!(!outcome.verified);
    assert_eq!(outcome.status, "pending");
    assert_eq!(
        PolicySubmitter::policy_outcome(&outcome),
        PolicyOutcome::VerifiedWithoutPolicy
    );
}

#[tokio::test]
async fn unreachable_relay_is_a_recorded_failure_not_a_crash() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);
    let config = config_with(
        &dir,
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
    );

    let session = stub_session(&config).await;
    let coordinator = VerificationCoordinator::new(&config);
    let outcome = coordinator.verify_via_relay(&session).await.unwrap();

    assert!(!outcome.verified);
    assert_eq!(outcome.status, "error");
    assert!(outcome.policy.is_none());

    let recorded = session.latest_outcome(VerifyPath::RemoteRelay).await.unwrap();
    assert!(!recorded.verified);
    assert!(recorded.detail.unwrap()["error"].is_string());
}

#[tokio::test]
async fn attestation_path_records_the_service_verdict() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);

    let approving =
        spawn_app(Router::new().route(
            "/v1/verify",
            post(|_body: Json<Value>| async { Json(json!({"verified": true})) }),
        ))
        .await;
    let rejecting =
        spawn_app(Router::new().route(
            "/v1/verify",
            post(|_body: Json<Value>| async { Json(json!({"verified": false})) }),
        ))
        .await;

    let config = config_with(&dir, "http://127.0.0.1:1", &approving, "http://127.0.0.1:1");
    let session = stub_session(&config).await;
    let coordinator = VerificationCoordinator::new(&config);
    assert!(coordinator.verify_via_third_party(&session).await.unwrap());
    assert!(
        session
            .latest_outcome(VerifyPath::ThirdPartyAttestation)
            .await
            .unwrap()
            .verified
    );

    let config = config_with(&dir, "http://127.0.0.1:1", &rejecting, "http://127.0.0.1:1");
    let coordinator = VerificationCoordinator::new(&config);
    assert!(!coordinator.verify_via_third_party(&session).await.unwrap());

    // Unreachable service degrades to unverified, same as the relay path.
    let config = config_with(
        &dir,
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
    );
    let coordinator = VerificationCoordinator::new(&config);
    assert!(!coordinator.verify_via_third_party(&session).await.unwrap());
    let recorded = session
        .latest_outcome(VerifyPath::ThirdPartyAttestation)
        .await
        .unwrap();
    assert!(!recorded.verified);
    assert!(recorded.detail.is_some());
}

#[tokio::test]
async fn verification_without_a_proof_never_touches_the_network() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);

    let hits = Arc::new(AtomicUsize::new(0));
    let counted = {
        let hits = hits.clone();
        Router::new().route(
            "/api/verify-proof",
            post(move |_body: Json<Value>| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({"status": "verified"}))
                }
            }),
        )
    };
    let relay_url = spawn_app(counted).await;
    let config = config_with(&dir, &relay_url, &relay_url, &relay_url);

    let session = ProverSession::new();
    let coordinator = VerificationCoordinator::new(&config);

    assert!(matches!(
        coordinator.verify_local(&session).await.unwrap_err(),
        VerifyError::NoProofAvailable
    ));
    assert!(matches!(
        coordinator.verify_via_relay(&session).await.unwrap_err(),
        VerifyError::NoProofAvailable
    ));
    assert!(matches!(
        coordinator.verify_via_third_party(&session).await.unwrap_err(),
        VerifyError::NoProofAvailable
    ));
    assert!(matches!(
        PolicySubmitter::new(&config)
            .submit_direct(&session, &valid_raw())
            .await
            .unwrap_err(),
        SubmitError::NoProofAvailable
    ));

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(session.outcomes().await.is_empty());
}

#[tokio::test]
async fn missing_verification_key_is_reported_and_recorded() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);
    let config = config_with(
        &dir,
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
        "http://127.0.0.1:1",
    );

    let session = stub_session(&config).await;
    let coordinator = VerificationCoordinator::new(&config);

    let err = coordinator.verify_local(&session).await.unwrap_err();
    assert!(matches!(err, VerifyError::VerificationKeyUnavailable(_)));

    let recorded = session.latest_outcome(VerifyPath::Local).await.unwrap();
    assert!(!recorded.verified);
    assert!(recorded.detail.is_some());
}

#[tokio::test]
async fn direct_submission_posts_the_policy_request() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);

    let policy_api = spawn_app(Router::new().route(
        "/api/policies",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["region"], "NORTE");
            assert_eq!(body["coverageAmount"], 50_000);
            assert_eq!(body["parameters"][0]["parameterType"], "chuva");
            assert!(body["zkProofHash"].as_str().unwrap().starts_with("0x"));
            Json(json!({
                "policyId": 11,
                "transactionHash": "0xdef",
                "blockNumber": 5
            }))
        }),
    ))
    .await;
    let config = config_with(&dir, "http://127.0.0.1:1", "http://127.0.0.1:1", &policy_api);

    let session = stub_session(&config).await;
    let created = PolicySubmitter::new(&config)
        .submit_direct(&session, &valid_raw())
        .await
        .unwrap();

    assert_eq!(created.policy_id, 11);
    assert_eq!(created.transaction_hash.as_deref(), Some("0xdef"));
    assert_eq!(created.block_number, Some(5));
    assert!(created.warning.is_none());
}

#[tokio::test]
async fn policy_api_rejection_surfaces_status_and_body() {
    let dir = TempDir::new().unwrap();
    write_stub_artifacts(&dir);

    let policy_api = spawn_app(Router::new().route(
        "/api/policies",
        post(|_body: Json<Value>| async {
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "chain unavailable",
            )
        }),
    ))
    .await;
    let config = config_with(&dir, "http://127.0.0.1:1", "http://127.0.0.1:1", &policy_api);

    let session = stub_session(&config).await;
    let err = PolicySubmitter::new(&config)
        .submit_direct(&session, &valid_raw())
        .await
        .unwrap_err();

    match err {
        SubmitError::Client(prover::error::ClientError::Status { status, body }) => {
            assert_eq!(status, 500);
            assert!(body.contains("chain unavailable"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}
