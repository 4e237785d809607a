//! Whole-system exercise: keygen-equivalent artifacts on disk, the relay
//! serving over a real listener, a stub policy API behind it, and the prover
//! crate driving the full flow from form fields to a recorded policy.

use axum::{Json, Router, routing::post};
use prover::artifacts::ArtifactSource;
use prover::config::ProverConfig;
use prover::engine::ProofEngine;
use prover::session::ProverSession;
use prover::submit::{PolicyOutcome, PolicySubmitter};
use prover::verify::{VerificationCoordinator, VerifyPath};
use rand::SeedableRng;
use rand::rngs::StdRng;
use relay::api;
use relay::config::{PolicyDefaults, RelayConfig};
use relay::state::AppState;
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::TempDir;
use zk_policy::constants::CircuitManifest;
use zk_policy::groth16::{serialize_pk, setup_policy_keys};
use zk_policy::input::RawPolicyFields;
use zk_policy::proof::vk_to_json;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn prover_and_relay_complete_the_policy_flow() {
    let dir = TempDir::new().unwrap();

    let mut rng = StdRng::seed_from_u64(3);
    let (pk, vk) = setup_policy_keys(&mut rng).unwrap();
    let circuit_path = dir.path().join("policy_validation.circuit.json");
    let pk_path = dir.path().join("policy_validation.pk.bin");
    let vk_path = dir.path().join("verification_key.json");
    std::fs::write(
        &circuit_path,
        serde_json::to_vec(&CircuitManifest::builtin()).unwrap(),
    )
    .unwrap();
    std::fs::write(&pk_path, serialize_pk(&pk).unwrap()).unwrap();
    std::fs::write(&vk_path, serde_json::to_vec(&vk_to_json(&vk)).unwrap()).unwrap();

    let policy_api = serve(Router::new().route(
        "/api/policies",
        post(|Json(_request): Json<Value>| async {
            Json(json!({"policyId": 7, "transactionHash": "0xabc", "blockNumber": 42}))
        }),
    ))
    .await;

    let relay_config = RelayConfig {
        addr: "127.0.0.1:0".into(),
        verification_key_path: vk_path.clone(),
        policy_api_url: policy_api,
        forward_timeout: Duration::from_secs(5),
        policy_defaults: PolicyDefaults {
            farmer: "0x0000000000000000000000000000000000000000".into(),
            region: "NORTE".into(),
            crop_type: "SOJA".into(),
            parameter_type: "chuva".into(),
            threshold_value: 120,
            period_in_days: 30,
            trigger_above: true,
            payout_percentage: 80,
            coverage_amount: 50_000,
        },
    };
    let relay_url = serve(api::router(AppState::new(relay_config))).await;

    let prover_config = ProverConfig {
        circuit: ArtifactSource::File(circuit_path),
        proving_key: ArtifactSource::File(pk_path),
        verification_key: ArtifactSource::File(vk_path),
        relay_url,
        attestation_url: "http://127.0.0.1:1".into(),
        policy_api_url: "http://127.0.0.1:1".into(),
        call_timeout: Duration::from_secs(300),
    };

    let raw = RawPolicyFields {
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
    };

    let engine = ProofEngine::new(&prover_config);
    let session = ProverSession::new();
    engine.generate(&session, &raw).await.unwrap();

    let coordinator = VerificationCoordinator::new(&prover_config);
    assert!(coordinator.verify_local(&session).await.unwrap());

    let outcome = coordinator.verify_via_relay(&session).await.unwrap();
    assert!(outcome.verified);
    assert_eq!(outcome.status, "verified");

    match PolicySubmitter::policy_outcome(&outcome) {
        PolicyOutcome::Recorded(record) => {
            assert_eq!(record.policy_id, "7");
            assert_eq!(record.transaction_hash, "0xabc");
            assert_eq!(record.block_number, "42");
        }
        PolicyOutcome::VerifiedWithoutPolicy => panic!("the relay attached a policy"),
    }

    assert!(session.latest_outcome(VerifyPath::Local).await.unwrap().verified);
    assert!(
        session
            .latest_outcome(VerifyPath::RemoteRelay)
            .await
            .unwrap()
            .verified
    );
}
