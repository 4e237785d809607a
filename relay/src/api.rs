use crate::errors::ApiError;
use crate::models::*;
use crate::state::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use zk_policy::encode::{fr_from_decimal, fr_to_hex};
use zk_policy::groth16::verify_policy_proof;
use zk_policy::proof::{proof_from_json, signals_from_json, VerificationKeyJson};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/verify-proof", post(verify_proof))
        .route("/api/verification-key", get(verification_key))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn verification_key(
    State(state): State<AppState>,
) -> Result<Json<VerificationKeyJson>, ApiError> {
    let material = state.ensure_vk().await?;
    Ok(Json((*material.json).clone()))
}

async fn verify_proof(
    State(state): State<AppState>,
    Json(req): Json<VerifyProofRequest>,
) -> Result<Json<VerifyProofResponse>, ApiError> {
    if req.public_signals.len() != zk_policy::constants::NUM_PUBLIC_SIGNALS {
        return Err(ApiError::BadRequest(format!(
            "expected {} public signals, got {}",
            zk_policy::constants::NUM_PUBLIC_SIGNALS,
            req.public_signals.len()
        )));
    }

    let proof = proof_from_json(&req.proof)
        .map_err(|e| ApiError::BadRequest(format!("invalid proof: {e}")))?;
    let signals = signals_from_json(&req.public_signals)
        .map_err(|e| ApiError::BadRequest(format!("invalid public signals: {e}")))?;

    let material = state.ensure_vk().await?;

    let vk = material.vk.clone();
    let verified = tokio::task::spawn_blocking(move || verify_policy_proof(&vk, &proof, &signals))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(|e| {
            tracing::error!(error = %e, "verifier error");
            ApiError::Internal
        })?;

    if !verified {
        tracing::info!("proof rejected");
        return Ok(Json(VerifyProofResponse {
            status: "invalid".to_string(),
            message: "Proof verification failed".to_string(),
            policy_response: None,
            error: None,
        }));
    }

    tracing::info!("proof verified, forwarding policy creation");
    Ok(Json(forward_policy(&state, &req).await))
}

/// Create the policy behind a verified proof. The policy API's reply travels
/// back to the prover untouched: decoded JSON when the call succeeded, the
/// raw body text when it did not. Forwarding failures never invalidate the
/// verification itself.
async fn forward_policy(state: &AppState, req: &VerifyProofRequest) -> VerifyProofResponse {
    let policy = match policy_request_from_signals(state, &req.public_signals) {
        Ok(policy) => policy,
        Err(detail) => {
            tracing::warn!(%detail, "could not derive a policy request from the signals");
            return VerifyProofResponse {
                status: "verified".to_string(),
                message: "Proof verified; policy creation skipped".to_string(),
                policy_response: None,
                error: Some(detail),
            };
        }
    };

    let url = format!(
        "{}/api/policies",
        state.config.policy_api_url.trim_end_matches('/')
    );
    let send = state.http.post(&url).json(&policy).send();

    match tokio::time::timeout(state.config.forward_timeout, send).await {
        Ok(Ok(response)) => {
            let code = response.status();
            if code.is_success() {
                match response.json::<serde_json::Value>().await {
                    Ok(body) => VerifyProofResponse {
                        status: "verified".to_string(),
                        message: "Proof verified and policy created".to_string(),
                        policy_response: Some(body),
                        error: None,
                    },
                    Err(e) => VerifyProofResponse {
                        status: "verified".to_string(),
                        message: "Proof verified and policy created".to_string(),
                        policy_response: None,
                        error: Some(format!("unreadable policy response: {e}")),
                    },
                }
            } else {
                let text = response.text().await.unwrap_or_default();
                tracing::warn!(status = code.as_u16(), "policy API rejected the forward");
                VerifyProofResponse {
                    status: "verified".to_string(),
                    message: "Proof verified but policy creation failed".to_string(),
                    policy_response: Some(serde_json::Value::String(text)),
                    error: None,
                }
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "policy API unreachable");
            VerifyProofResponse {
                status: "verified".to_string(),
                message: "Proof verified but policy API unreachable".to_string(),
                policy_response: None,
                error: Some(e.to_string()),
            }
        }
        Err(_) => {
            tracing::warn!(timeout = ?state.config.forward_timeout, "policy API timed out");
            VerifyProofResponse {
                status: "verified".to_string(),
                message: "Proof verified but policy API unreachable".to_string(),
                policy_response: None,
                error: Some(format!(
                    "policy API timed out after {:?}",
                    state.config.forward_timeout
                )),
            }
        }
    }
}

/// Assemble the policy request from the public signals plus configured
/// defaults. The signals carry the dates and the commitment; the free-text
/// fields exist only as hashes, so their clear values come from config.
fn policy_request_from_signals(
    state: &AppState,
    signals: &[String],
) -> Result<CreatePolicyRequest, String> {
    if signals.len() != zk_policy::constants::NUM_PUBLIC_SIGNALS {
        return Err(format!("expected 6 public signals, got {}", signals.len()));
    }

    let start_date = signals[4]
        .parse::<i64>()
        .map_err(|_| format!("start date signal is not a timestamp: {:?}", signals[4]))?;
    let end_date = signals[5]
        .parse::<i64>()
        .map_err(|_| format!("end date signal is not a timestamp: {:?}", signals[5]))?;

    let commitment =
        fr_from_decimal(&signals[0]).map_err(|_| format!("bad commitment signal: {:?}", signals[0]))?;

    let defaults = &state.config.policy_defaults;
    Ok(CreatePolicyRequest {
        farmer: defaults.farmer.clone(),
        coverage_amount: defaults.coverage_amount,
        start_date,
        end_date,
        region: defaults.region.clone(),
        crop_type: defaults.crop_type.clone(),
        parameters: vec![ClimateParameter {
            parameter_type: defaults.parameter_type.clone(),
            threshold_value: defaults.threshold_value,
            period_in_days: defaults.period_in_days,
            trigger_above: defaults.trigger_above,
            payout_percentage: defaults.payout_percentage,
        }],
        zk_proof_hash: fr_to_hex(&commitment),
    })
}
