use crate::config::RelayConfig;
use crate::errors::ApiError;
use std::sync::Arc;
use tokio::sync::OnceCell;
use zk_policy::proof::{VerificationKeyJson, vk_from_json};

use ark_bn254::Bn254;
use ark_groth16::VerifyingKey;

#[derive(Clone)]
pub struct AppState {
    pub config: RelayConfig,
    pub http: reqwest::Client,
    vk: Arc<OnceCell<VkMaterial>>,
}

/// Verification key in both forms: the JSON served to provers and the
/// deserialized key used for checking proofs.
#[derive(Clone)]
pub struct VkMaterial {
    pub json: Arc<VerificationKeyJson>,
    pub vk: Arc<VerifyingKey<Bn254>>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            vk: Arc::new(OnceCell::new()),
        }
    }

    /// Load the verification key on first use and keep it for the process
    /// lifetime. Requests arriving before the key loads fail individually;
    /// the server itself always comes up.
    pub async fn ensure_vk(&self) -> Result<VkMaterial, ApiError> {
        let path = self.config.verification_key_path.clone();

        self.vk
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(move || {
                    let bytes = std::fs::read(&path).map_err(|e| {
                        tracing::error!(path = %path.display(), error = %e, "verification key unreadable");
                        ApiError::Internal
                    })?;

                    let json: VerificationKeyJson =
                        serde_json::from_slice(&bytes).map_err(|_| ApiError::Internal)?;
                    let vk = vk_from_json(&json).map_err(|_| ApiError::Internal)?;

                    Ok::<VkMaterial, ApiError>(VkMaterial {
                        json: Arc::new(json),
                        vk: Arc::new(vk),
                    })
                })
                .await
                .map_err(|_| ApiError::Internal)?
            })
            .await
            .cloned()
    }
}
