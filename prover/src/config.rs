use crate::artifacts::ArtifactSource;
use std::time::Duration;

const DEFAULT_CIRCUIT: &str = "artifacts/policy_validation.circuit.json";
const DEFAULT_PROVING_KEY: &str = "artifacts/policy_validation.pk.bin";
const DEFAULT_VERIFICATION_KEY: &str = "artifacts/verification_key.json";
const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_ATTESTATION_URL: &str = "https://api.zkverify.example";
const DEFAULT_POLICY_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Prover configuration. `from_env` fills in defaults matching the local
/// development layout, so a freshly keygen'd workspace runs with no
/// environment at all.
#[derive(Clone, Debug)]
pub struct ProverConfig {
    pub circuit: ArtifactSource,
    pub proving_key: ArtifactSource,
    pub verification_key: ArtifactSource,
    pub relay_url: String,
    pub attestation_url: String,
    pub policy_api_url: String,
    pub call_timeout: Duration,
}

impl ProverConfig {
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("CALL_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS);

        Self {
            circuit: ArtifactSource::parse(&env_or("CIRCUIT_SOURCE", DEFAULT_CIRCUIT)),
            proving_key: ArtifactSource::parse(&env_or("PROVING_KEY_SOURCE", DEFAULT_PROVING_KEY)),
            verification_key: ArtifactSource::parse(&env_or(
                "VERIFICATION_KEY_SOURCE",
                DEFAULT_VERIFICATION_KEY,
            )),
            relay_url: env_or("RELAY_URL", DEFAULT_RELAY_URL),
            attestation_url: env_or("ATTESTATION_URL", DEFAULT_ATTESTATION_URL),
            policy_api_url: env_or("POLICY_API_URL", DEFAULT_POLICY_API_URL),
            call_timeout: Duration::from_secs(timeout_secs),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_keygen_layout() {
        let config = ProverConfig::from_env();
        assert_eq!(
            config.circuit,
            ArtifactSource::File(DEFAULT_CIRCUIT.into())
        );
        assert_eq!(
            config.proving_key,
            ArtifactSource::File(DEFAULT_PROVING_KEY.into())
        );
        assert_eq!(
            config.verification_key,
            ArtifactSource::File(DEFAULT_VERIFICATION_KEY.into())
        );
        assert_eq!(config.call_timeout, Duration::from_secs(30));
    }
}
