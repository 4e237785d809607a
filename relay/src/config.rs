use std::path::PathBuf;
use std::time::Duration;

/// Relay configuration, read from the environment with local-development
/// defaults.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub addr: String,
    pub verification_key_path: PathBuf,
    pub policy_api_url: String,
    pub forward_timeout: Duration,
    pub policy_defaults: PolicyDefaults,
}

/// Form fields the public signals cannot reconstruct. The signals carry only
/// hashes of the free-text fields, so the forwarded policy uses configured
/// values for those; the dates and the commitment come from the signals.
#[derive(Clone, Debug)]
pub struct PolicyDefaults {
    pub farmer: String,
    pub region: String,
    pub crop_type: String,
    pub parameter_type: String,
    pub threshold_value: u64,
    pub period_in_days: u32,
    pub trigger_above: bool,
    pub payout_percentage: u32,
    pub coverage_amount: u64,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            addr: env_or("RELAY_ADDR", "127.0.0.1:8000"),
            verification_key_path: PathBuf::from(env_or(
                "VERIFICATION_KEY_PATH",
                "artifacts/verification_key.json",
            )),
            policy_api_url: env_or("POLICY_API_URL", "http://127.0.0.1:8001"),
            forward_timeout: Duration::from_secs(
                std::env::var("FORWARD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(15),
            ),
            policy_defaults: PolicyDefaults::from_env(),
        }
    }
}

impl PolicyDefaults {
    fn from_env() -> Self {
        Self {
            farmer: env_or(
                "POLICY_FARMER",
                "0x0000000000000000000000000000000000000000",
            ),
            region: env_or("POLICY_REGION", "NORTE"),
            crop_type: env_or("POLICY_CROP_TYPE", "SOJA"),
            parameter_type: env_or("POLICY_PARAMETER_TYPE", "chuva"),
            threshold_value: parse_env_or("POLICY_THRESHOLD", 120),
            period_in_days: parse_env_or("POLICY_PERIOD_DAYS", 30),
            trigger_above: env_or("POLICY_TRIGGER_ABOVE", "true") == "true",
            payout_percentage: parse_env_or("POLICY_PAYOUT_PERCENT", 80),
            coverage_amount: parse_env_or("POLICY_COVERAGE", 50_000),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
