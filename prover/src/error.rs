use std::time::Duration;
use thiserror::Error;
use zk_policy::input::InputError;

/// Failure while retrieving a proving artifact (circuit manifest, proving
/// key, verification key) from its configured source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Proof-generation failure, classified by the pipeline stage that produced
/// it so callers can report something more useful than "proving failed".
#[derive(Debug, Error)]
pub enum ProofError {
    #[error("a proof generation is already in flight for this session")]
    GenerationInFlight,

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("circuit unavailable: {0}")]
    CircuitUnavailable(FetchError),

    #[error("witness computation failed: {0}")]
    WitnessComputationFailed(String),

    #[error("proving failed: {0}")]
    ProvingFailed(String),

    #[error("{stage} timed out after {after:?}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },
}

/// Verification failure. Network errors on the remote paths are deliberately
/// absent: those are recorded as failed outcomes on the session, never
/// returned as `Err`.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("no proof available; generate a proof first")]
    NoProofAvailable,

    #[error("verification key unavailable: {0}")]
    VerificationKeyUnavailable(String),

    #[error("local verification failed: {0}")]
    Local(String),
}

/// Failure of an HTTP call against the relay, attestation, or policy API.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("undecodable response: {0}")]
    Decode(String),
}

/// Failure while materializing a policy through the policy API.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no proof available; generate a proof first")]
    NoProofAvailable,

    #[error("policy request could not be built: {0}")]
    Request(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}
