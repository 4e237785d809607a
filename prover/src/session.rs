//! Per-session proof state. Each [`ProverSession`] owns one current proof
//! artifact and the verification outcomes recorded against it, so several
//! sessions can prove and verify concurrently without sharing anything.

use crate::verify::{VerificationOutcome, VerifyPath};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use zk_policy::proof::ProofArtifact;

#[derive(Default)]
pub struct ProverSession {
    inner: Mutex<SessionState>,
    generating: AtomicBool,
}

#[derive(Default)]
struct SessionState {
    artifact: Option<Arc<ProofArtifact>>,
    outcomes: Vec<VerificationOutcome>,
}

impl ProverSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the generation slot. Returns `None` while another generation
    /// holds it; the slot is released when the returned guard drops.
    pub fn try_begin_generation(&self) -> Option<GenerationGuard<'_>> {
        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationGuard { session: self })
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    pub async fn artifact(&self) -> Option<Arc<ProofArtifact>> {
        self.inner.lock().await.artifact.clone()
    }

    /// Make `artifact` the session's current proof, replacing any previous
    /// one. Outcomes recorded against the old proof stay until `reset`.
    pub async fn install_artifact(&self, artifact: ProofArtifact) -> Arc<ProofArtifact> {
        let artifact = Arc::new(artifact);
        self.inner.lock().await.artifact = Some(artifact.clone());
        artifact
    }

    pub async fn record_outcome(&self, outcome: VerificationOutcome) {
        self.inner.lock().await.outcomes.push(outcome);
    }

    /// All outcomes recorded since the last reset, oldest first.
    pub async fn outcomes(&self) -> Vec<VerificationOutcome> {
        self.inner.lock().await.outcomes.clone()
    }

    /// The most recent outcome for one verification path.
    pub async fn latest_outcome(&self, path: VerifyPath) -> Option<VerificationOutcome> {
        self.inner
            .lock()
            .await
            .outcomes
            .iter()
            .rev()
            .find(|o| o.path == path)
            .cloned()
    }

    /// Drop the current artifact and every recorded outcome. An in-flight
    /// generation keeps its slot; only the stored state is cleared.
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.artifact = None;
        state.outcomes.clear();
    }
}

pub struct GenerationGuard<'a> {
    session: &'a ProverSession,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.session.generating.store(false, Ordering::Release);
    }
}
