//! Failover engine — the credential rotation/retry loop.
//!
//! One entry point: [`FailoverEngine::invoke`]. It keeps the most recently
//! selected credential active and reuses it until it fails; on an auth,
//! quota, or transient failure the credential is retired and the next
//! eligible one takes over. The loop is bounded by the pool size, so it
//! terminates within one pass over the pool per request.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use badil_core::error::{BadilError, Result};
use badil_core::types::{ApiKey, InferenceRequest};

use crate::backend::{BackendError, InferenceBackend};
use crate::keystore::KeyStore;
use crate::rotation;

/// What a caller gets back. Exhaustion is an expected steady state (all
/// providers throttled), so it is a value here, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Text(String),
    Unavailable,
}

/// How a provider failure maps onto the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Invalid or expired credential — retire and rotate.
    Auth,
    /// Rate or quota limit — retire and rotate.
    Quota,
    /// Connection-level failure. Conservative policy: rotate anyway,
    /// trading a possibly-still-good credential for forward progress.
    Transient,
    /// Everything else — propagate, no rotation.
    Fatal,
}

pub fn classify(err: &BackendError) -> FailureClass {
    match err {
        BackendError::Http { status: 401 | 403, .. } => FailureClass::Auth,
        BackendError::Http { status: 429, .. } => FailureClass::Quota,
        BackendError::Transport(e) if e.is_connect() || e.is_timeout() => FailureClass::Transient,
        _ => FailureClass::Fatal,
    }
}

pub struct FailoverEngine<B: InferenceBackend> {
    store: Arc<dyn KeyStore>,
    backend: B,
    /// Most recently selected credential, reused across requests until it
    /// fails. The lock covers selection and demotion only, never the
    /// provider call itself, so concurrent requests interleave.
    active: Mutex<Option<ApiKey>>,
}

fn same_credential(a: &ApiKey, b: &ApiKey) -> bool {
    a.provider == b.provider && a.secret == b.secret
}

impl<B: InferenceBackend> FailoverEngine<B> {
    pub fn new(store: Arc<dyn KeyStore>, backend: B) -> Self {
        Self {
            store,
            backend,
            active: Mutex::new(None),
        }
    }

    /// Drive one inference request through the pool.
    ///
    /// Returns `Outcome::Unavailable` when no eligible credential remains;
    /// fatal provider errors and storage failures surface as `Err`.
    pub async fn invoke(&self, request: &InferenceRequest) -> Result<Outcome> {
        let mut candidates = self.store.list_candidates().await?;

        // Each rotation retires a key, so one pass over the pool bounds the
        // retries regardless of what happens to the store underneath us.
        let max_attempts = candidates.len();

        for _attempt in 0..max_attempts {
            let Some(key) = self.checkout(&candidates).await else {
                break;
            };

            debug!(key = %key.redacted(), "Invoking provider");
            match self.backend.complete(&key, request).await {
                Ok(text) => return Ok(Outcome::Text(text)),
                Err(err) => {
                    let class = classify(&err);
                    match class {
                        FailureClass::Auth | FailureClass::Quota | FailureClass::Transient => {
                            warn!(
                                key = %key.redacted(),
                                ?class,
                                %err,
                                "Provider call failed; rotating credential"
                            );
                            self.store.retire(&key).await?;
                            self.demote(&key).await;
                            candidates = self.store.list_candidates().await?;
                        }
                        FailureClass::Fatal => {
                            error!(key = %key.redacted(), %err, "Provider call failed fatally");
                            return Err(BadilError::Provider(err.to_string()));
                        }
                    }
                }
            }
        }

        info!("No eligible credentials remain; reporting unavailable");
        Ok(Outcome::Unavailable)
    }

    /// Pick the credential for the next attempt under the lock.
    ///
    /// The cached credential is re-validated against the fresh store
    /// snapshot by identity — its own clone never sees a retirement written
    /// after it was cached.
    async fn checkout(&self, candidates: &[ApiKey]) -> Option<ApiKey> {
        let mut active = self.active.lock().await;
        let now = chrono::Utc::now();

        if let Some(cached) = active.as_ref() {
            let current = candidates.iter().find(|c| same_credential(c, cached));
            match current {
                Some(current) if rotation::is_eligible(current, now) => {}
                _ => *active = None,
            }
        }
        if active.is_none() {
            *active = rotation::select_next(candidates, now);
        }
        active.clone()
    }

    /// Clear the active slot if it still points at the failed credential.
    /// A concurrent request may have selected a replacement already.
    async fn demote(&self, failed: &ApiKey) {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|k| same_credential(k, failed)) {
            *active = None;
        }
    }
}
