//! Multi-provider inference with credential rotation and failover.
//!
//! A pool of provider credentials lives in a [`KeyStore`]. The
//! [`FailoverEngine`] picks the first eligible one (per-provider cooldowns
//! apply, see [`rotation`]), drives a completion call through an
//! [`InferenceBackend`], and on auth/quota/transient failures retires the
//! credential and retries with the next — until the call succeeds or the
//! pool is exhausted.

pub mod backend;
pub mod failover;
pub mod keystore;
pub mod rotation;

pub use backend::{BackendError, HttpBackend, InferenceBackend};
pub use failover::{FailoverEngine, FailureClass, Outcome};
pub use keystore::{JsonKeyStore, KeyStore, MemoryKeyStore};
