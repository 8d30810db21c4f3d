//! replay::context
//!
//! The call interceptor: routes every facade call to the live forge or
//! to the fixture store, depending on the store mode.
//!
//! # Design
//!
//! A [`ReplayContext`] is an explicit handle passed into the replay
//! facade wrappers; there is no process-wide singleton. It shares one
//! [`FixtureStore`] behind an `Arc<Mutex<_>>`, which is safe because the
//! designed discipline is one store per test id with no concurrent
//! writers. The mutex is never held across an await point: in write mode
//! the live call completes before the store is locked to record.
//!
//! In read mode the live closure is never invoked, so replay structurally
//! cannot perform network I/O.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::envelope::{ErrorEnvelope, RecordedOutcome};
use super::signature::CallSignature;
use super::store::{Credentials, FixtureError, FixtureStore, Mode};
use crate::forge::ForgeError;

/// Shared handle to one test's fixture store.
///
/// Cheap to clone; all clones observe the same store and mode.
///
/// # Example
///
/// ```no_run
/// use forgery::replay::{Credentials, ReplayContext};
///
/// let creds = Credentials::from_env("GITLAB");
/// let ctx = ReplayContext::open("tests/data/case_tags.yaml", &creds)?;
/// # Ok::<(), forgery::replay::FixtureError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReplayContext {
    store: Arc<Mutex<FixtureStore>>,
}

impl ReplayContext {
    /// Open the fixture store for one test id and wrap it in a context.
    ///
    /// Mode selection follows [`FixtureStore::open`].
    pub fn open(
        path: impl Into<PathBuf>,
        credentials: &Credentials,
    ) -> Result<Self, FixtureError> {
        Ok(Self::new(FixtureStore::open(path, credentials)?))
    }

    /// Wrap an already opened store.
    pub fn new(store: FixtureStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// The store mode.
    pub fn mode(&self) -> Mode {
        self.store.lock().unwrap().mode()
    }

    /// Persist the store; call once at test teardown.
    /// No-op in read mode and on repeat calls.
    pub fn dump(&self) -> Result<(), FixtureError> {
        self.store.lock().unwrap().dump()
    }

    /// Route one call through the harness.
    ///
    /// Write mode: invoke `live`, capture the outcome (successful payload
    /// or forge-domain error) into the store, and return it unchanged.
    /// Harness errors raised by the live side propagate without being
    /// recorded.
    ///
    /// Read mode: `live` is never invoked; the next recorded outcome for
    /// the signature is deserialized, or the recorded error is rebuilt
    /// and raised.
    pub async fn intercept<T, F, Fut>(
        &self,
        signature: CallSignature,
        live: F,
    ) -> Result<T, ForgeError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ForgeError>>,
    {
        match self.mode() {
            Mode::Read => {
                let outcome = {
                    let mut store = self.store.lock().unwrap();
                    store.replay(&signature)?
                };
                match outcome {
                    RecordedOutcome::Ok { value } => {
                        serde_json::from_value(value).map_err(|e| {
                            ForgeError::from(FixtureError::PayloadMismatch {
                                signature: signature.key(),
                                message: e.to_string(),
                            })
                        })
                    }
                    RecordedOutcome::Err { error } => Err(error.rebuild()),
                }
            }
            Mode::Write => {
                debug!(signature = %signature, "capturing live call");
                let result = live().await;

                let captured = match &result {
                    Ok(value) => Some(RecordedOutcome::ok(value).map_err(FixtureError::from)?),
                    Err(err) => ErrorEnvelope::capture(err).map(RecordedOutcome::err),
                };
                if let Some(outcome) = captured {
                    let mut store = self.store.lock().unwrap();
                    store.record(&signature, outcome)?;
                }

                result
            }
        }
    }
}
