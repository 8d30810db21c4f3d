//! replay::store
//!
//! On-disk fixture store for recorded call outcomes.
//!
//! # Design
//!
//! One store maps to one fixture file, and one fixture file maps to one
//! test id. That file boundary is the sole isolation mechanism between
//! tests: signatures carry no test id, so two tests may record identical
//! signatures without colliding.
//!
//! Mode is decided once, at open:
//!
//! - fixture file present and parsable → [`Mode::Read`]
//! - fixture file present but unparsable → [`FixtureError::CorruptFixture`]
//! - fixture file absent, credentials complete → [`Mode::Write`]
//! - fixture file absent, credentials missing → [`FixtureError::CredentialsMissing`]
//!
//! In write mode the store only grows, and is persisted exactly once by
//! [`FixtureStore::dump`] at teardown. In read mode the store is consumed
//! FIFO per signature and never touches the disk again; `dump` is a no-op.
//!
//! # Storage
//!
//! The file is a single YAML document: a format version plus a map from
//! signature key to the ordered list of recorded outcomes. Keys are kept
//! in a `BTreeMap` so re-recording a session produces minimal diffs.
//!
//! # Invariants
//!
//! - Entries for one signature replay in the order they were recorded.
//! - An exhausted signature raises [`FixtureError::MissingFixture`];
//!   the store never fabricates a response.
//! - A dumped store is terminal: further `record` calls are an error,
//!   further `dump` calls are no-ops.

use std::collections::{BTreeMap, VecDeque};
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use super::envelope::RecordedOutcome;
use super::signature::CallSignature;

/// Fixture file format version.
const FORMAT_VERSION: u32 = 1;

/// Errors from the record/replay harness.
///
/// None of these are retried; the harness values determinism and fast
/// failure over resilience.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// Replay was requested but nothing (or nothing more) was recorded
    /// for this signature. Signals a drifted test or a store/live
    /// mismatch; always fatal to the test.
    #[error("no recorded response left for call: {signature}")]
    MissingFixture {
        /// The rendered signature key that missed.
        signature: String,
    },

    /// The fixture file exists but cannot be parsed. Likely a format
    /// change or disk corruption; re-record the fixture.
    #[error("corrupt fixture file {}: {message}", .path.display())]
    CorruptFixture {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser diagnostics.
        message: String,
    },

    /// Record mode is required but credentials are absent. Raised at
    /// store construction, before any call is attempted.
    #[error("credentials required for record mode: {0}")]
    CredentialsMissing(String),

    /// A recorded payload does not deserialize into the shape the caller
    /// expects. The fixture was recorded against a different contract.
    #[error("recorded payload for {signature} has the wrong shape: {message}")]
    PayloadMismatch {
        /// The rendered signature key.
        signature: String,
        /// Deserializer diagnostics.
        message: String,
    },

    /// `record` was called on a store opened in replay mode.
    #[error("fixture store is read-only in replay mode")]
    ReadOnly,

    /// `record` was called after the store was dumped.
    #[error("fixture store was already dumped")]
    Dumped,

    /// I/O failure reading or writing the fixture file.
    #[error("fixture i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A response payload could not be encoded for storage.
    #[error("failed to encode fixture payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// The store could not be serialized to YAML.
    #[error("failed to serialize fixture store: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// Store mode, decided once at open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Capture from the live service and persist at teardown.
    Write,
    /// Serve previously recorded outcomes; no network, no disk writes.
    Read,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Write => write!(f, "write"),
            Mode::Read => write!(f, "read"),
        }
    }
}

/// Forge credentials sourced from the environment.
///
/// Presence of both token and user selects write mode when no fixture
/// file exists; absence forces read mode. The values themselves never
/// enter signatures or fixture files.
#[derive(Debug, Clone)]
pub struct Credentials {
    prefix: String,
    token: Option<String>,
    user: Option<String>,
}

impl Credentials {
    /// Read `<PREFIX>_TOKEN` and `<PREFIX>_USER` from the environment.
    /// Empty values count as absent.
    ///
    /// # Example
    ///
    /// ```
    /// use forgery::replay::Credentials;
    ///
    /// let creds = Credentials::from_env("GITLAB");
    /// if !creds.is_complete() {
    ///     // read mode only
    /// }
    /// ```
    pub fn from_env(prefix: &str) -> Self {
        let read = |suffix: &str| {
            env::var(format!("{}_{}", prefix, suffix))
                .ok()
                .filter(|v| !v.is_empty())
        };
        Self {
            prefix: prefix.to_string(),
            token: read("TOKEN"),
            user: read("USER"),
        }
    }

    /// Build credentials directly, bypassing the environment.
    pub fn new(prefix: &str, token: Option<String>, user: Option<String>) -> Self {
        Self {
            prefix: prefix.to_string(),
            token,
            user,
        }
    }

    /// Both token and user are present.
    pub fn is_complete(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// The token, if present.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The username, if present.
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn missing_description(&self) -> String {
        format!("set {0}_TOKEN and {0}_USER", self.prefix)
    }
}

/// Serialized fixture file layout.
#[derive(Debug, Serialize, Deserialize)]
struct FixtureFile {
    version: u32,
    #[serde(default)]
    entries: BTreeMap<String, Vec<RecordedOutcome>>,
}

/// On-disk, human-readable archive of recorded call outcomes.
///
/// See the module docs for the mode-selection policy and lifecycle.
#[derive(Debug)]
pub struct FixtureStore {
    path: PathBuf,
    mode: Mode,
    entries: BTreeMap<String, VecDeque<RecordedOutcome>>,
    dumped: bool,
}

impl FixtureStore {
    /// Open the store for one test id, selecting the mode.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::CorruptFixture`] if the file exists but cannot
    ///   be parsed (or carries an unknown format version)
    /// - [`FixtureError::CredentialsMissing`] if the file is absent and
    ///   the credentials are incomplete
    pub fn open(path: impl Into<PathBuf>, credentials: &Credentials) -> Result<Self, FixtureError> {
        let path = path.into();

        if path.exists() {
            let text = fs::read_to_string(&path)?;
            let file: FixtureFile =
                serde_yaml::from_str(&text).map_err(|e| FixtureError::CorruptFixture {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            if file.version != FORMAT_VERSION {
                return Err(FixtureError::CorruptFixture {
                    path: path.clone(),
                    message: format!(
                        "unsupported format version {} (expected {})",
                        file.version, FORMAT_VERSION
                    ),
                });
            }

            debug!(path = %path.display(), "opened fixture store in read mode");
            Ok(Self {
                path,
                mode: Mode::Read,
                entries: file
                    .entries
                    .into_iter()
                    .map(|(key, outcomes)| (key, outcomes.into()))
                    .collect(),
                dumped: false,
            })
        } else if credentials.is_complete() {
            debug!(path = %path.display(), "opened fixture store in write mode");
            Ok(Self {
                path,
                mode: Mode::Write,
                entries: BTreeMap::new(),
                dumped: false,
            })
        } else {
            Err(FixtureError::CredentialsMissing(
                credentials.missing_description(),
            ))
        }
    }

    /// The store mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The fixture file path this store reads from or dumps to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of outcomes currently held, across all signatures.
    pub fn len(&self) -> usize {
        self.entries.values().map(|q| q.len()).sum()
    }

    /// The store holds no outcomes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append an outcome under the signature. Repeated calls for the
    /// same signature append in order; replay later consumes them FIFO.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::ReadOnly`] in replay mode
    /// - [`FixtureError::Dumped`] after the store was persisted
    pub fn record(
        &mut self,
        signature: &CallSignature,
        outcome: RecordedOutcome,
    ) -> Result<(), FixtureError> {
        if self.mode != Mode::Write {
            return Err(FixtureError::ReadOnly);
        }
        if self.dumped {
            return Err(FixtureError::Dumped);
        }

        trace!(signature = %signature, "recorded outcome");
        self.entries
            .entry(signature.key())
            .or_default()
            .push_back(outcome);
        Ok(())
    }

    /// Take the next unconsumed outcome for the signature.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::MissingFixture`] when nothing (or nothing more)
    ///   was recorded for this signature
    pub fn replay(&mut self, signature: &CallSignature) -> Result<RecordedOutcome, FixtureError> {
        let key = signature.key();
        match self.entries.get_mut(&key).and_then(|q| q.pop_front()) {
            Some(outcome) => {
                trace!(signature = %key, "replayed outcome");
                Ok(outcome)
            }
            None => Err(FixtureError::MissingFixture { signature: key }),
        }
    }

    /// Persist the store.
    ///
    /// Write mode: serialize deterministically (stable key order) and
    /// write the file through a scoped handle, flushed and synced before
    /// return. The store then becomes terminal: further `record` calls
    /// error, further `dump` calls are no-ops.
    ///
    /// Read mode: no-op, kept for teardown symmetry.
    pub fn dump(&mut self) -> Result<(), FixtureError> {
        if self.mode != Mode::Write || self.dumped {
            return Ok(());
        }

        let file = FixtureFile {
            version: FORMAT_VERSION,
            entries: self
                .entries
                .iter()
                .map(|(key, outcomes)| (key.clone(), outcomes.iter().cloned().collect()))
                .collect(),
        };
        let text = serde_yaml::to_string(&file)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        {
            let mut handle = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.path)?;
            handle.write_all(text.as_bytes())?;
            handle.flush()?;
            handle.sync_all()?;
        }

        debug!(path = %self.path.display(), outcomes = self.len(), "dumped fixture store");
        self.dumped = true;
        Ok(())
    }
}
