//! replay::envelope
//!
//! Serialized form of one captured call outcome.
//!
//! # Design
//!
//! A live call either returns a value or raises a forge-domain error, and
//! replay must reproduce both faithfully. Values are captured as plain
//! JSON trees; errors are captured as a tagged envelope of kind, message
//! and optional HTTP status, and are reconstructed into the matching
//! [`ForgeError`] variant on replay.
//!
//! Harness errors ([`ForgeError::Fixture`]) are never captured: they mean
//! the harness itself misbehaved and must surface immediately rather than
//! becoming part of a fixture.

use serde::{Deserialize, Serialize};

use crate::forge::ForgeError;

/// One recorded call outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordedOutcome {
    /// The call returned a value.
    Ok {
        /// The response payload as a JSON tree.
        value: serde_json::Value,
    },
    /// The call raised a forge-domain error.
    Err {
        /// The captured error envelope.
        error: ErrorEnvelope,
    },
}

impl RecordedOutcome {
    /// Capture a successful response payload.
    pub fn ok<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(RecordedOutcome::Ok {
            value: serde_json::to_value(value)?,
        })
    }

    /// Wrap a captured error envelope.
    pub fn err(error: ErrorEnvelope) -> Self {
        RecordedOutcome::Err { error }
    }
}

/// Closed set of capturable error kinds, matching the [`ForgeError`]
/// taxonomy minus harness errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AuthRequired,
    AuthFailed,
    NotFound,
    FileNotFound,
    RateLimited,
    Api,
    Network,
    NotImplemented,
}

/// Tagged capture of a forge-domain error: kind, message, and the HTTP
/// status code when one applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Which error variant was raised.
    pub kind: ErrorKind,
    /// The error message, verbatim.
    pub message: String,
    /// HTTP status code for API errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl ErrorEnvelope {
    /// Capture a forge error into an envelope.
    ///
    /// Returns `None` for [`ForgeError::Fixture`]: harness errors are not
    /// recordable and must propagate to the caller instead.
    pub fn capture(err: &ForgeError) -> Option<Self> {
        let (kind, message, code) = match err {
            ForgeError::AuthRequired => (ErrorKind::AuthRequired, String::new(), None),
            ForgeError::AuthFailed(m) => (ErrorKind::AuthFailed, m.clone(), None),
            ForgeError::NotFound(m) => (ErrorKind::NotFound, m.clone(), None),
            ForgeError::FileNotFound(m) => (ErrorKind::FileNotFound, m.clone(), None),
            ForgeError::RateLimited => (ErrorKind::RateLimited, String::new(), None),
            ForgeError::ApiError { status, message } => {
                (ErrorKind::Api, message.clone(), Some(*status))
            }
            ForgeError::NetworkError(m) => (ErrorKind::Network, m.clone(), None),
            ForgeError::NotImplemented(m) => (ErrorKind::NotImplemented, m.clone(), None),
            ForgeError::Fixture(_) => return None,
        };
        Some(Self {
            kind,
            message,
            code,
        })
    }

    /// Reconstruct the forge error this envelope was captured from, with
    /// the same kind and message.
    pub fn rebuild(&self) -> ForgeError {
        match self.kind {
            ErrorKind::AuthRequired => ForgeError::AuthRequired,
            ErrorKind::AuthFailed => ForgeError::AuthFailed(self.message.clone()),
            ErrorKind::NotFound => ForgeError::NotFound(self.message.clone()),
            ErrorKind::FileNotFound => ForgeError::FileNotFound(self.message.clone()),
            ErrorKind::RateLimited => ForgeError::RateLimited,
            ErrorKind::Api => ForgeError::ApiError {
                status: self.code.unwrap_or(0),
                message: self.message.clone(),
            },
            ErrorKind::Network => ForgeError::NetworkError(self.message.clone()),
            ErrorKind::NotImplemented => ForgeError::NotImplemented(self.message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::FixtureError;

    #[test]
    fn capture_and_rebuild_file_not_found() {
        let original = ForgeError::FileNotFound(".blablabla_nonexisting_file".into());
        let envelope = ErrorEnvelope::capture(&original).unwrap();

        assert_eq!(envelope.kind, ErrorKind::FileNotFound);
        assert_eq!(envelope.message, ".blablabla_nonexisting_file");

        let rebuilt = envelope.rebuild();
        assert!(matches!(rebuilt, ForgeError::FileNotFound(_)));
        assert_eq!(rebuilt.to_string(), original.to_string());
    }

    #[test]
    fn capture_preserves_api_status() {
        let original = ForgeError::ApiError {
            status: 422,
            message: "Validation failed".into(),
        };
        let envelope = ErrorEnvelope::capture(&original).unwrap();
        assert_eq!(envelope.code, Some(422));

        match envelope.rebuild() {
            ForgeError::ApiError { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Validation failed");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn rebuild_matches_for_every_kind() {
        let errors = vec![
            ForgeError::AuthRequired,
            ForgeError::AuthFailed("bad token".into()),
            ForgeError::NotFound("issue #9".into()),
            ForgeError::FileNotFound("missing.md".into()),
            ForgeError::RateLimited,
            ForgeError::ApiError {
                status: 500,
                message: "boom".into(),
            },
            ForgeError::NetworkError("refused".into()),
            ForgeError::NotImplemented("github".into()),
        ];

        for err in errors {
            let envelope = ErrorEnvelope::capture(&err).unwrap();
            assert_eq!(envelope.rebuild().to_string(), err.to_string());
        }
    }

    #[test]
    fn harness_errors_are_not_capturable() {
        let err = ForgeError::from(FixtureError::MissingFixture {
            signature: "gitlab.get_tags()".into(),
        });
        assert!(ErrorEnvelope::capture(&err).is_none());
    }

    #[test]
    fn outcome_yaml_roundtrip() {
        let outcome = RecordedOutcome::ok(&vec!["master".to_string(), "change".to_string()])
            .unwrap();

        let yaml = serde_yaml::to_string(&outcome).unwrap();
        let parsed: RecordedOutcome = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, outcome);
    }

    #[test]
    fn error_outcome_yaml_roundtrip() {
        let outcome = RecordedOutcome::err(ErrorEnvelope {
            kind: ErrorKind::FileNotFound,
            message: "missing.md".into(),
            code: None,
        });

        let yaml = serde_yaml::to_string(&outcome).unwrap();
        assert!(yaml.contains("outcome: err"));
        assert!(yaml.contains("kind: file_not_found"));

        let parsed: RecordedOutcome = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, outcome);
    }
}
