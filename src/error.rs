use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error raised while a crew executes the stage sequence.
///
/// Variants are grouped by what went wrong on the wire, not by which stage
/// failed. The runner collapses all of them into one failed
/// [`RunResult`](crate::RunResult), keeping the kind for the record.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Transport failure: DNS, connection, timeout, non-auth HTTP status.
    #[error("network: {0}")]
    Network(String),
    /// Missing or rejected credentials.
    #[error("auth: {0}")]
    Auth(String),
    /// The model answered, but not with anything usable.
    #[error("malformed output: {0}")]
    MalformedOutput(String),
    /// Everything else. The message is reported as-is.
    #[error("{0}")]
    Unknown(String),
}

impl ExecError {
    /// Create a [`Network`](ExecError::Network) error.
    pub fn network(msg: impl Into<String>) -> Self {
        ExecError::Network(msg.into())
    }

    /// Create an [`Auth`](ExecError::Auth) error.
    pub fn auth(msg: impl Into<String>) -> Self {
        ExecError::Auth(msg.into())
    }

    /// Create a [`MalformedOutput`](ExecError::MalformedOutput) error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        ExecError::MalformedOutput(msg.into())
    }

    /// Create an [`Unknown`](ExecError::Unknown) error.
    pub fn unknown(msg: impl Into<String>) -> Self {
        ExecError::Unknown(msg.into())
    }

    /// The serializable tag for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network(_) => FailureKind::Network,
            Self::Auth(_) => FailureKind::Auth,
            Self::MalformedOutput(_) => FailureKind::MalformedOutput,
            Self::Unknown(_) => FailureKind::Unknown,
        }
    }
}

impl From<ureq::Error> for ExecError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::StatusCode(code @ (401 | 403)) => {
                ExecError::Auth(format!("model provider rejected credentials (http {code})"))
            }
            ureq::Error::StatusCode(code) => ExecError::Network(format!("http status {code}")),
            ureq::Error::Json(e) => ExecError::MalformedOutput(e.to_string()),
            other => ExecError::Network(other.to_string()),
        }
    }
}

impl From<std::io::Error> for ExecError {
    fn from(e: std::io::Error) -> Self {
        ExecError::Unknown(e.to_string())
    }
}

/// Serializable tag for an [`ExecError`], stored alongside failed runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Auth,
    MalformedOutput,
    Unknown,
}

impl FailureKind {
    /// Snake-case name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Auth => "auth",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- constructors ---

    #[test]
    fn network_constructor() {
        let err = ExecError::network("connection reset");
        assert!(matches!(err, ExecError::Network(msg) if msg == "connection reset"));
    }

    #[test]
    fn auth_constructor() {
        let err = ExecError::auth("no key");
        assert!(matches!(err, ExecError::Auth(msg) if msg == "no key"));
    }

    #[test]
    fn malformed_constructor() {
        let err = ExecError::malformed("no candidates");
        assert!(matches!(err, ExecError::MalformedOutput(msg) if msg == "no candidates"));
    }

    // --- Display ---

    #[test]
    fn display_network() {
        assert_eq!(ExecError::network("timeout").to_string(), "network: timeout");
    }

    #[test]
    fn display_auth() {
        assert_eq!(ExecError::auth("bad key").to_string(), "auth: bad key");
    }

    #[test]
    fn display_malformed() {
        assert_eq!(
            ExecError::malformed("empty").to_string(),
            "malformed output: empty"
        );
    }

    #[test]
    fn display_unknown_is_bare_message() {
        assert_eq!(ExecError::unknown("rate limited").to_string(), "rate limited");
    }

    // --- kind ---

    #[test]
    fn kind_matches_variant() {
        assert_eq!(ExecError::network("x").kind(), FailureKind::Network);
        assert_eq!(ExecError::auth("x").kind(), FailureKind::Auth);
        assert_eq!(ExecError::malformed("x").kind(), FailureKind::MalformedOutput);
        assert_eq!(ExecError::unknown("x").kind(), FailureKind::Unknown);
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::MalformedOutput).unwrap();
        assert_eq!(json, "\"malformed_output\"");
    }

    #[test]
    fn failure_kind_name_matches_serde() {
        for kind in [
            FailureKind::Network,
            FailureKind::Auth,
            FailureKind::MalformedOutput,
            FailureKind::Unknown,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    // --- From conversions ---

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ExecError = io_err.into();
        assert!(matches!(err, ExecError::Unknown(msg) if msg.contains("file missing")));
    }

    #[test]
    fn from_ureq_unauthorized_is_auth() {
        let err: ExecError = ureq::Error::StatusCode(401).into();
        assert_eq!(err.kind(), FailureKind::Auth);
    }

    #[test]
    fn from_ureq_rate_limit_is_network() {
        let err: ExecError = ureq::Error::StatusCode(429).into();
        assert!(matches!(err, ExecError::Network(msg) if msg.contains("429")));
    }
}
