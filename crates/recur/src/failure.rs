//! A closed failure taxonomy for request/response style operations.
//!
//! The engine itself is generic over the failure type. This module provides
//! a ready-made one for operations that talk to a remote service, grouping
//! failures by family so that [`FailurePolicy`] can map each family to
//! terminal or retryable.

use crate::classify::Classify;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Failure {
    /// The peer answered with a non-success status code.
    #[error("unexpected status code {code}")]
    Status {
        /// Status code as received
        code: u16,
    },

    /// The response arrived but its body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// No response: the connection could not be made or was lost.
    #[error("connection error: {0}")]
    Connection(String),
}

impl Failure {
    /// Create a `Status` failure.
    pub fn status(code: u16) -> Self {
        Self::Status { code }
    }

    /// Create a `Decode` failure.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a `Connection` failure.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Status class, for `Status` failures.
    pub fn status_class(&self) -> Option<StatusClass> {
        match self {
            Failure::Status { code } => Some(StatusClass::of(*code)),
            Failure::Decode(_) | Failure::Connection(_) => None,
        }
    }
}

/// Family of a status code, by its hundreds digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// 1xx
    Informational,
    /// 2xx
    Success,
    /// 3xx
    Redirection,
    /// 4xx
    ClientError,
    /// 5xx
    ServerError,
    /// Anything outside 100..=599
    Unknown,
}

impl StatusClass {
    /// Classify a raw status code.
    pub fn of(code: u16) -> Self {
        match code {
            100..=199 => StatusClass::Informational,
            200..=299 => StatusClass::Success,
            300..=399 => StatusClass::Redirection,
            400..=499 => StatusClass::ClientError,
            500..=599 => StatusClass::ServerError,
            _ => StatusClass::Unknown,
        }
    }
}

/// Maps each [`Failure`] family to terminal or retryable.
///
/// Defaults: client errors (4xx) are terminal, everything else is retried.
/// Individual codes can be forced either way; `retryable_codes` wins over
/// `terminal_codes` and over the family rule, which is how "4xx is terminal
/// except 429" is expressed.
///
/// # Examples
///
/// ```rust
/// use recur::classify::Classify;
/// use recur::failure::{Failure, FailurePolicy};
///
/// let policy = FailurePolicy::default().retryable_code(429);
///
/// assert!(policy.is_terminal(&Failure::status(404)));
/// assert!(!policy.is_terminal(&Failure::status(429)));
/// assert!(!policy.is_terminal(&Failure::status(500)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    /// Treat 4xx responses as terminal
    pub client_errors_terminal: bool,
    /// Treat 5xx responses as terminal
    pub server_errors_terminal: bool,
    /// Treat decode failures as terminal
    pub decode_terminal: bool,
    /// Treat connection failures as terminal
    pub connection_terminal: bool,
    /// Status codes that are always terminal
    pub terminal_codes: Vec<u16>,
    /// Status codes that are always retried
    pub retryable_codes: Vec<u16>,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            client_errors_terminal: true,
            server_errors_terminal: false,
            decode_terminal: false,
            connection_terminal: false,
            terminal_codes: Vec::new(),
            retryable_codes: Vec::new(),
        }
    }
}

impl FailurePolicy {
    /// Policy that retries every failure.
    pub fn retry_all() -> Self {
        Self {
            client_errors_terminal: false,
            ..Self::default()
        }
    }

    /// Set whether 4xx responses are terminal.
    pub fn client_errors_terminal(mut self, terminal: bool) -> Self {
        self.client_errors_terminal = terminal;
        self
    }

    /// Set whether 5xx responses are terminal.
    pub fn server_errors_terminal(mut self, terminal: bool) -> Self {
        self.server_errors_terminal = terminal;
        self
    }

    /// Set whether decode failures are terminal.
    pub fn decode_terminal(mut self, terminal: bool) -> Self {
        self.decode_terminal = terminal;
        self
    }

    /// Set whether connection failures are terminal.
    pub fn connection_terminal(mut self, terminal: bool) -> Self {
        self.connection_terminal = terminal;
        self
    }

    /// Always treat `code` as terminal.
    pub fn terminal_code(mut self, code: u16) -> Self {
        self.terminal_codes.push(code);
        self
    }

    /// Always retry `code`.
    pub fn retryable_code(mut self, code: u16) -> Self {
        self.retryable_codes.push(code);
        self
    }

    fn is_terminal_status(&self, code: u16) -> bool {
        if self.retryable_codes.contains(&code) {
            return false;
        }
        if self.terminal_codes.contains(&code) {
            return true;
        }
        match StatusClass::of(code) {
            StatusClass::ClientError => self.client_errors_terminal,
            StatusClass::ServerError => self.server_errors_terminal,
            StatusClass::Informational
            | StatusClass::Success
            | StatusClass::Redirection
            | StatusClass::Unknown => false,
        }
    }
}

impl Classify<Failure> for FailurePolicy {
    fn is_terminal(&self, failure: &Failure) -> bool {
        match failure {
            Failure::Status { code } => self.is_terminal_status(*code),
            Failure::Decode(_) => self.decode_terminal,
            Failure::Connection(_) => self.connection_terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(100, StatusClass::Informational)]
    #[case(204, StatusClass::Success)]
    #[case(301, StatusClass::Redirection)]
    #[case(404, StatusClass::ClientError)]
    #[case(429, StatusClass::ClientError)]
    #[case(500, StatusClass::ServerError)]
    #[case(503, StatusClass::ServerError)]
    #[case(99, StatusClass::Unknown)]
    #[case(600, StatusClass::Unknown)]
    fn test_status_class(#[case] code: u16, #[case] expected: StatusClass) {
        assert_eq!(StatusClass::of(code), expected);
    }

    #[rstest]
    #[case(Failure::status(404), true)]
    #[case(Failure::status(400), true)]
    #[case(Failure::status(500), false)]
    #[case(Failure::status(503), false)]
    #[case(Failure::status(302), false)]
    #[case(Failure::decode("expected a string"), false)]
    #[case(Failure::connection("connection refused"), false)]
    fn test_default_policy(#[case] failure: Failure, #[case] terminal: bool) {
        assert_eq!(FailurePolicy::default().is_terminal(&failure), terminal);
    }

    #[test]
    fn test_code_overrides() {
        let policy = FailurePolicy::default()
            .retryable_code(429)
            .terminal_code(501)
            .terminal_code(429);

        assert!(!policy.is_terminal(&Failure::status(429)), "retryable wins");
        assert!(policy.is_terminal(&Failure::status(501)));
        assert!(!policy.is_terminal(&Failure::status(502)));
    }

    #[test]
    fn test_families_configured_independently() {
        let policy = FailurePolicy::retry_all()
            .decode_terminal(true)
            .server_errors_terminal(true);

        assert!(!policy.is_terminal(&Failure::status(404)));
        assert!(policy.is_terminal(&Failure::status(500)));
        assert!(policy.is_terminal(&Failure::decode("bad json")));
        assert!(!policy.is_terminal(&Failure::connection("reset")));
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(Failure::status(404).to_string(), "unexpected status code 404");
        assert!(Failure::decode("eof").to_string().contains("eof"));
        assert_eq!(Failure::status(503).status_class(), Some(StatusClass::ServerError));
        assert_eq!(Failure::connection("reset").status_class(), None);
    }

    #[test]
    fn test_policy_deserializes_with_defaults() {
        let policy: FailurePolicy = serde_json::from_str(r#"{"retryable_codes": [429]}"#).unwrap();
        assert!(policy.client_errors_terminal);
        assert_eq!(policy.retryable_codes, vec![429]);
    }
}
