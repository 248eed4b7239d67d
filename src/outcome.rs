use serde::Serialize;
use std::fmt;

/// Terminal verdict of one solve attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The widget was satisfied (with or without a readable proof token).
    Success,
    /// The widget flagged the session as automated. Further interaction
    /// risks permanent flags, so the solve stops here.
    Detected,
    /// The solve could not be completed.
    Failed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Success => f.write_str("success"),
            Status::Detected => f.write_str("detected"),
            Status::Failed => f.write_str("failed"),
        }
    }
}

/// Result of one solve attempt.
///
/// `token` is present only on success, and only when the page (or the
/// solving collaborator) actually exposed a non-empty proof value; a
/// success with an empty token read stays a bare success.
#[derive(Debug, Clone, Serialize)]
pub struct SolveOutcome {
    pub status: Status,

    /// Proof-of-solve token, verbatim from the page or the collaborator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Wall-clock duration of the attempt in milliseconds, attached at
    /// finalization.
    pub elapsed_ms: u64,

    /// Error text for failed outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SolveOutcome {
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            token: None,
            elapsed_ms: 0,
            error: None,
        }
    }

    pub fn detected() -> Self {
        Self {
            status: Status::Detected,
            token: None,
            elapsed_ms: 0,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Status::Failed,
            token: None,
            elapsed_ms: 0,
            error: Some(error.into()),
        }
    }

    /// Attach a proof token. Ignored unless the outcome is a success and
    /// the token is non-empty, keeping the token-only-on-success invariant.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        if self.status == Status::Success && !token.is_empty() {
            self.token = Some(token);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_attached_on_success() {
        let outcome = SolveOutcome::success().with_token("tok");
        assert_eq!(outcome.status, Status::Success);
        assert_eq!(outcome.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_empty_token_stays_bare_success() {
        let outcome = SolveOutcome::success().with_token("");
        assert_eq!(outcome.status, Status::Success);
        assert!(outcome.token.is_none());
    }

    #[test]
    fn test_token_never_attached_off_success() {
        let outcome = SolveOutcome::detected().with_token("tok");
        assert!(outcome.token.is_none());

        let outcome = SolveOutcome::failed("boom").with_token("tok");
        assert!(outcome.token.is_none());
        assert_eq!(outcome.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::Success.to_string(), "success");
        assert_eq!(Status::Detected.to_string(), "detected");
        assert_eq!(Status::Failed.to_string(), "failed");
    }
}
