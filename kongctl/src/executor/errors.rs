//! Error taxonomy / backoff classification (§4.H, §7): maps a propagated
//! `failure::Error` to the retry policy the executor should apply.

use crate::error::{KongctlError, KongctlErrKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 429: exponential backoff with jitter, then retry.
    RateLimit,
    /// 5xx: bounded retry.
    Server,
    /// Configuration, validation, protection, auth: abort immediately.
    Abort,
    /// Anything else: treated like `Abort` but without a canned hint.
    Other,
}

pub fn classify(err: &failure::Error) -> ErrorClass {
    match err.downcast_ref::<KongctlError>().map(|e| e.kind()) {
        Some(KongctlErrKind::RateLimit(_)) => ErrorClass::RateLimit,
        Some(KongctlErrKind::Server(_)) => ErrorClass::Server,
        Some(KongctlErrKind::Validation(_))
        | Some(KongctlErrKind::Protection(_, _))
        | Some(KongctlErrKind::Auth(_))
        | Some(KongctlErrKind::Configuration(_))
        | Some(KongctlErrKind::Reference(_)) => ErrorClass::Abort,
        _ => ErrorClass::Other,
    }
}

pub fn is_retryable(class: ErrorClass) -> bool {
    matches!(class, ErrorClass::RateLimit | ErrorClass::Server)
}

const MAX_ATTEMPTS: u32 = 4;

/// Backoff delay for `attempt` (0-indexed), doubling from a 200ms base and
/// capped at 5s; `attempt` itself supplies the jitter so retries of the
/// same change across a run don't all land on an identical boundary.
pub fn backoff_delay(attempt: u32) -> std::time::Duration {
    let base_ms = 200u64 * 2u64.saturating_pow(attempt);
    let jitter_ms = (attempt as u64 * 37) % 150;
    std::time::Duration::from_millis((base_ms + jitter_ms).min(5000))
}

pub fn max_attempts() -> u32 {
    MAX_ATTEMPTS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{rate_limit, validation};

    #[test]
    fn classifies_rate_limit_as_retryable() {
        let err = rate_limit("429");
        assert_eq!(classify(&err), ErrorClass::RateLimit);
        assert!(is_retryable(classify(&err)));
    }

    #[test]
    fn classifies_validation_as_abort() {
        let err = validation("bad field");
        assert_eq!(classify(&err), ErrorClass::Abort);
        assert!(!is_retryable(classify(&err)));
    }

    #[test]
    fn backoff_grows_and_caps() {
        assert!(backoff_delay(0) < backoff_delay(3));
        assert!(backoff_delay(10).as_millis() <= 5000);
    }
}
