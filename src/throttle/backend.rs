//! Throttle backend trait for abstracting local and external stores.

use async_trait::async_trait;

use crate::error::Result;

use super::limiter::{Decision, RequestThrottle};
use super::policies::Policy;

/// Trait for throttle store implementations.
///
/// The in-process [`RequestThrottle`] enforces limits for a single process
/// only. A horizontally scaled deployment that needs one global limit can
/// put a shared counter service behind this trait and swap it in without
/// touching call sites.
#[async_trait]
pub trait ThrottleBackend: Send + Sync {
    /// Decide whether a request for `identifier` may proceed under `policy`.
    async fn check(&self, identifier: &str, policy: &Policy) -> Result<Decision>;
}

#[async_trait]
impl ThrottleBackend for RequestThrottle {
    async fn check(&self, identifier: &str, policy: &Policy) -> Result<Decision> {
        RequestThrottle::check(self, identifier, policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    async fn check_via_backend(
        backend: &dyn ThrottleBackend,
        identifier: &str,
        policy: &Policy,
    ) -> Decision {
        backend.check(identifier, policy).await.unwrap()
    }

    #[tokio::test]
    async fn test_request_throttle_implements_backend() {
        let throttle: Arc<dyn ThrottleBackend> = Arc::new(RequestThrottle::new());
        let policy = Policy::new(2, 60).unwrap();

        let decision = check_via_backend(throttle.as_ref(), "id", &policy).await;
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);

        check_via_backend(throttle.as_ref(), "id", &policy).await;
        let decision = check_via_backend(throttle.as_ref(), "id", &policy).await;
        assert!(!decision.allowed);
    }
}
