//! Ambient Session Context
//!
//! serde's `Serialize::serialize` and `Deserialize::deserialize` take no context
//! parameter, so a codec deep inside a derived impl has no way to learn which
//! protocol version the peer negotiated. [`AmbientSession`] is the side channel:
//! a model serializer pushes the session, the codec reads it.
//!
//! The slot is a tokio task-local, so it belongs to the logical call rather
//! than the worker thread. A synchronous scope ([`AmbientSession::enter`]) cannot
//! be suspended; an asynchronous scope ([`AmbientSession::scope`]) is re-installed
//! on every poll and survives the future migrating between workers.
//!
//! Scopes never nest. Entering while a session is already visible is reported as
//! [`SerializationError::ReentrantContext`], and the slot is restored on every
//! exit path, unwinding included.

use std::future::Future;

use tracing::trace;

use crate::error::{Result, SerializationError};
use crate::session::Session;

tokio::task_local! {
    static CURRENT_SESSION: Session;
}

/// Accessor for the call-scoped session slot
pub struct AmbientSession;

impl AmbientSession {
    /// The session pushed by the enclosing serializer call, or `None` outside any
    /// scope. Codecs must treat `None` as "use the latest wire shape".
    pub fn current() -> Option<Session> {
        CURRENT_SESSION.try_with(Session::clone).ok()
    }

    /// Whether a scope is open for the current call
    pub fn is_active() -> bool {
        CURRENT_SESSION.try_with(|_| ()).is_ok()
    }

    /// Run `operation` with `session` visible to codecs.
    pub fn enter<R>(
        session: &Session,
        operation: &'static str,
        f: impl FnOnce() -> R,
    ) -> Result<R> {
        Self::ensure_vacant(operation)?;
        trace!(
            operation,
            protocol_version = session.negotiated_protocol_version(),
            "Entering ambient session scope"
        );
        Ok(CURRENT_SESSION.sync_scope(session.clone(), f))
    }

    /// Run `future` with `session` visible to codecs across its suspension points.
    pub async fn scope<F>(
        session: &Session,
        operation: &'static str,
        future: F,
    ) -> Result<F::Output>
    where
        F: Future,
    {
        Self::ensure_vacant(operation)?;
        trace!(
            operation,
            protocol_version = session.negotiated_protocol_version(),
            "Entering async ambient session scope"
        );
        Ok(CURRENT_SESSION.scope(session.clone(), future).await)
    }

    fn ensure_vacant(operation: &'static str) -> Result<()> {
        if Self::is_active() {
            return Err(SerializationError::ReentrantContext { operation });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::V2025_06_18;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    #[test]
    fn test_no_session_outside_scope() {
        assert!(!AmbientSession::is_active());
        assert!(AmbientSession::current().is_none());
    }

    #[test]
    fn test_session_visible_inside_scope_and_cleared_after() {
        let session = Session::new().with_protocol_version(V2025_06_18);
        let seen = AmbientSession::enter(&session, "test", || {
            AmbientSession::current().map(|s| s.ptr_eq(&session))
        })
        .unwrap();
        assert_eq!(seen, Some(true));
        assert!(AmbientSession::current().is_none());
    }

    #[test]
    fn test_nested_enter_is_rejected() {
        let outer = Session::new();
        let inner = Session::new().with_protocol_version(V2025_06_18);
        let nested = AmbientSession::enter(&outer, "outer", || {
            let nested = AmbientSession::enter(&inner, "inner", || ());
            // the outer scope is untouched by the failed attempt
            let still_outer = AmbientSession::current().map(|s| s.ptr_eq(&outer));
            (nested, still_outer)
        })
        .unwrap();

        assert!(matches!(
            nested.0,
            Err(SerializationError::ReentrantContext { operation: "inner" })
        ));
        assert_eq!(nested.1, Some(true));
        assert!(!AmbientSession::is_active());
    }

    #[test]
    fn test_scope_released_on_panic() {
        let session = Session::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            AmbientSession::enter(&session, "panicking", || -> u8 { panic!("codec failure") })
        }));
        assert!(outcome.is_err());
        assert!(!AmbientSession::is_active());

        // a later, unrelated call starts from a clean slot
        assert!(AmbientSession::enter(&session, "next", || ()).is_ok());
    }

    #[tokio::test]
    async fn test_async_scope_spans_await_points() {
        let session = Session::new().with_protocol_version(V2025_06_18);
        let versions = AmbientSession::scope(&session, "async", async {
            let before = AmbientSession::current().and_then(|s| s.protocol_version());
            tokio::task::yield_now().await;
            let after = AmbientSession::current().and_then(|s| s.protocol_version());
            (before, after)
        })
        .await
        .unwrap();

        assert_eq!(versions.0, versions.1);
        assert!(versions.0.is_some());
        assert!(AmbientSession::current().is_none());
    }
}
