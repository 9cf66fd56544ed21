//! The per-connection session handle seen by the serialization core
//!
//! The endpoint layer owns the handshake and produces a [`Session`] before any
//! traffic. Handlers are registered against that handle up front; the
//! handshake later records the negotiated protocol version on it in place, so
//! every clone (including the ones captured by handlers) observes it.
//!
//! The negotiated version is write-once. Serializers take a [`Session::snapshot`]
//! at the start of each call, so one serialize or deserialize call never sees the
//! version change half way through.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::error::{Result, SerializationError};
use crate::version::ProtocolVersion;

/// The version token agreed during the handshake
#[derive(Debug, Clone)]
struct Negotiated {
    token: String,
    /// `None` when the token is not a valid version date
    version: Option<ProtocolVersion>,
}

impl Negotiated {
    fn parse(token: String) -> Self {
        let version = match ProtocolVersion::parse(&token) {
            Ok(version) => Some(version),
            Err(e) => {
                warn!("Session negotiated an unrecognised protocol version: {}", e);
                None
            }
        };
        Self { token, version }
    }
}

#[derive(Debug, Default)]
struct SessionInner {
    session_id: Option<String>,
    negotiated: OnceLock<Negotiated>,
}

/// A negotiated connection. Cheap to clone; all clones share the same state.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// A session that has not negotiated a protocol version yet (mid-handshake)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Session::set_negotiated_protocol_version`], for
    /// sessions whose version is known at construction.
    ///
    /// Returns a new handle; existing clones are not affected.
    pub fn with_protocol_version(self, token: impl Into<String>) -> Self {
        let negotiated = OnceLock::from(Negotiated::parse(token.into()));
        Self {
            inner: Arc::new(SessionInner {
                session_id: self.inner.session_id.clone(),
                negotiated,
            }),
        }
    }

    /// Returns a new handle carrying `session_id` and the current negotiated state
    pub fn with_session_id(self, session_id: impl Into<String>) -> Self {
        let negotiated = match self.inner.negotiated.get() {
            Some(negotiated) => OnceLock::from(negotiated.clone()),
            None => OnceLock::new(),
        };
        Self {
            inner: Arc::new(SessionInner {
                session_id: Some(session_id.into()),
                negotiated,
            }),
        }
    }

    /// Record the version token the peers agreed on. Visible to every clone.
    ///
    /// A token that is not a valid version date is kept verbatim but treated as
    /// "not negotiated" by version selection, which falls back to the latest shape.
    /// Fails if a version was already negotiated.
    pub fn set_negotiated_protocol_version(&self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        let negotiated = self
            .inner
            .negotiated
            .get_or_init(|| Negotiated::parse(token.clone()));
        if negotiated.token != token {
            return Err(SerializationError::argument(
                "protocol_version",
                format!(
                    "session already negotiated {}, cannot switch to {token}",
                    negotiated.token
                ),
            ));
        }
        debug!(
            session_id = self.session_id(),
            protocol_version = %token,
            "Negotiated protocol version recorded"
        );
        Ok(())
    }

    /// A handle frozen at the current negotiated state.
    ///
    /// Once a version is negotiated the state cannot change, so the snapshot is
    /// the same handle. Before that, it is a detached handle that stays
    /// un-negotiated even if the handshake completes meanwhile.
    pub fn snapshot(&self) -> Session {
        if self.inner.negotiated.get().is_some() {
            return self.clone();
        }
        Self {
            inner: Arc::new(SessionInner {
                session_id: self.inner.session_id.clone(),
                negotiated: OnceLock::new(),
            }),
        }
    }

    /// Transport-assigned session identifier, if any
    pub fn session_id(&self) -> Option<&str> {
        self.inner.session_id.as_deref()
    }

    /// The raw negotiated version token, exactly as the handshake produced it
    pub fn negotiated_protocol_version(&self) -> Option<&str> {
        self.inner.negotiated.get().map(|n| n.token.as_str())
    }

    /// The negotiated version, if there is one and it parses
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.inner.negotiated.get().and_then(|n| n.version)
    }

    /// Whether two handles refer to the same session
    pub fn ptr_eq(&self, other: &Session) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.inner.session_id)
            .field(
                "negotiated_protocol_version",
                &self.negotiated_protocol_version(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{V2024_11_05, V2025_06_18};

    #[test]
    fn test_handshake_session_has_no_version() {
        let session = Session::new();
        assert!(session.negotiated_protocol_version().is_none());
        assert!(session.protocol_version().is_none());
    }

    #[test]
    fn test_negotiated_session() {
        let session = Session::new()
            .with_session_id("session-1")
            .with_protocol_version(V2025_06_18);
        assert_eq!(session.session_id(), Some("session-1"));
        assert_eq!(session.negotiated_protocol_version(), Some("2025-06-18"));
        assert_eq!(
            session.protocol_version(),
            Some(ProtocolVersion::parse(V2025_06_18).unwrap())
        );
        assert!(session.ptr_eq(&session.clone()));
    }

    #[test]
    fn test_unparseable_version_is_kept_but_not_parsed() {
        let session = Session::new().with_protocol_version("draft");
        assert_eq!(session.negotiated_protocol_version(), Some("draft"));
        assert!(session.protocol_version().is_none());
    }

    #[test]
    fn test_negotiation_is_visible_to_existing_clones() {
        let session = Session::new().with_session_id("conn-1");
        let captured = session.clone();
        assert!(captured.protocol_version().is_none());

        session
            .set_negotiated_protocol_version(V2024_11_05)
            .unwrap();
        assert_eq!(captured.negotiated_protocol_version(), Some(V2024_11_05));
        assert!(captured.ptr_eq(&session));
    }

    #[test]
    fn test_negotiated_version_is_write_once() {
        let session = Session::new();
        session
            .set_negotiated_protocol_version(V2025_06_18)
            .unwrap();
        // repeating the same token is harmless
        session
            .set_negotiated_protocol_version(V2025_06_18)
            .unwrap();

        let err = session
            .set_negotiated_protocol_version(V2024_11_05)
            .unwrap_err();
        assert!(matches!(
            err,
            SerializationError::Argument {
                name: "protocol_version",
                ..
            }
        ));
        assert_eq!(session.negotiated_protocol_version(), Some(V2025_06_18));
    }

    #[test]
    fn test_snapshot_is_frozen_before_negotiation() {
        let session = Session::new().with_session_id("conn-2");
        let frozen = session.snapshot();
        session
            .set_negotiated_protocol_version(V2025_06_18)
            .unwrap();

        assert!(frozen.protocol_version().is_none());
        assert_eq!(frozen.session_id(), Some("conn-2"));
        assert!(session.snapshot().ptr_eq(&session));
    }
}
