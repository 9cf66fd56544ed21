//! Cutover tables
//!
//! A [`VersionPolicy`] is a sorted list of `(cutover, value)` pairs. Resolution
//! is a pure function of the negotiated version:
//!
//! 1. no negotiated version: the default entry (the newest unless configured);
//! 2. otherwise the entry with the greatest cutover `<=` the version;
//! 3. a version older than every cutover gets the earliest entry. Rejecting
//!    too-old peers is the handshake's job, not the serializer's.

use tracing::trace;

use crate::error::{Result, SerializationError};
use crate::session::Session;
use crate::version::ProtocolVersion;

/// Values keyed by the protocol version that introduced them
#[derive(Debug, Clone)]
pub struct VersionPolicy<T> {
    entries: Vec<(ProtocolVersion, T)>,
    default_index: usize,
}

impl<T> VersionPolicy<T> {
    /// Start an empty table; see [`VersionPolicyBuilder::build`] for the checks
    pub fn builder() -> VersionPolicyBuilder<T> {
        VersionPolicyBuilder::new()
    }

    /// Index of the entry serving `version`. Always in bounds.
    pub fn resolve_index(&self, version: Option<ProtocolVersion>) -> usize {
        let index = match version {
            None => self.default_index,
            Some(version) => self
                .entries
                .partition_point(|(cutover, _)| *cutover <= version)
                .saturating_sub(1),
        };
        trace!(
            version = ?version,
            cutover = %self.entries[index].0,
            "Resolved version policy entry"
        );
        index
    }

    /// The value serving `version`
    pub fn resolve(&self, version: Option<ProtocolVersion>) -> &T {
        &self.entries[self.resolve_index(version)].1
    }

    /// The value serving the session's negotiated version
    pub fn resolve_for(&self, session: &Session) -> &T {
        self.resolve(session.protocol_version())
    }

    /// The cutover whose entry serves `version`
    pub fn cutover_for(&self, version: Option<ProtocolVersion>) -> ProtocolVersion {
        self.entries[self.resolve_index(version)].0
    }

    /// Cutover used while no version is negotiated
    pub fn default_cutover(&self) -> ProtocolVersion {
        self.entries[self.default_index].0
    }

    /// Cutovers in ascending order
    pub fn cutovers(&self) -> impl Iterator<Item = ProtocolVersion> + '_ {
        self.entries.iter().map(|(cutover, _)| *cutover)
    }

    /// `(cutover, value)` pairs in ascending cutover order
    pub fn iter(&self) -> impl Iterator<Item = (ProtocolVersion, &T)> + '_ {
        self.entries
            .iter()
            .map(|(cutover, value)| (*cutover, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects cutovers; all validation happens in [`build`](Self::build)
pub struct VersionPolicyBuilder<T> {
    entries: Vec<(String, T)>,
    default_cutover: Option<String>,
}

impl<T> VersionPolicyBuilder<T> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            default_cutover: None,
        }
    }

    /// `value` applies from `version` (inclusive) until the next cutover
    pub fn cutover(mut self, version: impl Into<String>, value: T) -> Self {
        self.entries.push((version.into(), value));
        self
    }

    /// The entry used before a version has been negotiated. Defaults to the newest.
    pub fn default_cutover(mut self, version: impl Into<String>) -> Self {
        self.default_cutover = Some(version.into());
        self
    }

    /// Parse, sort and check the cutovers.
    ///
    /// Fails with [`SerializationError::Argument`] when there are no cutovers,
    /// a token is not a version date, a cutover repeats, or the default is not
    /// one of the cutovers.
    pub fn build(self) -> Result<VersionPolicy<T>> {
        if self.entries.is_empty() {
            return Err(SerializationError::argument(
                "cutovers",
                "at least one cutover is required",
            ));
        }

        let mut entries = self
            .entries
            .into_iter()
            .map(|(token, value)| Ok((ProtocolVersion::parse(&token)?, value)))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by_key(|(cutover, _)| *cutover);

        if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(SerializationError::argument(
                "cutovers",
                format!("cutover {} registered more than once", pair[0].0),
            ));
        }

        let default_index = match self.default_cutover {
            None => entries.len() - 1,
            Some(token) => {
                let default = ProtocolVersion::parse(&token)?;
                entries
                    .iter()
                    .position(|(cutover, _)| *cutover == default)
                    .ok_or_else(|| {
                        SerializationError::argument(
                            "default_cutover",
                            format!("{default} is not a registered cutover"),
                        )
                    })?
            }
        };

        Ok(VersionPolicy {
            entries,
            default_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::{V2024_11_05, V2025_06_18, V2025_11_25};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Shape {
        Legacy,
        Middle,
        Current,
    }

    fn policy() -> VersionPolicy<Shape> {
        // registered out of order on purpose
        VersionPolicy::builder()
            .cutover(V2025_11_25, Shape::Current)
            .cutover(V2024_11_05, Shape::Legacy)
            .cutover(V2025_06_18, Shape::Middle)
            .build()
            .unwrap()
    }

    fn v(token: &str) -> Option<ProtocolVersion> {
        Some(ProtocolVersion::parse(token).unwrap())
    }

    #[test]
    fn test_resolves_greatest_cutover_not_after_version() {
        let policy = policy();
        assert_eq!(*policy.resolve(v("2024-11-05")), Shape::Legacy);
        assert_eq!(*policy.resolve(v("2025-03-26")), Shape::Legacy);
        assert_eq!(*policy.resolve(v("2025-06-18")), Shape::Middle);
        assert_eq!(*policy.resolve(v("2025-11-24")), Shape::Middle);
        assert_eq!(*policy.resolve(v("2025-11-25")), Shape::Current);
        assert_eq!(*policy.resolve(v("2030-01-01")), Shape::Current);
    }

    #[test]
    fn test_absent_version_uses_default() {
        assert_eq!(*policy().resolve(None), Shape::Current);

        let pinned = VersionPolicy::builder()
            .cutover(V2024_11_05, Shape::Legacy)
            .cutover(V2025_11_25, Shape::Current)
            .default_cutover(V2024_11_05)
            .build()
            .unwrap();
        assert_eq!(*pinned.resolve(None), Shape::Legacy);
        assert_eq!(
            pinned.default_cutover(),
            ProtocolVersion::parse(V2024_11_05).unwrap()
        );
    }

    #[test]
    fn test_too_old_version_uses_earliest() {
        assert_eq!(*policy().resolve(v("2023-01-01")), Shape::Legacy);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let policy = policy();
        let version = v("2025-07-01");
        let first = policy.resolve_index(version);
        assert!((0..100).all(|_| policy.resolve_index(version) == first));
        assert_eq!(
            policy.cutover_for(version),
            ProtocolVersion::parse(V2025_06_18).unwrap()
        );
    }

    #[test]
    fn test_session_resolution() {
        let policy = policy();
        let legacy = Session::new().with_protocol_version(V2024_11_05);
        let handshake = Session::new();
        let garbled = Session::new().with_protocol_version("not-a-date");
        assert_eq!(*policy.resolve_for(&legacy), Shape::Legacy);
        assert_eq!(*policy.resolve_for(&handshake), Shape::Current);
        assert_eq!(*policy.resolve_for(&garbled), Shape::Current);
    }

    #[test]
    fn test_cutovers_are_sorted() {
        let cutovers: Vec<String> = policy().cutovers().map(|c| c.to_string()).collect();
        assert_eq!(cutovers, vec![V2024_11_05, V2025_06_18, V2025_11_25]);

        let shapes: Vec<Shape> = policy().iter().map(|(_, shape)| *shape).collect();
        assert_eq!(shapes, vec![Shape::Legacy, Shape::Middle, Shape::Current]);
    }

    #[test]
    fn test_builder_validation() {
        let empty = VersionPolicy::<Shape>::builder().build();
        assert!(matches!(
            empty,
            Err(SerializationError::Argument {
                name: "cutovers",
                ..
            })
        ));

        let duplicate = VersionPolicy::builder()
            .cutover(V2024_11_05, Shape::Legacy)
            .cutover("2024-11-05", Shape::Current)
            .build();
        assert!(matches!(
            duplicate,
            Err(SerializationError::Argument {
                name: "cutovers",
                ..
            })
        ));

        let bad_token = VersionPolicy::builder()
            .cutover("v1", Shape::Legacy)
            .build();
        assert!(matches!(
            bad_token,
            Err(SerializationError::Argument {
                name: "protocol_version",
                ..
            })
        ));

        let unknown_default = VersionPolicy::builder()
            .cutover(V2024_11_05, Shape::Legacy)
            .default_cutover(V2025_11_25)
            .build();
        assert!(matches!(
            unknown_default,
            Err(SerializationError::Argument {
                name: "default_cutover",
                ..
            })
        ));
    }
}
