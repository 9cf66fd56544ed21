//! Versioned DTO sets
//!
//! One serializer per wire shape, keyed by the protocol version that introduced
//! it. Selection is delegated to [`VersionPolicy`], so the serialize and
//! deserialize paths resolve identically for the same session.

use std::fmt;

use crate::error::Result;
use crate::policy::{VersionPolicy, VersionPolicyBuilder};
use crate::serializer::ModelSerializer;
use crate::session::Session;
use crate::version::ProtocolVersion;

/// Model serializers keyed by the version whose wire shape they produce
pub struct VersionedDtoSet<M> {
    policy: VersionPolicy<ModelSerializer<M>>,
}

impl<M> VersionedDtoSet<M> {
    /// Start an empty set
    pub fn builder() -> VersionedDtoSetBuilder<M> {
        VersionedDtoSetBuilder {
            policy: VersionPolicy::builder(),
        }
    }

    /// The serializer for the session's negotiated version
    pub fn resolve(&self, session: &Session) -> &ModelSerializer<M> {
        self.policy.resolve_for(session)
    }

    /// Same as [`resolve`](Self::resolve) for an already extracted version
    pub fn resolve_version(&self, version: Option<ProtocolVersion>) -> &ModelSerializer<M> {
        self.policy.resolve(version)
    }

    /// The underlying cutover table
    pub fn policy(&self) -> &VersionPolicy<ModelSerializer<M>> {
        &self.policy
    }

    /// Wrap as a [`ModelSerializer::VersionDelegating`]
    pub fn into_serializer(self) -> ModelSerializer<M> {
        ModelSerializer::versioned(self)
    }
}

impl<M> fmt::Debug for VersionedDtoSet<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (cutover, serializer) in self.policy.iter() {
            map.entry(&cutover.to_string(), serializer);
        }
        map.finish()
    }
}

/// Builder for [`VersionedDtoSet`]
pub struct VersionedDtoSetBuilder<M> {
    policy: VersionPolicyBuilder<ModelSerializer<M>>,
}

impl<M> VersionedDtoSetBuilder<M> {
    /// Use `serializer` from `version` onwards
    pub fn cutover(mut self, version: impl Into<String>, serializer: ModelSerializer<M>) -> Self {
        self.policy = self.policy.cutover(version, serializer);
        self
    }

    /// Shape used before a version is negotiated; the newest cutover if unset
    pub fn default_cutover(mut self, version: impl Into<String>) -> Self {
        self.policy = self.policy.default_cutover(version);
        self
    }

    /// Fails under the same conditions as [`VersionPolicyBuilder::build`]
    pub fn build(self) -> Result<VersionedDtoSet<M>> {
        Ok(VersionedDtoSet {
            policy: self.policy.build()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelValidationError;
    use crate::version::{V2024_11_05, V2025_06_18};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Tags(Vec<String>);

    #[derive(Serialize, Deserialize)]
    struct TagsCsv {
        tags: String,
    }

    #[derive(Serialize, Deserialize)]
    struct TagsList {
        tags: Vec<String>,
    }

    fn tags_serializer() -> ModelSerializer<Tags> {
        VersionedDtoSet::builder()
            .cutover(
                V2024_11_05,
                ModelSerializer::dto(
                    |t: &Tags| TagsCsv {
                        tags: t.0.join(","),
                    },
                    |dto: TagsCsv| {
                        Ok::<_, ModelValidationError>(Tags(
                            dto.tags.split(',').map(str::to_string).collect(),
                        ))
                    },
                ),
            )
            .cutover(
                V2025_06_18,
                ModelSerializer::dto(
                    |t: &Tags| TagsList { tags: t.0.clone() },
                    |dto: TagsList| Ok(Tags(dto.tags)),
                ),
            )
            .build()
            .unwrap()
            .into_serializer()
    }

    #[test]
    fn test_shape_follows_session_version() {
        let serializer = tags_serializer();
        let tags = Tags(vec!["a".into(), "b".into()]);

        let old = Session::new().with_protocol_version(V2024_11_05);
        let new = Session::new().with_protocol_version(V2025_06_18);
        let handshake = Session::new();

        let csv = serializer.serialize(&tags, &old).unwrap();
        assert_eq!(csv, json!({"tags": "a,b"}));
        let list = serializer.serialize(&tags, &new).unwrap();
        assert_eq!(list, json!({"tags": ["a", "b"]}));
        let default = serializer.serialize(&tags, &handshake).unwrap();
        assert_eq!(default, json!({"tags": ["a", "b"]}));
    }

    #[test]
    fn test_round_trip_at_every_cutover() {
        let serializer = tags_serializer();
        let tags = Tags(vec!["x".into(), "y".into(), "z".into()]);
        for token in [V2024_11_05, "2025-01-01", V2025_06_18, "2026-01-01"] {
            let session = Session::new().with_protocol_version(token);
            let json = serializer.serialize(&tags, &session).unwrap();
            let back = serializer.deserialize(json, &session).unwrap();
            assert_eq!(back, tags, "at {token}");
        }
    }

    #[test]
    fn test_resolve_is_stable_per_version() {
        let ModelSerializer::VersionDelegating(set) = tags_serializer() else {
            panic!("expected a version-delegating serializer");
        };
        let session = Session::new().with_protocol_version("2025-02-01");
        let first: *const ModelSerializer<Tags> = set.resolve(&session);
        let again: *const ModelSerializer<Tags> = set.resolve(&session);
        assert_eq!(first, again);
        let cutover = set.policy().cutover_for(session.protocol_version());
        assert_eq!(cutover.to_string(), V2024_11_05);
    }
}
