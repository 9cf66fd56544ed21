//! Session-aware serde codecs
//!
//! A [`ContextualCodec`] is written against an explicit `Option<&Session>`.
//! serde calls codecs through its fixed `serialize`/`deserialize` shape, so the
//! bridge functions [`write_contextual`] and [`read_contextual`] fetch the session
//! from [`AmbientSession`] and pass it along. Either implement `Serialize` and
//! `Deserialize` for the value type through the bridges (as
//! [`ContentList`](crate::content::ContentList) does), or hook the codec into a
//! single field with `#[serde(with = "...")]` on a small module calling them.
//!
//! The bridges only *read* the slot. Something above them has to push the
//! session first: a [`ModelSerializer`](crate::serializer::ModelSerializer) call,
//! or [`serialize_contextual`]/[`deserialize_contextual`]. Plain `serde_json`
//! use without either sees `None`, and the codec falls back to the latest shape.

use serde::de::DeserializeOwned;
use serde::{Deserializer, Serialize, Serializer};
use serde_json::{Value, from_value, to_value};

use crate::ambient::AmbientSession;
use crate::error::{Result, SerializationError};
use crate::session::Session;

/// A serde codec that picks its wire shape from the session.
///
/// `session` is `None` when no serializer call pushed one.
pub trait ContextualCodec {
    type Value;

    fn write<S>(
        &self,
        value: &Self::Value,
        serializer: S,
        session: Option<&Session>,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer;

    fn read<'de, D>(
        &self,
        deserializer: D,
        session: Option<&Session>,
    ) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>;
}

/// serde-facing write: hands the ambient session (if any) to `codec`
pub fn write_contextual<C, S>(codec: &C, value: &C::Value, serializer: S) -> Result<S::Ok, S::Error>
where
    C: ContextualCodec,
    S: Serializer,
{
    let session = AmbientSession::current();
    codec.write(value, serializer, session.as_ref())
}

/// serde-facing read: hands the ambient session (if any) to `codec`
pub fn read_contextual<'de, C, D>(codec: &C, deserializer: D) -> Result<C::Value, D::Error>
where
    C: ContextualCodec,
    D: Deserializer<'de>,
{
    let session = AmbientSession::current();
    codec.read(deserializer, session.as_ref())
}

/// Serialize `value` with `session` visible to any contextual codec it contains
pub fn serialize_contextual<T>(value: &T, session: &Session) -> Result<Value>
where
    T: Serialize + ?Sized,
{
    let session = session.snapshot();
    AmbientSession::enter(&session, "serialize_contextual", || to_value(value))?
        .map_err(SerializationError::encode::<T>)
}

/// Deserialize `node` with `session` visible to any contextual codec it contains
pub fn deserialize_contextual<T>(node: Value, session: &Session) -> Result<T>
where
    T: DeserializeOwned,
{
    let session = session.snapshot();
    AmbientSession::enter(&session, "deserialize_contextual", || from_value(node))?
        .map_err(SerializationError::decode::<T>)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::V2024_11_05;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    /// Writes the negotiated version (or "latest") instead of the value itself
    struct VersionStamp;

    impl ContextualCodec for VersionStamp {
        type Value = u32;

        fn write<S: Serializer>(
            &self,
            value: &u32,
            serializer: S,
            session: Option<&Session>,
        ) -> Result<S::Ok, S::Error> {
            let version = session
                .and_then(Session::protocol_version)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "latest".to_string());
            serializer.collect_str(&format_args!("{value}@{version}"))
        }

        fn read<'de, D: Deserializer<'de>>(
            &self,
            deserializer: D,
            session: Option<&Session>,
        ) -> Result<u32, D::Error> {
            let raw = String::deserialize(deserializer)?;
            let expected = session
                .and_then(Session::protocol_version)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "latest".to_string());
            let (value, version) = raw
                .split_once('@')
                .ok_or_else(|| serde::de::Error::custom("missing version stamp"))?;
            if version != expected {
                return Err(serde::de::Error::custom(format!(
                    "stamped for {version}, reading as {expected}"
                )));
            }
            value.parse().map_err(serde::de::Error::custom)
        }
    }

    mod stamped {
        use super::*;

        pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
            write_contextual(&VersionStamp, value, serializer)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
            read_contextual(&VersionStamp, deserializer)
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        #[serde(with = "stamped")]
        count: u32,
    }

    #[test]
    fn test_codec_sees_pushed_session() {
        let session = Session::new().with_protocol_version(V2024_11_05);
        let json = serialize_contextual(&Counter { count: 3 }, &session).unwrap();
        assert_eq!(json, json!({"count": "3@2024-11-05"}));

        let back: Counter = deserialize_contextual(json, &session).unwrap();
        assert_eq!(back, Counter { count: 3 });
    }

    #[test]
    fn test_plain_serde_degrades_to_latest() {
        let json = serde_json::to_value(Counter { count: 9 }).unwrap();
        assert_eq!(json, json!({"count": "9@latest"}));
    }

    #[test]
    fn test_decode_error_is_reported_not_swallowed() {
        let session = Session::new().with_protocol_version(V2024_11_05);
        let err = deserialize_contextual::<Counter>(json!({"count": "1@latest"}), &session)
            .unwrap_err();
        assert!(matches!(err, SerializationError::Decode { .. }));
    }
}
