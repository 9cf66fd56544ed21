//! Model serializers
//!
//! A [`ModelSerializer<M>`] turns a logical model into wire JSON for one session
//! and back. Three strategies exist:
//!
//! - [`ModelSerializer::Direct`]: the model's own serde impls, no version logic;
//! - [`ModelSerializer::VersionDelegating`]: pick a serializer from a
//!   [`VersionedDtoSet`] by the session's negotiated version;
//! - [`ModelSerializer::DtoMapping`]: map the model to a wire DTO, serialize the DTO.
//!
//! Every public `serialize`/`deserialize` call pushes the session into the
//! [`AmbientSession`] slot exactly once, so contextual codecs anywhere below see it.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::ambient::AmbientSession;
use crate::error::{ModelValidationError, Result, SerializationError};
use crate::session::Session;
use crate::versioned::VersionedDtoSet;

fn encode_value<T: Serialize>(value: &T) -> serde_json::Result<Value> {
    serde_json::to_value(value)
}

/// Plain serde encoding for `T`, independent of any session
pub struct DirectCodec<T> {
    encode: fn(&T) -> serde_json::Result<Value>,
    decode: fn(Value) -> serde_json::Result<T>,
}

impl<T> DirectCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new() -> Self {
        Self {
            encode: encode_value::<T>,
            decode: serde_json::from_value::<T>,
        }
    }
}

impl<T> DirectCodec<T> {
    /// Errors come back as [`SerializationError::Encode`] naming `T`
    pub fn encode(&self, value: &T) -> Result<Value> {
        (self.encode)(value).map_err(SerializationError::encode::<T>)
    }

    /// Errors come back as [`SerializationError::Decode`] naming `T`
    pub fn decode(&self, node: Value) -> Result<T> {
        (self.decode)(node).map_err(SerializationError::decode::<T>)
    }
}

impl<T> Clone for DirectCodec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DirectCodec<T> {}

impl<T> Default for DirectCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DirectCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirectCodec<{}>", std::any::type_name::<T>())
    }
}

/// A model-to-DTO mapping with the DTO type erased
pub trait DtoMap<M>: Send + Sync {
    /// Map the model to its DTO and encode that
    fn to_json(&self, model: &M) -> Result<Value>;

    /// Decode the DTO, then rebuild the model, re-checking its invariants
    fn from_json(&self, node: Value) -> Result<M>;

    /// Type name of the wire DTO, for diagnostics
    fn dto_name(&self) -> &'static str;
}

type ToDto<M, D> = Box<dyn Fn(&M) -> D + Send + Sync>;
type FromDto<M, D> = Box<dyn Fn(D) -> Result<M, ModelValidationError> + Send + Sync>;

struct DtoMapper<M, D> {
    to_dto: ToDto<M, D>,
    from_dto: FromDto<M, D>,
    codec: DirectCodec<D>,
    _model: PhantomData<fn() -> M>,
}

impl<M, D> DtoMap<M> for DtoMapper<M, D>
where
    D: 'static,
{
    fn to_json(&self, model: &M) -> Result<Value> {
        self.codec.encode(&(self.to_dto)(model))
    }

    fn from_json(&self, node: Value) -> Result<M> {
        let dto = self.codec.decode(node)?;
        Ok((self.from_dto)(dto)?)
    }

    fn dto_name(&self) -> &'static str {
        std::any::type_name::<D>()
    }
}

/// How a model reaches and leaves the wire.
///
/// Cloning is cheap; the delegating and mapping variants share their tables.
pub enum ModelSerializer<M> {
    /// `M`'s own serde impls; contextual codecs inside see the pushed session
    Direct(DirectCodec<M>),
    /// Picks a serializer per call from the session's negotiated version
    VersionDelegating(Arc<VersionedDtoSet<M>>),
    /// Goes through one fixed wire DTO
    DtoMapping(Arc<dyn DtoMap<M>>),
}

impl<M> ModelSerializer<M>
where
    M: Serialize + DeserializeOwned,
{
    /// Serializer using `M`'s own serde impls
    pub fn direct() -> Self {
        Self::Direct(DirectCodec::new())
    }
}

impl<M> ModelSerializer<M>
where
    M: 'static,
{
    /// Serialize `M` through the wire shape `D`.
    ///
    /// `from_dto` must re-establish every invariant of `M`; fields an older `D`
    /// lacks get their documented defaults there.
    pub fn dto<D>(
        to_dto: impl Fn(&M) -> D + Send + Sync + 'static,
        from_dto: impl Fn(D) -> Result<M, ModelValidationError> + Send + Sync + 'static,
    ) -> Self
    where
        D: Serialize + DeserializeOwned + 'static,
    {
        Self::DtoMapping(Arc::new(DtoMapper {
            to_dto: Box::new(to_dto),
            from_dto: Box::new(from_dto),
            codec: DirectCodec::<D>::new(),
            _model: PhantomData,
        }))
    }
}

impl<M> ModelSerializer<M> {
    /// Same as [`VersionedDtoSet::into_serializer`]
    pub fn versioned(set: VersionedDtoSet<M>) -> Self {
        Self::VersionDelegating(Arc::new(set))
    }

    /// Encode `model` for the version `session` has negotiated at this moment
    pub fn serialize(&self, model: &M, session: &Session) -> Result<Value> {
        let session = session.snapshot();
        AmbientSession::enter(&session, "ModelSerializer::serialize", || {
            self.encode_in_scope(model, &session)
        })?
    }

    /// Decode `node` for the version `session` has negotiated at this moment
    pub fn deserialize(&self, node: Value, session: &Session) -> Result<M> {
        let session = session.snapshot();
        AmbientSession::enter(&session, "ModelSerializer::deserialize", || {
            self.decode_in_scope(node, &session)
        })?
    }

    /// Encode assuming the caller already pushed `session`
    pub(crate) fn encode_in_scope(&self, model: &M, session: &Session) -> Result<Value> {
        match self {
            Self::Direct(codec) => codec.encode(model),
            Self::VersionDelegating(set) => set.resolve(session).encode_in_scope(model, session),
            Self::DtoMapping(mapping) => mapping.to_json(model),
        }
    }

    pub(crate) fn decode_in_scope(&self, node: Value, session: &Session) -> Result<M> {
        match self {
            Self::Direct(codec) => codec.decode(node),
            Self::VersionDelegating(set) => set.resolve(session).decode_in_scope(node, session),
            Self::DtoMapping(mapping) => mapping.from_json(node),
        }
    }

    /// Variant name for logs: `direct`, `version-delegating` or `dto-mapping`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Direct(_) => "direct",
            Self::VersionDelegating(_) => "version-delegating",
            Self::DtoMapping(_) => "dto-mapping",
        }
    }
}

impl<M> Clone for ModelSerializer<M> {
    fn clone(&self) -> Self {
        match self {
            Self::Direct(codec) => Self::Direct(*codec),
            Self::VersionDelegating(set) => Self::VersionDelegating(Arc::clone(set)),
            Self::DtoMapping(mapping) => Self::DtoMapping(Arc::clone(mapping)),
        }
    }
}

impl<M> fmt::Debug for ModelSerializer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(codec) => f.debug_tuple("Direct").field(codec).finish(),
            Self::VersionDelegating(set) => f.debug_tuple("VersionDelegating").field(set).finish(),
            Self::DtoMapping(mapping) => f
                .debug_tuple("DtoMapping")
                .field(&mapping.dto_name())
                .finish(),
        }
    }
}
