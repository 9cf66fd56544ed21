//! # Prelude
//!
//! ```rust
//! use turul_mcp_protocol::prelude::*;
//! ```

pub use crate::ambient::AmbientSession;
pub use crate::cancellation::CancellationHandle;
pub use crate::codec::{ContextualCodec, deserialize_contextual, serialize_contextual};
pub use crate::content::{ContentBlock, ContentList};
pub use crate::error::{ModelValidationError, SerializationError};
pub use crate::handlers::RequestHandlers;
pub use crate::sampling::{
    CREATE_MESSAGE_METHOD, CreateMessageParams, CreateMessageResult, Role, SamplingMessage,
};
pub use crate::serializer::ModelSerializer;
pub use crate::session::Session;
pub use crate::version::ProtocolVersion;
pub use crate::versioned::VersionedDtoSet;
