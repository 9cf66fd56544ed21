//! # Versioned MCP Serialization Core
//!
//! Maps version-independent MCP models onto the wire shape each peer negotiated,
//! and binds JSON-RPC methods to typed handlers.
//!
//! - [`ambient`]: call-scoped session slot read by codecs that serde calls without context
//! - [`codec`]: [`ContextualCodec`], session-aware field codecs
//! - [`serializer`]: [`ModelSerializer`] (direct, version-delegating, DTO mapping)
//! - [`versioned`]: [`VersionedDtoSet`], cutover-based serializer selection
//! - [`handlers`]: [`RequestHandlers`], the method dispatch table
//! - [`sampling`]: `sampling/createMessage`, whose result content became an array in 2025-11-25
//!
//! ## Usage
//!
//! ```rust
//! use turul_mcp_protocol::prelude::*;
//! use serde_json::json;
//!
//! let result = CreateMessageResult::new(
//!     Role::Assistant,
//!     vec![ContentBlock::text("Hello")],
//!     "claude-3-5-sonnet",
//! )?;
//!
//! let old_peer = Session::new().with_protocol_version("2025-06-18");
//! let json = CreateMessageResult::model_serializer().serialize(&result, &old_peer)?;
//! assert_eq!(json["content"], json!({"type": "text", "text": "Hello"}));
//!
//! let new_peer = Session::new().with_protocol_version("2025-11-25");
//! let json = CreateMessageResult::model_serializer().serialize(&result, &new_peer)?;
//! assert_eq!(json["content"], json!([{"type": "text", "text": "Hello"}]));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ambient;
pub mod cancellation;
pub mod codec;
pub mod content;
pub mod error;
pub mod handlers;
pub mod policy;
pub mod prelude;
pub mod sampling;
pub mod serializer;
pub mod session;
pub mod version;
pub mod versioned;

pub use ambient::AmbientSession;
pub use cancellation::CancellationHandle;
pub use codec::{ContextualCodec, deserialize_contextual, serialize_contextual};
pub use content::{CONTENT_ARRAY_CUTOVER, ContentBlock, ContentList, ContentListCodec, ContentShape};
pub use error::{ModelValidationError, Result, SerializationError};
pub use handlers::{HandlerFuture, RequestHandler, RequestHandlers};
pub use policy::{VersionPolicy, VersionPolicyBuilder};
pub use sampling::{
    CREATE_MESSAGE_METHOD, CreateMessageParams, CreateMessageResult, CreateMessageResultV1,
    CreateMessageResultV2, Role, SamplingMessage,
};
pub use serializer::{DirectCodec, DtoMap, ModelSerializer};
pub use session::Session;
pub use version::{LATEST, ProtocolVersion};
pub use versioned::{VersionedDtoSet, VersionedDtoSetBuilder};

pub use turul_mcp_json_rpc_server as json_rpc;
