//! # JSON-RPC 2.0 Envelopes
//!
//! Transport-agnostic JSON-RPC 2.0 message types. The versioned MCP serialization
//! core consumes [`JsonRpcRequest`] (method name and raw params) and hands back
//! either a raw result value or a [`JsonRpcMessage`] ready to be framed by the
//! transport.
//!
//! Framing, id correlation and batching are the transport's business; this crate
//! only fixes the shapes.

pub mod error;
pub mod prelude;
pub mod request;
pub mod response;
pub mod types;

pub use error::{JsonRpcError, JsonRpcErrorCode, JsonRpcErrorObject, ToJsonRpcError};
pub use request::{JsonRpcRequest, RequestParams};
pub use response::{JsonRpcMessage, JsonRpcResponse, ResponseResult};
pub use types::{JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    // Server error range: -32099 to -32000
    pub const SERVER_ERROR_START: i64 = -32099;
    pub const SERVER_ERROR_END: i64 = -32000;
}
