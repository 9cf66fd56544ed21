//! Request dispatch table
//!
//! [`RequestHandlers`] binds JSON-RPC method names to typed business callbacks.
//! Each binding decodes params, awaits the callback, and encodes its result.
//! Two registration forms exist:
//!
//! - [`RequestHandlers::set`]: plain serde descriptors, no session involved;
//! - [`RequestHandlers::set_with_serializers`]: [`ModelSerializer`]s plus the
//!   [`Session`], so param and result shapes follow the negotiated version.
//!
//! Decode and encode failures surface as `E::from(SerializationError)`. Errors
//! returned by the callback itself, cancellation included, come back untouched.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use turul_mcp_json_rpc_server::{JsonRpcError, JsonRpcMessage, JsonRpcRequest, ToJsonRpcError};

use crate::cancellation::CancellationHandle;
use crate::error::{Result, SerializationError};
use crate::serializer::{DirectCodec, ModelSerializer};
use crate::session::Session;

/// What a bound handler returns: the encoded result or the caller's error
pub type HandlerFuture<E> = BoxFuture<'static, Result<Value, E>>;

/// A bound handler: raw request in, encoded result out
pub type RequestHandler<E> =
    Arc<dyn Fn(JsonRpcRequest, CancellationHandle) -> HandlerFuture<E> + Send + Sync>;

/// Method name to handler table.
///
/// Populated during setup and read-only afterwards, so lookups need no locking.
pub struct RequestHandlers<E> {
    handlers: HashMap<String, RequestHandler<E>>,
}

impl<E> RequestHandlers<E>
where
    E: From<SerializationError> + Send + 'static,
{
    /// An empty table
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` under `method` using the params' and result's own serde impls
    pub fn set<P, R, F, Fut>(&mut self, method: impl Into<String>, handler: F) -> Result<()>
    where
        P: Serialize + DeserializeOwned + Send + 'static,
        R: Serialize + DeserializeOwned + Send + 'static,
        F: Fn(P, JsonRpcRequest, CancellationHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let method = validate_method(method.into())?;
        let handler = Arc::new(handler);
        let params_codec = DirectCodec::<P>::new();
        let result_codec = DirectCodec::<R>::new();

        let bound: RequestHandler<E> = Arc::new(
            move |request: JsonRpcRequest, cancel: CancellationHandle| -> HandlerFuture<E> {
                let handler = Arc::clone(&handler);
                async move {
                    let params = params_codec.decode(request.params_value())?;
                    let result = handler(params, request, cancel).await?;
                    Ok(result_codec.encode(&result)?)
                }
                .boxed()
            },
        );

        debug!(method = %method, serializers = false, "Registering request handler");
        self.insert(method, bound);
        Ok(())
    }

    /// Register `handler` under `method`, decoding and encoding through the
    /// given serializers for `session`.
    ///
    /// The handler keeps a clone of `session`, so a version negotiated after
    /// registration applies to every later request.
    pub fn set_with_serializers<P, R, F, Fut>(
        &mut self,
        method: impl Into<String>,
        session: &Session,
        handler: F,
        params_serializer: ModelSerializer<P>,
        result_serializer: ModelSerializer<R>,
    ) -> Result<()>
    where
        P: Send + 'static,
        R: Send + 'static,
        F: Fn(P, JsonRpcRequest, CancellationHandle) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
    {
        let method = validate_method(method.into())?;
        let handler = Arc::new(handler);
        let session = session.clone();

        let bound: RequestHandler<E> = Arc::new(
            move |request: JsonRpcRequest, cancel: CancellationHandle| -> HandlerFuture<E> {
                let handler = Arc::clone(&handler);
                let session = session.clone();
                let params_serializer = params_serializer.clone();
                let result_serializer = result_serializer.clone();
                async move {
                    let params = params_serializer.deserialize(request.params_value(), &session)?;
                    let result = handler(params, request, cancel).await?;
                    Ok(result_serializer.serialize(&result, &session)?)
                }
                .boxed()
            },
        );

        debug!(method = %method, serializers = true, "Registering request handler");
        self.insert(method, bound);
        Ok(())
    }

    fn insert(&mut self, method: String, handler: RequestHandler<E>) {
        if self.handlers.insert(method.clone(), handler).is_some() {
            warn!(method = %method, "Replaced existing request handler");
        }
    }
}

impl<E> RequestHandlers<E> {
    /// Whether a handler is bound to `method` (exact, case-sensitive match)
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// The bound handler for `method`, if any
    pub fn get(&self, method: &str) -> Option<&RequestHandler<E>> {
        self.handlers.get(method)
    }

    /// Registered method names, in no particular order
    pub fn methods(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the handler for `request.method`.
    ///
    /// `None` means no handler is registered; `Some(Err(_))` means one ran and failed.
    pub async fn dispatch(
        &self,
        request: JsonRpcRequest,
        cancel: CancellationHandle,
    ) -> Option<Result<Value, E>> {
        let handler = Arc::clone(self.handlers.get(&request.method)?);
        debug!(method = %request.method, id = %request.id, "Dispatching request");
        Some(handler(request, cancel).await)
    }

    /// Dispatch and wrap the outcome in a JSON-RPC response envelope
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        cancel: CancellationHandle,
    ) -> JsonRpcMessage
    where
        E: ToJsonRpcError,
    {
        let id = request.id.clone();
        let method = request.method.clone();
        match self.dispatch(request, cancel).await {
            Some(Ok(result)) => JsonRpcMessage::success(id, result),
            Some(Err(error)) => {
                JsonRpcMessage::error(JsonRpcError::new(Some(id), error.to_error_object()))
            }
            None => JsonRpcMessage::error(JsonRpcError::method_not_found(id, &method)),
        }
    }
}

impl<E> Default for RequestHandlers<E>
where
    E: From<SerializationError> + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn validate_method(method: String) -> Result<String> {
    if method.trim().is_empty() {
        return Err(SerializationError::argument(
            "method",
            "method name must not be empty",
        ));
    }
    Ok(method)
}
