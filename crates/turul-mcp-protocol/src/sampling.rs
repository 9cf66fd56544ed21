//! MCP Sampling Types
//!
//! `sampling/createMessage` is the reference versioned exchange. Its result
//! carries one content block per message before 2025-11-25 and an array of
//! blocks from 2025-11-25 on.
//!
//! [`CreateMessageResult`] is the version-independent model. It can reach the
//! wire two equivalent ways:
//!
//! - [`CreateMessageResult::model_serializer`]: a [`VersionedDtoSet`] over the
//!   [`CreateMessageResultV1`] and [`CreateMessageResultV2`] wire DTOs;
//! - its own serde impls, whose [`ContentList`] member goes through
//!   [`ContentListCodec`](crate::content::ContentListCodec) and so follows the
//!   ambient session.
//!
//! Both produce identical JSON for the same negotiated version. Both also read
//! leniently: either `content` shape is accepted whatever the version, and an
//! empty list is rejected.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::content::{CONTENT_ARRAY_CUTOVER, ContentBlock, ContentList};
use crate::error::ModelValidationError;
use crate::serializer::ModelSerializer;
use crate::version::V2024_11_05;
use crate::versioned::VersionedDtoSet;

/// JSON-RPC method name for sampling requests
pub const CREATE_MESSAGE_METHOD: &str = "sampling/createMessage";

/// Message author (MCP only defines "user" | "assistant")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in a sampling conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingMessage {
    pub role: Role,
    pub content: ContentList,
}

impl SamplingMessage {
    pub fn new(role: Role, content: impl Into<ContentList>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Shorthand for a single text block from the user
    pub fn user_text(text: impl Into<String>) -> Self {
        Self::new(Role::User, ContentBlock::text(text))
    }
}

/// Parameters for `sampling/createMessage`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageParams {
    pub messages: Vec<SamplingMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, Value>>,
}

impl CreateMessageParams {
    /// Only the required fields; the rest start empty
    pub fn new(messages: Vec<SamplingMessage>, max_tokens: u32) -> Self {
        Self {
            messages,
            system_prompt: None,
            include_context: None,
            temperature: None,
            max_tokens,
            stop_sequences: None,
            metadata: None,
            meta: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Result of `sampling/createMessage`
///
/// `content` is never empty. [`content`](Self::content) is the singular view
/// older peers see; [`contents`](Self::contents) is the full list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageResult {
    content: ContentList,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    pub role: Role,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, Value>>,
}

impl CreateMessageResult {
    /// Fails if `contents` is empty
    pub fn new(
        role: Role,
        contents: Vec<ContentBlock>,
        model: impl Into<String>,
    ) -> Result<Self, ModelValidationError> {
        Ok(Self::from_content_list(
            role,
            ContentList::validated("CreateMessageResult", contents)?,
            model,
        ))
    }

    /// Infallible: a [`ContentList`] is already non-empty
    pub fn from_content_list(role: Role, content: ContentList, model: impl Into<String>) -> Self {
        Self {
            content,
            model: model.into(),
            stop_reason: None,
            role,
            meta: None,
        }
    }

    pub fn with_stop_reason(mut self, reason: impl Into<String>) -> Self {
        self.stop_reason = Some(reason.into());
        self
    }

    pub fn with_meta(mut self, meta: HashMap<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }

    /// The first content block
    pub fn content(&self) -> &ContentBlock {
        self.content.first()
    }

    /// Every content block, in order
    pub fn contents(&self) -> &[ContentBlock] {
        self.content.as_slice()
    }

    /// The content as the validated list type
    pub fn content_list(&self) -> &ContentList {
        &self.content
    }

    /// Replace the whole content list with a single block
    pub fn set_content(&mut self, block: ContentBlock) {
        self.content.set_single(block);
    }

    /// Version-delegating serializer over the V1/V2 wire DTOs
    pub fn model_serializer() -> &'static ModelSerializer<CreateMessageResult> {
        &CREATE_MESSAGE_RESULT_SERIALIZER
    }
}

/// Wire shape before 2025-11-25: `content` is one block.
///
/// `content` holds exactly one block when written. A peer that sends an array
/// anyway is still understood.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageResultV1 {
    #[serde(with = "crate::content::single_block")]
    pub content: Vec<ContentBlock>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    pub role: Role,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, Value>>,
}

impl From<&CreateMessageResult> for CreateMessageResultV1 {
    fn from(model: &CreateMessageResult) -> Self {
        Self {
            content: vec![model.content.singular_view().clone()],
            model: model.model.clone(),
            stop_reason: model.stop_reason.clone(),
            role: model.role,
            meta: model.meta.clone(),
        }
    }
}

impl TryFrom<CreateMessageResultV1> for CreateMessageResult {
    type Error = ModelValidationError;

    /// A single block becomes a one-element list
    fn try_from(dto: CreateMessageResultV1) -> Result<Self, Self::Error> {
        Ok(Self {
            content: ContentList::validated("CreateMessageResult", dto.content)?,
            model: dto.model,
            stop_reason: dto.stop_reason,
            role: dto.role,
            meta: dto.meta,
        })
    }
}

/// Wire shape from 2025-11-25: `content` is an array of blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageResultV2 {
    #[serde(with = "crate::content::block_array")]
    pub content: Vec<ContentBlock>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    pub role: Role,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, Value>>,
}

impl From<&CreateMessageResult> for CreateMessageResultV2 {
    fn from(model: &CreateMessageResult) -> Self {
        Self {
            content: model.contents().to_vec(),
            model: model.model.clone(),
            stop_reason: model.stop_reason.clone(),
            role: model.role,
            meta: model.meta.clone(),
        }
    }
}

impl TryFrom<CreateMessageResultV2> for CreateMessageResult {
    type Error = ModelValidationError;

    fn try_from(dto: CreateMessageResultV2) -> Result<Self, Self::Error> {
        Ok(Self {
            content: ContentList::validated("CreateMessageResult", dto.content)?,
            model: dto.model,
            stop_reason: dto.stop_reason,
            role: dto.role,
            meta: dto.meta,
        })
    }
}

impl CreateMessageResultV1 {
    /// DTO mapping pinned to the single-block shape, whatever the session
    pub fn model_serializer() -> ModelSerializer<CreateMessageResult> {
        ModelSerializer::dto(
            |model: &CreateMessageResult| CreateMessageResultV1::from(model),
            |dto: CreateMessageResultV1| CreateMessageResult::try_from(dto),
        )
    }
}

impl CreateMessageResultV2 {
    /// DTO mapping pinned to the array shape, whatever the session
    pub fn model_serializer() -> ModelSerializer<CreateMessageResult> {
        ModelSerializer::dto(
            |model: &CreateMessageResult| CreateMessageResultV2::from(model),
            |dto: CreateMessageResultV2| CreateMessageResult::try_from(dto),
        )
    }
}

static CREATE_MESSAGE_RESULT_SERIALIZER: LazyLock<ModelSerializer<CreateMessageResult>> =
    LazyLock::new(|| {
        VersionedDtoSet::builder()
            .cutover(V2024_11_05, CreateMessageResultV1::model_serializer())
            .cutover(
                CONTENT_ARRAY_CUTOVER,
                CreateMessageResultV2::model_serializer(),
            )
            .build()
            .expect("CreateMessageResult cutovers are valid version tokens")
            .into_serializer()
    });
