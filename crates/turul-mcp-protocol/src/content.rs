//! Content blocks and the session-aware content list
//!
//! [`ContentList`] is the single source of truth for message content: an
//! ordered, never-empty list of [`ContentBlock`]s. Peers that negotiated a
//! version before [`CONTENT_ARRAY_CUTOVER`] only understand one block per
//! message, so [`ContentListCodec`] writes the singular view for them and the
//! array for everyone else.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec::{ContextualCodec, read_contextual, write_contextual};
use crate::error::ModelValidationError;
use crate::policy::VersionPolicy;
use crate::session::Session;
use crate::version::{V2024_11_05, V2025_11_25};

/// First protocol version whose messages carry `content` as an array
pub const CONTENT_ARRAY_CUTOVER: &str = V2025_11_25;

/// Optional annotations shared by all content blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<Vec<String>>,
    /// 0.0 = lowest, 1.0 = highest
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Contents of an embedded resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceContents {
    Text {
        uri: String,
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        text: String,
    },
    Blob {
        uri: String,
        #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
        /// Base64-encoded
        blob: String,
    },
}

/// One piece of message content, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
        #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
        meta: Option<HashMap<String, Value>>,
    },
    #[serde(rename = "image")]
    Image {
        /// Base64-encoded image data
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
        #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
        meta: Option<HashMap<String, Value>>,
    },
    #[serde(rename = "audio")]
    Audio {
        /// Base64-encoded audio data
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
        #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
        meta: Option<HashMap<String, Value>>,
    },
    #[serde(rename = "resource")]
    Resource {
        resource: ResourceContents,
        #[serde(skip_serializing_if = "Option::is_none")]
        annotations: Option<Annotations>,
        #[serde(rename = "_meta", skip_serializing_if = "Option::is_none")]
        meta: Option<HashMap<String, Value>>,
    },
}

impl ContentBlock {
    /// Plain text without annotations
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            annotations: None,
            meta: None,
        }
    }

    /// `data` is base64-encoded
    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data: data.into(),
            mime_type: mime_type.into(),
            annotations: None,
            meta: None,
        }
    }

    /// Base64 audio with its MIME type
    pub fn audio(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self::Audio {
            data: data.into(),
            mime_type: mime_type.into(),
            annotations: None,
            meta: None,
        }
    }

    /// The text, if this is a text block
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Ordered, non-empty message content
#[derive(Debug, Clone, PartialEq)]
pub struct ContentList(Vec<ContentBlock>);

impl ContentList {
    /// Fails on an empty `blocks`
    pub fn new(blocks: Vec<ContentBlock>) -> Result<Self, ModelValidationError> {
        Self::validated("ContentList", blocks)
    }

    /// Validate on behalf of `model`, so errors name the owning type
    pub(crate) fn validated(
        model: &'static str,
        blocks: Vec<ContentBlock>,
    ) -> Result<Self, ModelValidationError> {
        if blocks.is_empty() {
            return Err(ModelValidationError::new(
                model,
                "content",
                "must contain at least one content block",
            ));
        }
        Ok(Self(blocks))
    }

    /// A one-block list; cannot fail
    pub fn single(block: ContentBlock) -> Self {
        Self(vec![block])
    }

    /// The singular view: the first block
    pub fn first(&self) -> &ContentBlock {
        &self.0[0]
    }

    /// The block an old single-content peer receives. Extra blocks are dropped
    /// with a warning since that shape cannot carry them.
    pub fn singular_view(&self) -> &ContentBlock {
        if self.0.len() > 1 {
            warn!(
                "Dropping {} content block(s): peer protocol predates {}",
                self.0.len() - 1,
                CONTENT_ARRAY_CUTOVER
            );
        }
        self.first()
    }

    /// Writing through the singular view replaces the whole list
    pub fn set_single(&mut self, block: ContentBlock) {
        self.0 = vec![block];
    }

    /// Append a block. The list stays non-empty.
    pub fn push(&mut self, block: ContentBlock) {
        self.0.push(block);
    }

    pub fn as_slice(&self) -> &[ContentBlock] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentBlock> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hand back the blocks; the result is never empty
    pub fn into_vec(self) -> Vec<ContentBlock> {
        self.0
    }
}

impl TryFrom<Vec<ContentBlock>> for ContentList {
    type Error = ModelValidationError;

    fn try_from(blocks: Vec<ContentBlock>) -> Result<Self, Self::Error> {
        Self::new(blocks)
    }
}

impl From<ContentBlock> for ContentList {
    fn from(block: ContentBlock) -> Self {
        Self::single(block)
    }
}

impl<'a> IntoIterator for &'a ContentList {
    type Item = &'a ContentBlock;
    type IntoIter = std::slice::Iter<'a, ContentBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Wire shape of a `content` member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentShape {
    /// One block object
    Single,
    /// Array of blocks
    Array,
}

static CONTENT_SHAPES: LazyLock<VersionPolicy<ContentShape>> = LazyLock::new(|| {
    VersionPolicy::builder()
        .cutover(V2024_11_05, ContentShape::Single)
        .cutover(CONTENT_ARRAY_CUTOVER, ContentShape::Array)
        .build()
        .expect("content shape cutovers are valid version tokens")
});

impl ContentShape {
    /// `None` (no session, or not negotiated yet) yields the latest shape
    pub fn for_session(session: Option<&Session>) -> Self {
        *CONTENT_SHAPES.resolve(session.and_then(Session::protocol_version))
    }

    /// The cutover table behind [`ContentShape::for_session`]
    pub fn policy() -> &'static VersionPolicy<ContentShape> {
        &CONTENT_SHAPES
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<ContentBlock>),
    One(ContentBlock),
}

/// Decode a `content` member sent in either wire shape
fn read_blocks<'de, D>(
    deserializer: D,
    expected: ContentShape,
) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let (blocks, received) = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(blocks) => (blocks, ContentShape::Array),
        OneOrMany::One(block) => (vec![block], ContentShape::Single),
    };
    if received != expected {
        debug!(?expected, ?received, "Peer sent content in the other wire shape");
    }
    Ok(blocks)
}

/// Contextual codec for [`ContentList`].
///
/// Writes are exact for the session's version. Reads accept either shape,
/// but the non-empty invariant is always enforced.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentListCodec;

impl ContextualCodec for ContentListCodec {
    type Value = ContentList;

    fn write<S>(
        &self,
        value: &ContentList,
        serializer: S,
        session: Option<&Session>,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ContentShape::for_session(session) {
            ContentShape::Single => value.singular_view().serialize(serializer),
            ContentShape::Array => value.as_slice().serialize(serializer),
        }
    }

    fn read<'de, D>(
        &self,
        deserializer: D,
        session: Option<&Session>,
    ) -> Result<ContentList, D::Error>
    where
        D: Deserializer<'de>,
    {
        let blocks = read_blocks(deserializer, ContentShape::for_session(session))?;
        ContentList::new(blocks).map_err(de::Error::custom)
    }
}

impl Serialize for ContentList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        write_contextual(&ContentListCodec, self, serializer)
    }
}

impl<'de> Deserialize<'de> for ContentList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        read_contextual(&ContentListCodec, deserializer)
    }
}

/// `#[serde(with = ...)]` for wire DTOs pinned to one content block.
///
/// Writes exactly one block; reads either shape, leaving emptiness checks to
/// the DTO-to-model mapping.
pub(crate) mod single_block {
    use super::{ContentBlock, ContentShape, read_blocks};
    use serde::ser::Error as _;
    use serde::{Deserializer, Serialize, Serializer};

    pub fn serialize<S>(blocks: &[ContentBlock], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match blocks {
            [block] => block.serialize(serializer),
            _ => Err(S::Error::custom(format!(
                "single-block content cannot carry {} blocks",
                blocks.len()
            ))),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
    where
        D: Deserializer<'de>,
    {
        read_blocks(deserializer, ContentShape::Single)
    }
}

/// `#[serde(with = ...)]` for wire DTOs pinned to a content array; reads either shape
pub(crate) mod block_array {
    use super::{ContentBlock, ContentShape, read_blocks};
    use serde::{Deserializer, Serialize, Serializer};

    pub fn serialize<S>(blocks: &[ContentBlock], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        blocks.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
    where
        D: Deserializer<'de>,
    {
        read_blocks(deserializer, ContentShape::Array)
    }
}
