//! MCP Protocol Version Tokens
//!
//! MCP versions are calendar dates (`YYYY-MM-DD`). Ordering is chronological,
//! which makes it total: any two parseable tokens compare, including versions
//! this crate has never heard of.
//!
//! ## Version History
//! - **2024-11-05**: Initial MCP specification with HTTP+SSE transport
//! - **2025-03-26**: Streamable HTTP, OAuth 2.1 authorization, tool annotations
//! - **2025-06-18**: Elicitation, tool output schemas, structured `_meta`
//! - **2025-11-25**: Tasks, sampling with tools, multi-block sampling content

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SerializationError;

const VERSION_FORMAT: &str = "%Y-%m-%d";

/// The first dated MCP revision
pub const V2024_11_05: &str = "2024-11-05";
pub const V2025_03_26: &str = "2025-03-26";
pub const V2025_06_18: &str = "2025-06-18";
/// Revision that introduced multi-block sampling content
pub const V2025_11_25: &str = "2025-11-25";

/// Versions this crate has wire shapes for, oldest first
pub const KNOWN_VERSIONS: [&str; 4] = [V2024_11_05, V2025_03_26, V2025_06_18, V2025_11_25];

/// The newest protocol version; used when a session has not negotiated one yet
pub const LATEST: &str = V2025_11_25;

/// A parsed protocol version token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(NaiveDate);

impl ProtocolVersion {
    /// Parse a `YYYY-MM-DD` token; surrounding whitespace is ignored
    pub fn parse(token: &str) -> Result<Self, SerializationError> {
        NaiveDate::parse_from_str(token.trim(), VERSION_FORMAT)
            .map(Self)
            .map_err(|e| {
                SerializationError::argument(
                    "protocol_version",
                    format!("'{token}' is not a YYYY-MM-DD version token: {e}"),
                )
            })
    }

    /// [`LATEST`] as a parsed version
    pub fn latest() -> Self {
        *LATEST_VERSION
    }

    /// The calendar date behind the token
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Whether this crate ships wire shapes written against this exact version
    pub fn is_known(&self) -> bool {
        PARSED_KNOWN_VERSIONS.contains(self)
    }
}

static PARSED_KNOWN_VERSIONS: LazyLock<Vec<ProtocolVersion>> = LazyLock::new(|| {
    KNOWN_VERSIONS
        .iter()
        .map(|token| ProtocolVersion::parse(token))
        .collect::<Result<_, _>>()
        .expect("KNOWN_VERSIONS are valid version tokens")
});

static LATEST_VERSION: LazyLock<ProtocolVersion> =
    LazyLock::new(|| ProtocolVersion::parse(LATEST).expect("LATEST parses"));

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(VERSION_FORMAT))
    }
}

impl FromStr for ProtocolVersion {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::parse(&token).map_err(serde::de::Error::custom)
    }
}
