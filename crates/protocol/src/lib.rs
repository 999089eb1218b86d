use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod metadata;

pub use metadata::{ExtendedMetadata, MetadataDump, MetadataField};

pub const PAGE_DUMP_SCHEMA_VERSION: u32 = 1;

/// Page property holding the best image regardless of license.
pub const PROP_NAME: &str = "page_image";

/// Page property holding the best freely licensed image.
pub const PROP_NAME_FREE: &str = "page_image_free";

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct HandlerParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct FrameParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// One image as recorded by the renderer while parsing a page.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct CandidateRecord {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullwidth: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullheight: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<HandlerParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FrameParams>,
    /// Set when the image was found in the lead section.
    #[serde(default)]
    pub lead_section: bool,
}

/// Rendered page handed over by the host after a content update.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct PageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub namespace: i32,
    pub title: String,
    /// Images of the whole page in document order.
    #[serde(default)]
    pub images: Vec<CandidateRecord>,
    /// Images of the lead section rendered in isolation, when the host
    /// provides that render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_images: Option<Vec<CandidateRecord>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct SelectionOutput {
    pub title: String,
    /// Properties written for the page, keyed by property name.
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct CandidateScore {
    pub position: usize,
    pub filename: String,
    pub score: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ScoreOutput {
    pub title: String,
    pub candidates: Vec<CandidateScore>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CommandResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorEnvelope>,
}

impl CommandResponse {
    pub fn ok<T: Serialize>(result: &T) -> Result<Self> {
        Ok(Self {
            status: ResponseStatus::Ok,
            result: Some(serde_json::to_value(result)?),
            error: None,
        })
    }

    #[must_use]
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            result: None,
            error: Some(ErrorEnvelope {
                code: code.into(),
                message: message.into(),
                hint: None,
            }),
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.hint = Some(hint.into());
        }
        self
    }
}

pub fn parse_page_record(bytes: &[u8]) -> Result<PageRecord> {
    let page: PageRecord = serde_json::from_slice(bytes)?;
    if let Some(version) = page.schema_version {
        if version != PAGE_DUMP_SCHEMA_VERSION {
            anyhow::bail!(
                "page.schema_version {version} is not supported (expected {PAGE_DUMP_SCHEMA_VERSION})"
            );
        }
    }
    Ok(page)
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}
