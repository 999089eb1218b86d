use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single extended metadata entry, e.g. `{"value": "1", "source": "commons-desc-page"}`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct MetadataField {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl MetadataField {
    #[must_use]
    pub fn new(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            source: None,
        }
    }
}

/// Extended metadata of one file, keyed by field name (`NonFree`, `License`, ...).
pub type ExtendedMetadata = BTreeMap<String, MetadataField>;

/// Metadata for a set of files, keyed by file name.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct MetadataDump {
    #[serde(default)]
    pub files: BTreeMap<String, ExtendedMetadata>,
}

impl MetadataDump {
    pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        serde_json::from_slice(bytes).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_without_value_reads_as_null() {
        let dump = MetadataDump::from_slice(
            br#"{"files": {"A.jpg": {"NonFree": {"source": "desc"}}}}"#,
        )
        .unwrap();
        let field = &dump.files["A.jpg"]["NonFree"];
        assert!(field.value.is_null());
        assert_eq!(field.source.as_deref(), Some("desc"));
    }
}
