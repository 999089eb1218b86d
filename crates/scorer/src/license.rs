use std::collections::HashMap;

use pageimages_protocol::{ExtendedMetadata, MetadataDump};
use serde_json::Value;

use crate::error::Result;

/// Extended metadata field that marks a file as not freely licensed.
pub const NON_FREE_FIELD: &str = "NonFree";

/// Read access to the file repository's extended metadata.
pub trait FileMetadataSource {
    /// Metadata of `file_name`. Missing or deleted files yield empty
    /// metadata rather than an error.
    fn fetch_metadata(&self, file_name: &str) -> Result<ExtendedMetadata>;
}

impl<T: FileMetadataSource + ?Sized> FileMetadataSource for &T {
    fn fetch_metadata(&self, file_name: &str) -> Result<ExtendedMetadata> {
        (**self).fetch_metadata(file_name)
    }
}

/// Metadata held in memory, e.g. loaded from a metadata dump.
#[derive(Clone, Debug, Default)]
pub struct StaticMetadataSource {
    files: HashMap<String, ExtendedMetadata>,
}

impl StaticMetadataSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_dump(dump: MetadataDump) -> Self {
        Self {
            files: dump.files.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, file_name: impl Into<String>, metadata: ExtendedMetadata) {
        self.files.insert(file_name.into(), metadata);
    }
}

impl FileMetadataSource for StaticMetadataSource {
    fn fetch_metadata(&self, file_name: &str) -> Result<ExtendedMetadata> {
        Ok(self.files.get(file_name).cloned().unwrap_or_default())
    }
}

/// Decides whether a file may be used as the free page image.
pub struct LicenseClassifier<M> {
    metadata: M,
}

impl<M: FileMetadataSource> LicenseClassifier<M> {
    pub fn new(metadata: M) -> Self {
        Self { metadata }
    }

    /// A file is free unless its `NonFree` metadata value is truthy. Files
    /// whose metadata cannot be fetched count as free.
    pub fn is_image_free(&self, file_name: &str) -> bool {
        let metadata = match self.metadata.fetch_metadata(file_name) {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("Treating '{file_name}' as free: {err}");
                return true;
            }
        };
        is_free_metadata(&metadata)
    }
}

#[must_use]
pub fn is_free_metadata(metadata: &ExtendedMetadata) -> bool {
    metadata
        .get(NON_FREE_FIELD)
        .map_or(true, |field| !is_truthy(&field.value))
}

/// Loose truthiness as used by metadata producers: `null`, `false`, `0`,
/// `""`, `"0"` and empty arrays or objects are false.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
