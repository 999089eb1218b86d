use thiserror::Error;

pub type Result<T> = std::result::Result<T, PageImagesError>;

#[derive(Error, Debug)]
pub enum PageImagesError {
    /// A candidate record without a file name
    #[error("Image candidate has an empty file name")]
    EmptyFileName,

    /// The candidate source could not produce the page's images
    #[error("Candidate extraction failed: {0}")]
    Extraction(String),

    /// The file metadata backend failed for a file
    #[error("Metadata lookup failed for '{file}': {message}")]
    Metadata { file: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl PageImagesError {
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    pub fn metadata(file: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Metadata {
            file: file.into(),
            message: msg.into(),
        }
    }
}
