use crate::error::{PageImagesError, Result};
use pageimages_protocol::CandidateRecord;

/// Frame class that opts an image out of page image selection.
pub const NOT_PAGE_IMAGE_CLASS: &str = "notpageimage";

/// An image found while rendering a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageImageCandidate {
    file_name: String,
    handler_width: Option<u32>,
    full_width: Option<u32>,
    full_height: Option<u32>,
    frame_class: Option<String>,
    lead_section: bool,
}

impl PageImageCandidate {
    pub fn new(file_name: impl Into<String>) -> Result<Self> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(PageImagesError::EmptyFileName);
        }
        Ok(Self {
            file_name,
            handler_width: None,
            full_width: None,
            full_height: None,
            frame_class: None,
            lead_section: false,
        })
    }

    pub fn from_record(record: &CandidateRecord) -> Result<Self> {
        let mut candidate = Self::new(record.filename.clone())?;
        candidate.handler_width = record.handler.as_ref().and_then(|h| h.width);
        candidate.full_width = record.fullwidth;
        candidate.full_height = record.fullheight;
        candidate.frame_class = record.frame.as_ref().and_then(|f| f.class.clone());
        candidate.lead_section = record.lead_section;
        Ok(candidate)
    }

    #[must_use]
    pub fn with_handler_width(mut self, width: u32) -> Self {
        self.handler_width = Some(width);
        self
    }

    #[must_use]
    pub fn with_full_size(mut self, width: u32, height: u32) -> Self {
        self.full_width = Some(width);
        self.full_height = Some(height);
        self
    }

    #[must_use]
    pub fn with_full_width(mut self, width: u32) -> Self {
        self.full_width = Some(width);
        self
    }

    #[must_use]
    pub fn with_frame_class(mut self, class: impl Into<String>) -> Self {
        self.frame_class = Some(class.into());
        self
    }

    #[must_use]
    pub fn in_lead_section(mut self, lead: bool) -> Self {
        self.lead_section = lead;
        self
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Width the image is displayed at, 0 when the renderer did not record one.
    #[must_use]
    pub fn handler_width(&self) -> u32 {
        self.handler_width.unwrap_or(0)
    }

    #[must_use]
    pub fn full_width(&self) -> u32 {
        self.full_width.unwrap_or(0)
    }

    #[must_use]
    pub fn full_height(&self) -> u32 {
        self.full_height.unwrap_or(0)
    }

    #[must_use]
    pub fn is_lead_section(&self) -> bool {
        self.lead_section
    }

    /// Width over height of the original file, 0 when either is unknown.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        let (width, height) = (self.full_width(), self.full_height());
        if width == 0 || height == 0 {
            return 0.0;
        }
        f64::from(width) / f64::from(height)
    }

    #[must_use]
    pub fn has_frame_class(&self, class: &str) -> bool {
        self.frame_class
            .as_deref()
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}
