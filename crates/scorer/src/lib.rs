//! # Page image scorer
//!
//! Chooses the image that best represents a wiki page.
//!
//! ```text
//! Rendered page
//!     │
//!     ├──> CandidateSource (lead section or whole page)
//!     │
//!     ├──> ImageScorer
//!     │    ├─> width / gallery width table
//!     │    ├─> aspect ratio table
//!     │    ├─> position bonus
//!     │    └─> denylist / notpageimage override
//!     │
//!     ├──> LicenseClassifier (FileMetadataSource, "NonFree")
//!     │
//!     └──> PagePropertyStore
//!          ├─> page_image_free
//!          └─> page_image
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pageimages_scorer::{
//!     LinksUpdateHandler, PageImageCandidate, ParsedPage, ScoringConfig, StaticMetadataSource,
//! };
//! use std::collections::BTreeMap;
//!
//! let page = ParsedPage::new(
//!     0,
//!     "Lighthouse",
//!     vec![PageImageCandidate::new("Lighthouse.jpg")
//!         .unwrap()
//!         .with_handler_width(300)
//!         .with_full_size(1500, 1000)
//!         .in_lead_section(true)],
//! );
//!
//! let handler = LinksUpdateHandler::new(ScoringConfig::default(), StaticMetadataSource::new());
//! let mut props: BTreeMap<String, String> = BTreeMap::new();
//! let selected = handler.do_links_update(page.page_ref(), &page, &mut props).unwrap();
//! assert_eq!(selected.free.as_deref(), Some("Lighthouse.jpg"));
//! assert_eq!(props["page_image_free"], "Lighthouse.jpg");
//! ```

mod candidate;
mod config;
mod denylist;
mod error;
mod license;
mod links_update;
mod scorer;
mod table;

pub use candidate::{PageImageCandidate, NOT_PAGE_IMAGE_CLASS};
pub use config::{ScoreTables, ScoringConfig, SelectionMode};
pub use denylist::{db_key, Denylist, EXCLUDED_SCORE};
pub use error::{PageImagesError, Result};
pub use license::{
    is_free_metadata, is_truthy, FileMetadataSource, LicenseClassifier, StaticMetadataSource,
    NON_FREE_FIELD,
};
pub use links_update::{
    select_page_images, CandidateSource, ExtractionScope, LinksUpdateHandler, PageImageProperties,
    PagePropertyStore, PageRef, ParsedPage, ScoredImage,
};
pub use scorer::ImageScorer;
pub use table::ScoreTable;

pub use pageimages_protocol::{PROP_NAME, PROP_NAME_FREE};
