//! Page image selection run after a page's links are updated.

use std::collections::{BTreeMap, HashMap};

use pageimages_protocol::{PageRecord, PROP_NAME, PROP_NAME_FREE};

use crate::candidate::PageImageCandidate;
use crate::config::{ScoringConfig, SelectionMode};
use crate::error::Result;
use crate::license::{FileMetadataSource, LicenseClassifier};
use crate::scorer::ImageScorer;

/// Which render of the page to take images from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionScope {
    /// The lead section rendered on its own.
    LeadSection,
    WholePage,
}

/// Produces the images of a page in document order.
pub trait CandidateSource {
    fn candidates(&self, scope: ExtractionScope) -> Result<Vec<PageImageCandidate>>;
}

/// Receives the page properties computed for a page.
pub trait PagePropertyStore {
    fn set_property(&mut self, name: &str, value: String);
}

impl PagePropertyStore for BTreeMap<String, String> {
    fn set_property(&mut self, name: &str, value: String) {
        self.insert(name.to_string(), value);
    }
}

impl PagePropertyStore for HashMap<String, String> {
    fn set_property(&mut self, name: &str, value: String) {
        self.insert(name.to_string(), value);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRef<'a> {
    pub namespace: i32,
    pub title: &'a str,
}

/// The selected images. Either may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageImageProperties {
    pub free: Option<String>,
    pub non_free: Option<String>,
}

impl PageImageProperties {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.free.is_none() && self.non_free.is_none()
    }

    pub fn write_to(&self, store: &mut impl PagePropertyStore) {
        if let Some(free) = &self.free {
            store.set_property(PROP_NAME_FREE, free.clone());
        }
        if let Some(non_free) = &self.non_free {
            store.set_property(PROP_NAME, non_free.clone());
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredImage {
    pub position: usize,
    pub file_name: String,
    pub score: f64,
}

/// Page images from a rendered page dump.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedPage {
    namespace: i32,
    title: String,
    images: Vec<PageImageCandidate>,
    lead_images: Option<Vec<PageImageCandidate>>,
}

impl ParsedPage {
    pub fn new(namespace: i32, title: impl Into<String>, images: Vec<PageImageCandidate>) -> Self {
        Self {
            namespace,
            title: title.into(),
            images,
            lead_images: None,
        }
    }

    /// Uses an isolated render of the lead section instead of the
    /// per-image `lead_section` flags.
    #[must_use]
    pub fn with_lead_images(mut self, lead_images: Vec<PageImageCandidate>) -> Self {
        self.lead_images = Some(lead_images);
        self
    }

    pub fn from_record(record: &PageRecord) -> Result<Self> {
        let images = record
            .images
            .iter()
            .map(PageImageCandidate::from_record)
            .collect::<Result<Vec<_>>>()?;
        let lead_images = record
            .lead_images
            .as_ref()
            .map(|lead| {
                lead.iter()
                    .map(PageImageCandidate::from_record)
                    .collect::<Result<Vec<_>>>()
            })
            .transpose()?;
        Ok(Self {
            namespace: record.namespace,
            title: record.title.clone(),
            images,
            lead_images,
        })
    }

    #[must_use]
    pub fn page_ref(&self) -> PageRef<'_> {
        PageRef {
            namespace: self.namespace,
            title: &self.title,
        }
    }
}

impl CandidateSource for ParsedPage {
    fn candidates(&self, scope: ExtractionScope) -> Result<Vec<PageImageCandidate>> {
        Ok(match scope {
            ExtractionScope::WholePage => self.images.clone(),
            ExtractionScope::LeadSection => match &self.lead_images {
                Some(lead) => lead.clone(),
                None => self
                    .images
                    .iter()
                    .filter(|image| image.is_lead_section())
                    .cloned()
                    .collect(),
            },
        })
    }
}

/// Scores a page's images and records the chosen page images.
pub struct LinksUpdateHandler<M> {
    scorer: ImageScorer,
    license: LicenseClassifier<M>,
}

impl<M: FileMetadataSource> LinksUpdateHandler<M> {
    pub fn new(config: ScoringConfig, metadata: M) -> Self {
        Self {
            scorer: ImageScorer::new(config),
            license: LicenseClassifier::new(metadata),
        }
    }

    fn config(&self) -> &ScoringConfig {
        self.scorer.config()
    }

    /// Images to consider: the lead section only, or the whole page,
    /// depending on `lead_section_only`.
    pub fn page_image_candidates(
        &self,
        source: &impl CandidateSource,
    ) -> Result<Vec<PageImageCandidate>> {
        let scope = if self.config().lead_section_only {
            ExtractionScope::LeadSection
        } else {
            ExtractionScope::WholePage
        };
        source.candidates(scope)
    }

    pub fn scored_candidates(&self, source: &impl CandidateSource) -> Result<Vec<ScoredImage>> {
        let candidates = self.page_image_candidates(source)?;
        Ok(candidates
            .iter()
            .enumerate()
            .map(|(position, image)| ScoredImage {
                position,
                file_name: image.file_name().to_string(),
                score: self.scorer.score(image, position),
            })
            .collect())
    }

    /// Picks the page images for `page` and writes them to `store`.
    ///
    /// Pages outside the configured namespaces and pages without images
    /// leave the store untouched.
    pub fn do_links_update(
        &self,
        page: PageRef<'_>,
        source: &impl CandidateSource,
        store: &mut impl PagePropertyStore,
    ) -> Result<PageImageProperties> {
        if !self.config().handles_namespace(page.namespace) {
            log::debug!(
                "Skipping '{}': namespace {} has no page images",
                page.title,
                page.namespace
            );
            return Ok(PageImageProperties::default());
        }

        let scored = self.scored_candidates(source)?;
        if scored.is_empty() {
            return Ok(PageImageProperties::default());
        }
        for image in &scored {
            log::debug!(
                "'{}' #{} {}: score {}",
                page.title,
                image.position,
                image.file_name,
                image.score
            );
        }

        let selected = select_page_images(
            scored.iter().map(|s| (s.file_name.as_str(), s.score)),
            self.config().selection,
            |name| self.license.is_image_free(name),
        );
        selected.write_to(store);

        if !selected.is_empty() {
            log::info!(
                "Page images for '{}': free={:?} non_free={:?}",
                page.title,
                selected.free,
                selected.non_free
            );
        }
        Ok(selected)
    }
}

/// Picks page images from `(file name, score)` pairs in document order.
///
/// A file that appears more than once keeps its best score and its first
/// position. Only positive scores qualify. Among equal scores the earliest
/// file wins. `is_free` is only asked about qualifying files.
pub fn select_page_images<'a>(
    scored: impl IntoIterator<Item = (&'a str, f64)>,
    mode: SelectionMode,
    mut is_free: impl FnMut(&str) -> bool,
) -> PageImageProperties {
    fn beats(current: Option<(&str, f64)>, score: f64) -> bool {
        current.map_or(true, |(_, best)| score > best)
    }

    let mut best: Option<(&str, f64)> = None;
    let mut best_free: Option<(&str, f64)> = None;
    let mut best_non_free: Option<(&str, f64)> = None;

    for (name, score) in best_score_per_file(scored) {
        if score <= 0.0 {
            continue;
        }
        match mode {
            SelectionMode::Partitioned => {
                let slot = if is_free(name) {
                    &mut best_free
                } else {
                    &mut best_non_free
                };
                if beats(*slot, score) {
                    *slot = Some((name, score));
                }
            }
            SelectionMode::BestOverall => {
                if beats(best, score) {
                    best = Some((name, score));
                }
                if beats(best_free, score) && is_free(name) {
                    best_free = Some((name, score));
                }
            }
        }
    }

    let free = best_free.map(|(name, _)| name);
    let non_free = match mode {
        SelectionMode::Partitioned => best_non_free.map(|(name, _)| name),
        SelectionMode::BestOverall => best.map(|(name, _)| name).filter(|name| Some(*name) != free),
    };

    PageImageProperties {
        free: free.map(str::to_string),
        non_free: non_free.map(str::to_string),
    }
}

fn best_score_per_file<'a>(
    scored: impl IntoIterator<Item = (&'a str, f64)>,
) -> Vec<(&'a str, f64)> {
    let mut files: Vec<(&str, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (name, score) in scored {
        match index.get(name) {
            Some(&idx) => files[idx].1 = files[idx].1.max(score),
            None => {
                index.insert(name, files.len());
                files.push((name, score));
            }
        }
    }
    files
}
