use crate::candidate::{PageImageCandidate, NOT_PAGE_IMAGE_CLASS};
use crate::config::ScoringConfig;
use crate::denylist::EXCLUDED_SCORE;

/// Rates how well an image represents the page it appears on.
#[derive(Clone, Debug, Default)]
pub struct ImageScorer {
    config: ScoringConfig,
}

impl ImageScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score of `image` found at `position` (0-based, document order).
    ///
    /// Sum of a width score, a position bonus and an aspect ratio score.
    /// Denylisted images and images framed as `notpageimage` get
    /// [`EXCLUDED_SCORE`] instead.
    #[must_use]
    pub fn score(&self, image: &PageImageCandidate, position: usize) -> f64 {
        if image.has_frame_class(NOT_PAGE_IMAGE_CLASS)
            || self.config.denylist.contains(image.file_name())
        {
            return EXCLUDED_SCORE;
        }

        let tables = &self.config.scores;
        let width_score = if image.handler_width() > 0 {
            tables.width.score(f64::from(image.handler_width()))
        } else {
            tables
                .gallery_image_width
                .score(f64::from(image.full_width()))
        };
        let ratio_score = tables.ratio.score(Self::scaled_ratio(image));

        width_score + tables.position_bonus(position) + ratio_score
    }

    /// Aspect ratio in tenths, truncated toward zero.
    fn scaled_ratio(image: &PageImageCandidate) -> f64 {
        (image.aspect_ratio() * 10.0).trunc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoreTables;
    use crate::denylist::Denylist;
    use crate::table::ScoreTable;

    /// Width and ratio tables that score every input `table_score`.
    fn flat_scorer(table_score: f64) -> ImageScorer {
        ImageScorer::new(ScoringConfig {
            scores: ScoreTables {
                width: ScoreTable::constant(table_score),
                gallery_image_width: ScoreTable::constant(table_score),
                ratio: ScoreTable::constant(table_score),
                ..ScoreTables::default()
            },
            denylist: Denylist::new(["denylisted.jpg"]),
            ..ScoringConfig::default()
        })
    }

    fn image(name: &str) -> PageImageCandidate {
        PageImageCandidate::new(name).unwrap()
    }

    #[test]
    fn sums_width_ratio_and_position() {
        let scorer = flat_scorer(100.0);
        let inline = image("A.jpg").with_handler_width(100);
        assert_eq!(scorer.score(&inline, 0), 100.0 + 100.0 + 8.0);

        let scorer = flat_scorer(50.0);
        let gallery = image("A.jpg").with_full_width(100);
        assert_eq!(scorer.score(&gallery, 1), 106.0);
        assert_eq!(scorer.score(&gallery, 2), 104.0);
        assert_eq!(scorer.score(&gallery, 3), 103.0);
        assert_eq!(scorer.score(&gallery, 4), 100.0);
    }

    #[test]
    fn denylisted_image_is_excluded() {
        let scorer = flat_scorer(50.0);
        let denied = image("denylisted.jpg").with_full_width(100);
        assert_eq!(scorer.score(&denied, 3), EXCLUDED_SCORE);
        assert_eq!(scorer.score(&denied, 0), EXCLUDED_SCORE);
    }

    #[test]
    fn not_page_image_frame_is_excluded() {
        let scorer = ImageScorer::default();
        let framed = image("A.jpg")
            .with_handler_width(300)
            .with_frame_class("thumb notpageimage");
        assert_eq!(scorer.score(&framed, 0), EXCLUDED_SCORE);
    }

    #[test]
    fn default_tables_prefer_landscape_inline_images() {
        let scorer = ImageScorer::default();
        // width 300 -> 10, ratio 1.5 -> 15 -> 5, position 0 -> 8
        let good = image("A.jpg").with_handler_width(300).with_full_size(1500, 1000);
        assert_eq!(scorer.score(&good, 0), 23.0);

        // icon-sized images sink below zero
        let icon = image("Icon.svg").with_handler_width(20).with_full_size(20, 20);
        assert!(scorer.score(&icon, 0) < 0.0);
    }

    #[test]
    fn unknown_dimensions_use_gallery_width_of_zero() {
        let scorer = ImageScorer::default();
        // gallery width 0 -> -100, ratio 0 -> -100
        assert_eq!(scorer.score(&image("A.jpg"), 5), -200.0);
    }
}
