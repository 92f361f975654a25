//! The extract boundary.
//!
//! Each source integrates its own `Extractor` that turns raw content into
//! observed entities and facet sets; the core is parametric over it. The
//! crate ships one generic implementation, `PatternExtractor`, which covers
//! the common monitor shape: regex-derived facets (guideline codes, PDF
//! links) with one facet optionally promoted to entities.

use std::collections::BTreeSet;

use regex::Regex;

use crate::entity::ObservedEntity;
use crate::error::ExtractError;
use crate::fetch::RawContent;
use crate::fingerprint::FacetMap;

/// What an extractor produced from one fetch.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Discrete entities observed in the content.
    pub entities: Vec<ObservedEntity>,

    /// Named, order-independent facet sets.
    pub facets: FacetMap,

    /// Full text for line-level diffing, when the source tracks it.
    pub full_text: Option<String>,
}

/// Turns raw content into entities and facets.
pub trait Extractor: Send + Sync {
    /// Extracts from the fetched content.
    ///
    /// Failures on malformed content are reported, not swallowed: the
    /// monitor check for the target fails for this cycle and the prior
    /// snapshot is left untouched.
    fn extract(&self, content: &RawContent) -> Result<Extraction, ExtractError>;
}

/// One regex-derived facet.
#[derive(Debug, Clone)]
pub struct FacetRule {
    /// Facet name (e.g. `links`, `codes`).
    pub facet: String,

    /// Pattern whose matches form the facet set. Capture group 1 is used
    /// when present, otherwise the whole match.
    pub pattern: Regex,
}

impl FacetRule {
    /// Creates a facet rule, compiling the pattern.
    pub fn new(facet: impl Into<String>, pattern: &str) -> Result<Self, ExtractError> {
        let facet = facet.into();
        let pattern = Regex::new(pattern).map_err(|e| ExtractError::Pattern {
            facet: facet.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self { facet, pattern })
    }
}

/// Generic regex-based extractor.
///
/// Matches each rule against the text, collecting matches into unordered
/// facet sets capped at `max_matches` values per facet. One facet may be
/// designated the entity facet; its values become `ObservedEntity`s with
/// `id == label == match`.
pub struct PatternExtractor {
    rules: Vec<FacetRule>,
    entity_facet: Option<String>,
    track_full_text: bool,
    max_matches: usize,
}

impl PatternExtractor {
    /// Default per-facet match cap.
    pub const DEFAULT_MAX_MATCHES: usize = 50;

    /// Creates an extractor from facet rules.
    #[must_use]
    pub fn new(rules: Vec<FacetRule>) -> Self {
        Self {
            rules,
            entity_facet: None,
            track_full_text: false,
            max_matches: Self::DEFAULT_MAX_MATCHES,
        }
    }

    /// Promotes the named facet's values to observed entities.
    #[must_use]
    pub fn with_entity_facet(mut self, facet: impl Into<String>) -> Self {
        self.entity_facet = Some(facet.into());
        self
    }

    /// Carries the full fetched text into snapshots for line diffing.
    #[must_use]
    pub fn with_full_text(mut self) -> Self {
        self.track_full_text = true;
        self
    }

    /// Overrides the per-facet match cap.
    #[must_use]
    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches;
        self
    }
}

impl Extractor for PatternExtractor {
    fn extract(&self, content: &RawContent) -> Result<Extraction, ExtractError> {
        if content.text.trim().is_empty() {
            return Err(ExtractError::NoContent);
        }

        let mut facets = FacetMap::new();
        for rule in &self.rules {
            let mut values = BTreeSet::new();
            for caps in rule.pattern.captures_iter(&content.text) {
                let m = caps.get(1).or_else(|| caps.get(0));
                if let Some(m) = m {
                    values.insert(m.as_str().to_string());
                    if values.len() >= self.max_matches {
                        break;
                    }
                }
            }
            facets.insert(rule.facet.clone(), values);
        }

        let entities = match &self.entity_facet {
            Some(name) => facets
                .get(name)
                .map(|values| {
                    values
                        .iter()
                        .map(|v| ObservedEntity::new(v.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(Extraction {
            entities,
            facets,
            full_text: self.track_full_text.then(|| content.text.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe.
    fn _assert_extractor_object_safe(_: &dyn Extractor) {}

    const PDF_PATTERN: &str = r#"https?://[^\s"'<>]+\.pdf"#;

    #[test]
    fn test_pdf_links_and_guideline_codes() {
        let extractor = PatternExtractor::new(vec![
            FacetRule::new("links", PDF_PATTERN).unwrap(),
            FacetRule::new("codes", r"\bQ\d+[A-Z]?\b").unwrap(),
        ])
        .with_entity_facet("links");

        let page = r"Guideline Q2 revised, see https://ich.org/q2r2.pdf
             and Q14 at https://ich.org/q14.pdf";
        let extraction = extractor.extract(&RawContent::text(page)).unwrap();

        assert_eq!(extraction.facets["links"].len(), 2);
        assert_eq!(
            extraction.facets["codes"],
            BTreeSet::from(["Q2".to_string(), "Q14".to_string()])
        );
        assert_eq!(extraction.entities.len(), 2);
        assert!(extraction
            .entities
            .iter()
            .any(|e| e.id == "https://ich.org/q2r2.pdf"));
        assert!(extraction.full_text.is_none());
    }

    #[test]
    fn test_capture_group_is_preferred() {
        let extractor =
            PatternExtractor::new(vec![
                FacetRule::new("links", r#"href="([^"]+)""#).unwrap()
            ]);

        let extraction = extractor
            .extract(&RawContent::text(r#"<a href="/doc/a.pdf">A</a>"#))
            .unwrap();
        assert_eq!(
            extraction.facets["links"],
            BTreeSet::from(["/doc/a.pdf".to_string()])
        );
    }

    #[test]
    fn test_match_cap_bounds_facet_size() {
        let extractor = PatternExtractor::new(vec![FacetRule::new("nums", r"\d+").unwrap()])
            .with_max_matches(3);

        let text: String = (0..100).map(|i| format!("{i} ")).collect();
        let extraction = extractor.extract(&RawContent::text(text)).unwrap();
        assert_eq!(extraction.facets["nums"].len(), 3);
    }

    #[test]
    fn test_empty_content_is_an_error() {
        let extractor = PatternExtractor::new(vec![]);
        let err = extractor.extract(&RawContent::text("   \n  ")).unwrap_err();
        assert!(matches!(err, ExtractError::NoContent));
    }

    #[test]
    fn test_full_text_tracking() {
        let extractor = PatternExtractor::new(vec![]).with_full_text();
        let extraction = extractor.extract(&RawContent::text("body text")).unwrap();
        assert_eq!(extraction.full_text.as_deref(), Some("body text"));
    }

    #[test]
    fn test_invalid_pattern_reports_facet() {
        let err = FacetRule::new("links", "[unclosed").unwrap_err();
        assert!(matches!(err, ExtractError::Pattern { ref facet, .. } if facet == "links"));
    }

    #[test]
    fn test_duplicate_matches_collapse() {
        let extractor =
            PatternExtractor::new(vec![FacetRule::new("links", PDF_PATTERN).unwrap()]);
        let page = "https://x.org/a.pdf then again https://x.org/a.pdf";
        let extraction = extractor.extract(&RawContent::text(page)).unwrap();
        assert_eq!(extraction.facets["links"].len(), 1);
    }
}
