use tracing::debug;
use untriseptium_types::WordRecord;

use crate::align::{find_by_characters, find_by_words};
use crate::candidate::Candidate;
use crate::config::{MatchStrategy, MatcherConfig, MatcherConfigError};
use crate::paragraph::find_in_paragraphs;

/// Locates a target string in OCR word records with one configured strategy.
#[derive(Debug, Clone, Default)]
pub struct TextMatcher {
    config: MatcherConfig,
}

impl TextMatcher {
    pub fn new(config: MatcherConfig) -> Result<Self, MatcherConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Candidate spans for `target`, best first.
    ///
    /// Candidates below the confidence threshold are dropped. Ties keep the
    /// order in which the spans were found.
    pub fn find_texts(&self, records: &[WordRecord], target: &str) -> Vec<Candidate> {
        if target.trim().is_empty() || records.is_empty() {
            return Vec::new();
        }
        let mut candidates = match self.config.strategy {
            MatchStrategy::Words => find_by_words(records, target, &self.config),
            MatchStrategy::Characters => find_by_characters(records, target, &self.config),
            MatchStrategy::Paragraphs => find_in_paragraphs(records, target, &self.config),
        };
        candidates.retain(|candidate| candidate.confidence >= self.config.confidence_threshold);
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        debug!(
            strategy = %self.config.strategy,
            records = records.len(),
            candidates = candidates.len(),
            best = candidates.first().map(|c| c.confidence),
            "matched target"
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use untriseptium_types::Rect;

    use super::*;

    fn line(words: &[(&str, f32)]) -> Vec<WordRecord> {
        let mut x = 0.0;
        let mut records = vec![WordRecord::boundary(Rect::new(0.0, 0.0, 500.0, 12.0))];
        for (text, confidence) in words {
            let width = 8.0 * text.chars().count() as f32;
            let rect = Rect::from_xywh(x, 0.0, width, 12.0);
            records.push(WordRecord::new(*text, *confidence, rect));
            x += width + 6.0;
        }
        records
    }

    fn matcher(strategy: MatchStrategy) -> TextMatcher {
        TextMatcher::new(MatcherConfig {
            strategy,
            ..MatcherConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let config = MatcherConfig {
            confidence_threshold: -0.1,
            ..MatcherConfig::default()
        };
        assert!(TextMatcher::new(config).is_err());
    }

    #[test]
    fn every_strategy_finds_an_exact_phrase() {
        let records = line(&[("Open", 0.95), ("recent", 0.9), ("files", 0.92)]);
        for strategy in MatchStrategy::ALL {
            let found = matcher(strategy).find_texts(&records, "recent files");
            assert_eq!(found[0].text, "recent files", "{strategy}");
            assert_eq!(found[0].word_count, 2, "{strategy}");
        }
    }

    #[test]
    fn results_are_sorted_best_first() {
        let records = line(&[("Cancel", 0.9), ("Cancol", 0.9), ("Canc", 0.9)]);
        for strategy in MatchStrategy::ALL {
            let found = matcher(strategy).find_texts(&records, "Cancel");
            assert!(!found.is_empty());
            assert!(
                found
                    .windows(2)
                    .all(|pair| pair[0].confidence >= pair[1].confidence)
            );
            assert_eq!(found[0].text, "Cancel");
        }
    }

    #[test]
    fn blank_target_or_no_records_yield_nothing() {
        let records = line(&[("Open", 0.95)]);
        let matcher = TextMatcher::default();
        assert!(matcher.find_texts(&records, "   ").is_empty());
        assert!(matcher.find_texts(&[], "Open").is_empty());
    }
}
