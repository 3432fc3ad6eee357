use untriseptium_types::{Rect, WordRecord};

use crate::candidate::Candidate;
use crate::config::MatcherConfig;
use crate::confidence::TargetText;

/// Score every contiguous run of words inside each paragraph against the whole
/// target.
pub(crate) fn find_in_paragraphs(
    records: &[WordRecord],
    target: &str,
    config: &MatcherConfig,
) -> Vec<Candidate> {
    let target = TargetText::new(target);
    if target.is_empty() {
        return Vec::new();
    }
    let mut found = Vec::new();
    for paragraph in records.split(WordRecord::is_boundary) {
        let words: Vec<&WordRecord> = paragraph.iter().filter(|r| r.is_word()).collect();
        for start in 0..words.len() {
            let mut run = Run::new(words[start]);
            found.extend(run.score(&target, config));
            for word in &words[start + 1..] {
                run.push(word);
                found.extend(run.score(&target, config));
            }
        }
    }
    found
}

struct Run {
    text: String,
    weighted_confidence: f32,
    chars: usize,
    rect: Rect,
    words: usize,
}

impl Run {
    fn new(word: &WordRecord) -> Self {
        let chars = word.char_count();
        Self {
            text: word.text.clone(),
            weighted_confidence: word.confidence * chars as f32,
            chars,
            rect: word.rect,
            words: 1,
        }
    }

    fn push(&mut self, word: &WordRecord) {
        let chars = word.char_count();
        self.text.push(' ');
        self.text.push_str(&word.text);
        self.weighted_confidence += word.confidence * chars as f32;
        self.chars += chars;
        self.rect = self.rect.union(&word.rect);
        self.words += 1;
    }

    /// OCR confidence of the run, averaged over characters.
    fn ocr_confidence(&self) -> f32 {
        if self.chars == 0 {
            0.0
        } else {
            self.weighted_confidence / self.chars as f32
        }
    }

    fn score(&self, target: &TargetText, config: &MatcherConfig) -> Option<Candidate> {
        let confidence = target.confidence(
            &self.text,
            &self.text.to_lowercase(),
            self.ocr_confidence(),
            config.ocr_unconfidence_ratio,
        );
        (confidence >= config.confidence_threshold)
            .then(|| Candidate::new(self.text.clone(), confidence, self.rect, self.words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, confidence: f32, x: f32) -> WordRecord {
        WordRecord::new(text, confidence, Rect::from_xywh(x, 0.0, 10.0, 10.0))
    }

    fn boundary() -> WordRecord {
        WordRecord::boundary(Rect::new(0.0, 0.0, 100.0, 10.0))
    }

    #[test]
    fn finds_run_inside_paragraph() {
        let records = vec![
            boundary(),
            word("Save", 1.0, 0.0),
            word("as", 1.0, 15.0),
            word("draft", 1.0, 30.0),
        ];
        let found = find_in_paragraphs(&records, "Save as", &MatcherConfig::default());
        let best = found
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .unwrap();
        assert_eq!(best.text, "Save as");
        assert_eq!(best.confidence, 1.0);
        assert_eq!(best.rect, Rect::new(0.0, 0.0, 25.0, 10.0));
        assert_eq!(best.word_count, 2);
    }

    #[test]
    fn runs_do_not_cross_boundaries() {
        let records = vec![word("Save", 1.0, 0.0), boundary(), word("as", 1.0, 15.0)];
        let found = find_in_paragraphs(&records, "Save as", &MatcherConfig::default());
        assert!(found.iter().all(|c| c.word_count == 1));
    }

    #[test]
    fn confidence_is_weighted_by_length() {
        let run = {
            let mut run = Run::new(&word("abc", 1.0, 0.0));
            run.push(&word("d", 0.0, 15.0));
            run
        };
        assert!((run.ocr_confidence() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn zero_length_run_has_zero_confidence() {
        let run = Run::new(&WordRecord::new("", 0.9, Rect::new(0.0, 0.0, 0.0, 0.0)));
        assert_eq!(run.ocr_confidence(), 0.0);
    }

    #[test]
    fn empty_target_finds_nothing() {
        let records = vec![word("Save", 1.0, 0.0)];
        assert!(find_in_paragraphs(&records, "", &MatcherConfig::default()).is_empty());
    }
}
