use strsim::levenshtein;

/// A match target with its case-folded form precomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetText {
    text: String,
    folded: String,
    len: usize,
}

impl TargetText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let folded = text.to_lowercase();
        let len = text.chars().count();
        Self { text, folded, len }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Share of the target that survives the edit distance to `ocr_text`.
    ///
    /// The distance is the mean of the case-sensitive and case-insensitive
    /// Levenshtein distances, normalized by the target length and floored at 0.
    pub fn similarity(&self, ocr_text: &str, ocr_folded: &str) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        let exact = levenshtein(ocr_text, &self.text) as f32;
        let folded = levenshtein(ocr_folded, &self.folded) as f32;
        let distance = (exact + folded) / 2.0;
        let len = self.len as f32;
        ((len - distance) / len).max(0.0)
    }

    /// Match confidence of OCR text recognized with `ocr_confidence`.
    ///
    /// Matching characters count with the OCR confidence; mismatching characters
    /// are partially forgiven in proportion to how unsure the OCR was, scaled by
    /// `unconfidence_ratio`.
    pub fn confidence(
        &self,
        ocr_text: &str,
        ocr_folded: &str,
        ocr_confidence: f32,
        unconfidence_ratio: f32,
    ) -> f32 {
        if self.len == 0 {
            return 0.0;
        }
        let similarity = self.similarity(ocr_text, ocr_folded);
        let confidence = ocr_confidence.clamp(0.0, 1.0);
        let forgiven = (1.0 - similarity) * (1.0 - confidence) * unconfidence_ratio;
        (similarity * confidence + forgiven).clamp(0.0, 1.0)
    }
}

pub fn text_similarity(ocr_text: &str, target: &str) -> f32 {
    TargetText::new(target).similarity(ocr_text, &ocr_text.to_lowercase())
}

pub fn text_confidence(
    ocr_text: &str,
    ocr_confidence: f32,
    target: &str,
    unconfidence_ratio: f32,
) -> f32 {
    TargetText::new(target).confidence(
        ocr_text,
        &ocr_text.to_lowercase(),
        ocr_confidence,
        unconfidence_ratio,
    )
}
