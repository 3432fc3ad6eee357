use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use untriseptium_matcher::Candidate;
use untriseptium_types::Rect;

/// Serializable view of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateReport {
    pub text: String,
    pub confidence: f32,
    pub rect: Rect,
    pub center: [f32; 2],
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_confidence: Option<f32>,
}

impl From<&Candidate> for CandidateReport {
    fn from(candidate: &Candidate) -> Self {
        let (x, y) = candidate.center();
        Self {
            text: candidate.text.clone(),
            confidence: candidate.confidence,
            rect: candidate.rect,
            center: [x, y],
            word_count: candidate.word_count,
            location_confidence: candidate.location_confidence,
            color_confidence: candidate.color_confidence,
        }
    }
}

impl fmt::Display for CandidateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}\t{}\t{}", self.confidence, self.text, self.rect)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub image: PathBuf,
    pub target: String,
    pub preset: &'static str,
    pub strategy: &'static str,
    pub candidates: Vec<CandidateReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicked: Option<[f32; 2]>,
}

impl SearchReport {
    pub fn to_json(&self, pretty: bool) -> Result<String, serde_json::Error> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SearchReport {
        let rect = Rect::new(10.0, 20.0, 70.0, 40.0);
        let mut candidate = Candidate::new("Save as".into(), 0.875, rect, 2);
        candidate.location_confidence = Some(0.5);
        SearchReport {
            image: PathBuf::from("shot.png"),
            target: "Save as".into(),
            preset: "default",
            strategy: "paragraphs",
            candidates: vec![CandidateReport::from(&candidate)],
            clicked: None,
        }
    }

    #[test]
    fn line_format_shows_confidence_text_and_rect() {
        let report = report();
        assert_eq!(
            report.candidates[0].to_string(),
            "0.875\tSave as\t(10 20 70 40)"
        );
    }

    #[test]
    fn json_skips_missing_hints() {
        let json: serde_json::Value =
            serde_json::from_str(&report().to_json(false).unwrap()).unwrap();
        let candidate = &json["candidates"][0];
        assert_eq!(candidate["center"], serde_json::json!([40.0, 30.0]));
        assert_eq!(candidate["location_confidence"], serde_json::json!(0.5));
        assert!(candidate.get("color_confidence").is_none());
        assert!(json.get("clicked").is_none());
    }
}
