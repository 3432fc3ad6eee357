use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// How candidate spans are assembled from OCR words.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    /// Align OCR words against the space-separated words of the target.
    Words,
    /// Align OCR words against arbitrary substrings of the target.
    Characters,
    /// Score every contiguous run of words inside a paragraph.
    #[default]
    Paragraphs,
}

impl MatchStrategy {
    pub const ALL: [MatchStrategy; 3] = [
        MatchStrategy::Words,
        MatchStrategy::Characters,
        MatchStrategy::Paragraphs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::Words => "words",
            MatchStrategy::Characters => "characters",
            MatchStrategy::Paragraphs => "paragraphs",
        }
    }
}

impl FromStr for MatchStrategy {
    type Err = MatcherConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "words" | "word" => Ok(MatchStrategy::Words),
            "characters" | "chars" | "char" => Ok(MatchStrategy::Characters),
            "paragraphs" | "paragraph" | "para" => Ok(MatchStrategy::Paragraphs),
            other => Err(MatcherConfigError::UnknownStrategy {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named pairing of an OCR language and a match strategy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub language: &'static str,
    pub strategy: MatchStrategy,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::new("default", "eng", MatchStrategy::Paragraphs),
        Preset::new("en", "eng", MatchStrategy::Paragraphs),
        Preset::new("words", "eng", MatchStrategy::Words),
        Preset::new("ja", "jpn", MatchStrategy::Paragraphs),
        Preset::new("ja-chars", "jpn", MatchStrategy::Characters),
        Preset::new("zh", "chi_sim", MatchStrategy::Characters),
    ];

    const fn new(name: &'static str, language: &'static str, strategy: MatchStrategy) -> Self {
        Self {
            name,
            language,
            strategy,
        }
    }

    pub fn lookup(name: &str) -> Result<Preset, MatcherConfigError> {
        let wanted = name.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name == wanted)
            .ok_or(MatcherConfigError::UnknownPreset { name: wanted })
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self::ALL[0]
    }
}

/// Tunables shared by every strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherConfig {
    /// Candidates (and, for aligned strategies, single word matches) scoring
    /// below this are dropped.
    pub confidence_threshold: f32,
    /// Weight of the credit given to mismatching characters in words the OCR
    /// engine was unsure about. When it reaches `confidence_threshold`, every
    /// ambiguous word matches.
    pub ocr_unconfidence_ratio: f32,
    pub strategy: MatchStrategy,
    /// Let partial alignments lose priority as the scan moves away from them.
    pub carry_decay: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.2,
            ocr_unconfidence_ratio: 0.4,
            strategy: MatchStrategy::default(),
            carry_decay: true,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), MatcherConfigError> {
        check_unit("confidence_threshold", self.confidence_threshold)?;
        check_unit("ocr_unconfidence_ratio", self.ocr_unconfidence_ratio)?;
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), MatcherConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(MatcherConfigError::OutOfRange { field, value })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatcherConfigError {
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange { field: &'static str, value: f32 },
    #[error("unknown match strategy '{name}' (expected words, characters, or paragraphs)")]
    UnknownStrategy { name: String },
    #[error("unknown preset '{name}'")]
    UnknownPreset { name: String },
}
