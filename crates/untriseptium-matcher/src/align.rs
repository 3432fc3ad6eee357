//! Incremental alignment of OCR words against pieces of the target.
//!
//! States are positions in the target: state `i` means the target has been
//! matched up to boundary `i`. A transition consumes one OCR word and moves from
//! one boundary to a later one when the word resembles the piece of target in
//! between. Partial spans are kept in an append-only arena; states only hold the
//! index of their latest node, so extending a span never copies it.

use untriseptium_types::{Rect, WordRecord};

use crate::candidate::Candidate;
use crate::config::MatcherConfig;
use crate::confidence::TargetText;

struct Transition {
    from: usize,
    to: usize,
    target: TargetText,
}

/// Transitions for the whitespace-separated words of `target`.
fn word_transitions(target: &str) -> (Vec<Transition>, usize) {
    let transitions: Vec<Transition> = target
        .split_whitespace()
        .enumerate()
        .map(|(idx, word)| Transition {
            from: idx,
            to: idx + 1,
            target: TargetText::new(word),
        })
        .collect();
    let states = transitions.len() + 1;
    (transitions, states)
}

/// Transitions for every substring of `target` cut at char boundaries.
fn character_transitions(target: &str) -> (Vec<Transition>, usize) {
    let chars: Vec<char> = target.chars().collect();
    let mut transitions = Vec::new();
    for start in 0..chars.len() {
        for end in start + 1..=chars.len() {
            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if piece.is_empty() {
                continue;
            }
            transitions.push(Transition {
                from: start,
                to: end,
                target: TargetText::new(piece),
            });
        }
    }
    (transitions, chars.len() + 1)
}

pub(crate) fn find_by_words(
    records: &[WordRecord],
    target: &str,
    config: &MatcherConfig,
) -> Vec<Candidate> {
    let (transitions, states) = word_transitions(target);
    align(records, &transitions, states, config)
}

pub(crate) fn find_by_characters(
    records: &[WordRecord],
    target: &str,
    config: &MatcherConfig,
) -> Vec<Candidate> {
    let (transitions, states) = character_transitions(target);
    align(records, &transitions, states, config)
}

struct SpanNode {
    parent: Option<usize>,
    word: usize,
    rect: Rect,
    /// Length of the space-joined span text.
    chars: usize,
}

#[derive(Clone, Copy)]
struct State {
    confidence: f32,
    node: Option<usize>,
}

impl State {
    const START: State = State {
        confidence: 1.0,
        node: None,
    };
    const EMPTY: State = State {
        confidence: 0.0,
        node: None,
    };
}

struct Arena<'r> {
    records: &'r [WordRecord],
    nodes: Vec<SpanNode>,
}

impl<'r> Arena<'r> {
    fn new(records: &'r [WordRecord]) -> Self {
        Self {
            records,
            nodes: Vec::new(),
        }
    }

    fn extend(&mut self, parent: Option<usize>, word: usize) -> usize {
        let record = &self.records[word];
        let (rect, chars) = match parent {
            Some(idx) => {
                let node = &self.nodes[idx];
                (
                    node.rect.union(&record.rect),
                    node.chars + 1 + record.char_count(),
                )
            }
            None => (record.rect, record.char_count()),
        };
        self.nodes.push(SpanNode {
            parent,
            word,
            rect,
            chars,
        });
        self.nodes.len() - 1
    }

    /// Confidence of appending `word` to the span held by `prior`.
    ///
    /// A gap wider than the estimated character width between the span and the
    /// word is penalized with a Gaussian falloff in units of that width.
    fn link_confidence(&self, prior: State, word: usize, local: f32) -> f32 {
        let mut confidence = prior.confidence * local;
        let Some(idx) = prior.node else {
            return confidence;
        };
        let node = &self.nodes[idx];
        let record = &self.records[word];
        let chars = node.chars + record.char_count();
        if chars == 0 {
            return confidence;
        }
        let char_size = (node.rect.diagonal() + record.rect.diagonal()) / chars as f32;
        let gap = node.rect.distance_to(&record.rect);
        if char_size > 0.0 && gap > char_size {
            let excess = (gap - char_size) / char_size;
            confidence *= (-excess * excess).exp();
        }
        confidence
    }

    /// Confidence of a stored state as seen from a word at `current`.
    ///
    /// Spans farther from the scan position than their own diagonal lose
    /// priority with the same Gaussian falloff.
    fn carried_confidence(&self, state: State, current: &Rect) -> f32 {
        let Some(idx) = state.node else {
            return state.confidence;
        };
        let node = &self.nodes[idx];
        let size = node.rect.diagonal();
        let gap = node.rect.distance_to(current);
        if size > 0.0 && gap > size {
            let excess = (gap - size) / size;
            state.confidence * (-excess * excess).exp()
        } else {
            state.confidence
        }
    }

    fn candidate(&self, state: State) -> Option<Candidate> {
        let mut idx = state.node?;
        let mut words = Vec::new();
        loop {
            let node = &self.nodes[idx];
            words.push(node.word);
            match node.parent {
                Some(parent) => idx = parent,
                None => break,
            }
        }
        let node = &self.nodes[state.node?];
        let text = words
            .iter()
            .rev()
            .map(|&word| self.records[word].text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Some(Candidate::new(
            text,
            state.confidence,
            node.rect,
            words.len(),
        ))
    }
}

fn align(
    records: &[WordRecord],
    transitions: &[Transition],
    states: usize,
    config: &MatcherConfig,
) -> Vec<Candidate> {
    if transitions.is_empty() {
        return Vec::new();
    }
    let final_state = states - 1;
    let mut arena = Arena::new(records);
    let mut current = vec![State::EMPTY; states];
    current[0] = State::START;
    let mut completed = Vec::new();

    for (word, record) in records.iter().enumerate() {
        if !record.is_word() {
            continue;
        }
        let folded = record.text.to_lowercase();
        let mut next = vec![State::EMPTY; states];
        next[0] = State::START;
        let mut reached_end = false;

        for transition in transitions {
            let prior = current[transition.from];
            if prior.confidence <= 0.0 {
                continue;
            }
            let local = transition.target.confidence(
                &record.text,
                &folded,
                record.confidence,
                config.ocr_unconfidence_ratio,
            );
            if local < config.confidence_threshold {
                continue;
            }
            let confidence = arena.link_confidence(prior, word, local);
            if confidence > next[transition.to].confidence {
                let node = arena.extend(prior.node, word);
                next[transition.to] = State {
                    confidence,
                    node: Some(node),
                };
                reached_end |= transition.to == final_state;
            }
        }

        if reached_end {
            completed.push(next[final_state]);
        }

        for (slot, fresh) in current.iter_mut().zip(&next) {
            let carried = if config.carry_decay {
                arena.carried_confidence(*slot, &record.rect)
            } else {
                slot.confidence
            };
            if fresh.confidence > carried {
                *slot = *fresh;
            }
        }
    }

    completed
        .into_iter()
        .filter_map(|state| arena.candidate(state))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f32) -> WordRecord {
        WordRecord::new(text, 1.0, Rect::from_xywh(x, 0.0, 10.0 * text.len() as f32, 10.0))
    }

    #[test]
    fn word_transitions_follow_target_words() {
        let (transitions, states) = word_transitions("open  the file");
        assert_eq!(states, 4);
        let pieces: Vec<_> = transitions.iter().map(|t| t.target.as_str()).collect();
        assert_eq!(pieces, ["open", "the", "file"]);
    }

    #[test]
    fn character_transitions_cover_every_substring() {
        let (transitions, states) = character_transitions("abc");
        assert_eq!(states, 4);
        assert_eq!(transitions.len(), 6);
        let (transitions, _) = character_transitions("a b");
        assert!(transitions.iter().all(|t| !t.target.as_str().starts_with(' ')));
        assert!(transitions.iter().any(|t| t.from == 0 && t.to == 2));
    }

    #[test]
    fn adjacent_words_align_without_penalty() {
        let records = vec![word("open", 0.0), word("file", 45.0)];
        let found = find_by_words(&records, "open file", &MatcherConfig::default());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "open file");
        assert_eq!(found[0].confidence, 1.0);
        assert_eq!(found[0].word_count, 2);
        assert_eq!(found[0].rect, Rect::new(0.0, 0.0, 85.0, 10.0));
    }

    #[test]
    fn distant_words_are_penalized() {
        let near = vec![word("open", 0.0), word("file", 45.0)];
        let far = vec![word("open", 0.0), word("file", 60.0)];
        let config = MatcherConfig {
            confidence_threshold: 0.0,
            ..MatcherConfig::default()
        };
        let near = find_by_words(&near, "open file", &config);
        let far = find_by_words(&far, "open file", &config);
        assert!(far[0].confidence < near[0].confidence);
    }

    #[test]
    fn boundaries_and_empty_words_are_skipped() {
        let records = vec![
            word("open", 0.0),
            WordRecord::boundary(Rect::new(0.0, 0.0, 1.0, 1.0)),
            WordRecord::new("", 0.9, Rect::new(42.0, 0.0, 44.0, 10.0)),
            word("file", 45.0),
        ];
        let found = find_by_words(&records, "open file", &MatcherConfig::default());
        assert_eq!(found[0].text, "open file");
    }

    #[test]
    fn empty_target_finds_nothing() {
        let records = vec![word("open", 0.0)];
        assert!(find_by_words(&records, "  ", &MatcherConfig::default()).is_empty());
        assert!(find_by_characters(&records, "", &MatcherConfig::default()).is_empty());
    }

    #[test]
    fn fresh_partial_match_replaces_stale_one() {
        // A lone "open" far to the left, then "open file" together on the right.
        let records = vec![word("open", 0.0), word("open", 1000.0), word("file", 1045.0)];
        let found = find_by_words(&records, "open file", &MatcherConfig::default());
        assert_eq!(found[0].rect.x0, 1000.0);
        assert_eq!(found[0].confidence, 1.0);
    }

    #[test]
    fn without_carry_decay_the_first_partial_match_is_kept() {
        let records = vec![word("open", 0.0), word("open", 90.0), word("file", 135.0)];
        let decaying = find_by_words(&records, "open file", &MatcherConfig::default());
        assert_eq!(decaying.len(), 1);
        assert_eq!(decaying[0].rect.x0, 90.0);
        assert_eq!(decaying[0].confidence, 1.0);

        let config = MatcherConfig {
            carry_decay: false,
            ..MatcherConfig::default()
        };
        let kept = find_by_words(&records, "open file", &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rect.x0, 0.0);
        assert!(kept[0].confidence > 0.0 && kept[0].confidence < 0.5);
    }
}
