use index_core::PolarityScorer;
use std::collections::{HashMap, HashSet};

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't", "wasn't", "weren't",
    "won't", "wouldn't", "couldn't", "shouldn't", "hardly", "barely", "neither", "nor", "without",
];

const NEGATION_WINDOW: usize = 3;

const STRONG_NEGATIVE: &[&str] = &[
    "war", "invasion", "attack", "attacks", "killed", "deadly", "crisis", "catastrophic",
    "collapse", "crash", "plunge", "bombing", "massacre", "devastating", "escalation",
];

const NEGATIVE: &[&str] = &[
    "tension", "tensions", "threat", "threatens", "warning", "warns", "conflict", "strike",
    "strikes", "drills", "sanctions", "fear", "fears", "risk", "risks", "decline", "drop",
    "fall", "falls", "slump", "hostile", "aggressive", "provocation", "pressure", "concern",
    "concerns", "dispute", "protest", "retaliation", "blockade", "missile", "missiles",
];

const POSITIVE: &[&str] = &[
    "talks", "dialogue", "stable", "steady", "calm", "support", "gain", "gains", "rise",
    "rises", "growth", "cooperation", "eases", "easing", "recovery", "rebound", "agree",
    "optimistic", "strong",
];

const STRONG_POSITIVE: &[&str] = &[
    "peace", "agreement", "ceasefire", "truce", "breakthrough", "deal", "rally", "surge",
    "record", "de-escalation",
];

/// Word-list polarity scorer with negation handling.
///
/// Each headline's polarity is the mean weight of its sentiment-bearing words,
/// flipped when a negation word appears within the three preceding tokens.
/// Headlines with no sentiment words are neutral.
pub struct LexiconPolarity {
    weights: HashMap<&'static str, f64>,
    negations: HashSet<&'static str>,
}

impl LexiconPolarity {
    pub fn new() -> Self {
        let mut weights = HashMap::new();
        for (words, weight) in [
            (STRONG_NEGATIVE, -1.0),
            (NEGATIVE, -0.5),
            (POSITIVE, 0.5),
            (STRONG_POSITIVE, 1.0),
        ] {
            for word in words {
                weights.insert(*word, weight);
            }
        }

        Self {
            weights,
            negations: NEGATION_WORDS.iter().copied().collect(),
        }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
            .map(|w| w.trim_matches(|c: char| c == '\'' || c == '-'))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl PolarityScorer for LexiconPolarity {
    fn polarity(&self, text: &str) -> f64 {
        let words = Self::tokens(text);

        let negation_positions: Vec<usize> = words
            .iter()
            .enumerate()
            .filter(|(_, w)| self.negations.contains(w.as_str()))
            .map(|(i, _)| i)
            .collect();

        let mut total = 0.0;
        let mut hits = 0usize;

        for (i, word) in words.iter().enumerate() {
            let Some(weight) = self.weights.get(word.as_str()) else {
                continue;
            };

            let negated = negation_positions
                .iter()
                .any(|&neg_pos| neg_pos < i && (i - neg_pos) <= NEGATION_WINDOW);

            total += if negated { -weight } else { *weight };
            hits += 1;
        }

        if hits == 0 {
            return 0.0;
        }
        (total / hits as f64).clamp(-1.0, 1.0)
    }
}

impl Default for LexiconPolarity {
    fn default() -> Self {
        Self::new()
    }
}
