//! Correction triggering: which transcript batches need AI reconstruction.
//!
//! A fixed, ordered rule table evaluated over the batch text and its
//! confidence. The first matching rule decides; no rule matching means the
//! text is appended verbatim. Evaluation is pure, so rules can be
//! enumerated one by one in tests.

use once_cell::sync::Lazy;
use regex::Regex;

/// Inputs to one rule evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub text: &'a str,
    pub confidence: f32,
    /// Confidence below which reconstruction is always requested
    pub confidence_floor: f32,
}

/// One correction rule.
pub struct Rule {
    pub name: &'static str,
    applies: fn(&RuleInput) -> bool,
}

/// The ordered rule chain. First match short-circuits.
pub static RULES: &[Rule] = &[
    Rule {
        name: "low-confidence",
        applies: |input| input.confidence < input.confidence_floor,
    },
    Rule {
        name: "filler-words",
        applies: |input| FILLER_RE.is_match(input.text),
    },
    Rule {
        name: "repeated-clause",
        applies: |input| has_repeated_clause(input.text),
    },
    Rule {
        name: "dangling-operator",
        applies: |input| DANGLING_OPERATOR_RE.is_match(input.text),
    },
    Rule {
        name: "terminator-density",
        applies: |input| has_anomalous_terminator_density(input.text),
    },
    Rule {
        name: "bare-number",
        applies: |input| has_unsupported_number(input.text),
    },
];

static FILLER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(u+m+|u+h+|er+m*|ahh+|hmm+)\b|\b(you know|i mean|sort of like|kind of like)\b")
        .expect("filler regex")
});

/// Trailing arithmetic that never finishes: "the integral equals", "x plus"
static DANGLING_OPERATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([+\-*/=^]|\b(equals|plus|minus|times|divided by|over))\s*$")
        .expect("dangling operator regex")
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("number regex"));

/// Words that make a numeric token plausible lecture content
static NUMBER_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(equals|equation|formula|percent|percentage|degrees|chapter|page|section|\
year|years|grams|meters|seconds|minutes|hours|dollars|times|squared|cubed|step|figure|\
problem|question|number)\b|[%=°$]",
    )
    .expect("number context regex")
});

/// Decide whether `text` should be sent for reconstruction.
pub fn needs_correction(text: &str, confidence: f32, confidence_floor: f32) -> bool {
    matching_rule(text, confidence, confidence_floor).is_some()
}

/// Name of the first rule that matches, for diagnostics.
///
/// Empty or whitespace-only text never triggers any rule.
pub fn matching_rule(text: &str, confidence: f32, confidence_floor: f32) -> Option<&'static str> {
    if text.trim().is_empty() {
        return None;
    }

    let input = RuleInput {
        text,
        confidence,
        confidence_floor,
    };
    RULES
        .iter()
        .find(|rule| (rule.applies)(&input))
        .map(|rule| rule.name)
}

/// Consecutive duplicated words or duplicated word pairs, the classic
/// stutter pattern in partial transcripts ("we have we have the").
fn has_repeated_clause(text: &str) -> bool {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    let doubled_word = words
        .windows(2)
        .any(|pair| pair[0] == pair[1] && pair[0].len() > 1);

    let doubled_pair = words
        .windows(4)
        .any(|quad| quad[0] == quad[2] && quad[1] == quad[3]);

    doubled_word || doubled_pair
}

/// Sentence terminators far denser than the word count warrants.
fn has_anomalous_terminator_density(text: &str) -> bool {
    let terminators = text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();
    let words = text.split_whitespace().count();
    words > 0 && terminators >= 2 && terminators * 4 > words
}

/// Numeric tokens with no supporting domain context nearby.
fn has_unsupported_number(text: &str) -> bool {
    NUMBER_RE.is_match(text) && !NUMBER_CONTEXT_RE.is_match(text)
}
