//! Classification of a condition call's text into a boolean.
//!
//! Rule: the text is lowercased and split into words; the first decisive word
//! wins. Affirmative words select `true`; negative or negating words select
//! `false`. Text with no decisive word is `false`. So "not true" is false
//! (the negation comes first) and "The answer is: TRUE." is true. Curly
//! apostrophes count as `'`, so "isn’t" is one negating word.

use std::sync::LazyLock;

use regex::Regex;

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9]+(?:'[a-z]+)?").expect("static word pattern is valid")
});

const AFFIRMATIVE: &[&str] = &["true", "yes", "y", "affirmative", "correct", "1"];

const NEGATIVE: &[&str] = &[
    "false", "no", "n", "not", "never", "incorrect", "negative", "0", "isn't", "aren't",
    "wasn't", "don't", "doesn't", "cannot", "can't", "untrue", "nope",
];

/// Decide which branch a condition response selects.
pub fn evaluate_condition(text: &str) -> bool {
    let lowered = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    for word in WORD.find_iter(&lowered).map(|m| m.as_str()) {
        if AFFIRMATIVE.contains(&word) {
            return true;
        }
        if NEGATIVE.contains(&word) {
            return false;
        }
    }
    false
}
