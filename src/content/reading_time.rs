//! Reading time estimate

use serde::Serialize;

const WORDS_PER_MINUTE: f64 = 200.0;

/// Estimated reading time of a text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingTime {
    pub words: usize,
    pub minutes: f64,
    /// Display form, e.g. `3 min read`
    pub text: String,
}

impl ReadingTime {
    pub fn of(text: &str) -> Self {
        let words = count_words(text);
        let minutes = words as f64 / WORDS_PER_MINUTE;
        // Minutes are rounded to two decimals before taking the ceiling
        let displayed = ((minutes * 100.0).round() / 100.0).ceil() as u64;
        Self {
            words,
            minutes,
            text: format!("{} min read", displayed),
        }
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'
        | '\u{3400}'..='\u{4DBF}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{3040}'..='\u{30FF}'
        | '\u{AC00}'..='\u{D7AF}')
}

/// Count words: every CJK character is a word, otherwise whitespace-separated runs
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if is_cjk(c) {
            count += 1;
            in_word = false;
        } else if c.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            count += 1;
        }
    }

    count
}
