//! Bold markers around matched spans.
//!
//! Only `<b>`/`</b>` are inserted; the rest of the text is passed through
//! byte-for-byte. Escaping the surrounding text is the caller's job.

use std::ops::Range;

use regex::RegexBuilder;
use smallvec::SmallVec;

use crate::matcher::word_regex;

pub type Spans = SmallVec<[Range<usize>; 4]>;

/// Byte ranges of whole-word, case-insensitive occurrences of `term`.
pub fn word_spans(text: &str, term: &str) -> Spans {
    let term = term.trim();
    if term.is_empty() || text.is_empty() { return Spans::new(); }
    match word_regex(term) {
        Some(re) => re.find_iter(text).map(|m| m.range()).collect(),
        None => Spans::new(),
    }
}

/// Byte ranges of any whitespace-separated word of `term`, matched as substrings.
pub fn any_word_spans(text: &str, term: &str) -> Spans {
    let words: Vec<String> = term.split_whitespace().map(regex::escape).collect();
    if words.is_empty() || text.is_empty() { return Spans::new(); }
    let Ok(re) = RegexBuilder::new(&format!("({})", words.join("|"))).case_insensitive(true).build() else {
        return Spans::new();
    };
    re.find_iter(text).filter(|m| !m.is_empty()).map(|m| m.range()).collect()
}

/// Wrap whole-word occurrences of `term` in `<b>`.
pub fn highlight(text: &str, term: &str) -> String {
    wrap(text, &word_spans(text, term))
}

/// Wrap occurrences of every word in `term` in `<b>`.
pub fn highlight_words(text: &str, term: &str) -> String {
    wrap(text, &any_word_spans(text, term))
}

fn wrap(text: &str, spans: &[Range<usize>]) -> String {
    if spans.is_empty() { return text.to_string(); }
    let mut out = String::with_capacity(text.len() + spans.len() * 7);
    let mut at = 0usize;
    for span in spans {
        out.push_str(&text[at..span.start]);
        out.push_str("<b>");
        out.push_str(&text[span.clone()]);
        out.push_str("</b>");
        at = span.end;
    }
    out.push_str(&text[at..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_term_is_whole_word() {
        assert_eq!(highlight("Apple and apple pie", "apple"), "<b>Apple</b> and <b>apple</b> pie");
        assert_eq!(highlight("Pineapple", "apple"), "Pineapple");
        assert_eq!(highlight("Apple", "  "), "Apple");
        assert_eq!(highlight("", "apple"), "");
    }

    #[test]
    fn multi_word_is_substring() {
        assert_eq!(highlight_words("Green Pineapple", "apple green"), "<b>Green</b> Pine<b>apple</b>");
        assert_eq!(highlight_words("abc", ""), "abc");
    }

    #[test]
    fn inserted_markup_is_not_escaped_and_text_is_untouched() {
        assert_eq!(highlight("<i>x</i> tag", "tag"), "<i>x</i> <b>tag</b>");
        assert_eq!(highlight_words("a.b a+b", "a.b"), "<b>a.b</b> a+b");
    }

    #[test]
    fn spans_are_byte_ranges() {
        let s = word_spans("héllo world", "world");
        assert_eq!(s.as_slice(), &[7..12]);
    }
}
