//! Character n-gram extraction for fuzzy text search
//!
//! N-grams are windows of `n` consecutive characters. Windows are counted in
//! Unicode scalar values, not bytes, so multi-byte text never splits a
//! character. No case folding or other normalization is applied.

use rustc_hash::FxHashMap;
use std::iter::FusedIterator;

/// Default gram size used by the index
pub const TRIGRAM: usize = 3;

/// Iterator over the n-grams of a string, left to right
///
/// Each yielded item borrows from the input text.
#[derive(Debug, Clone)]
pub struct Ngrams<'a> {
    text: &'a str,
    // Byte offset where the current window starts
    start: usize,
    // Byte offset one past the current window, `None` once exhausted
    end: Option<usize>,
    remaining: usize,
}

impl<'a> Ngrams<'a> {
    pub fn new(text: &'a str, n: usize) -> Self {
        let char_len = text.chars().count();

        if n == 0 || char_len < n {
            return Self {
                text,
                start: 0,
                end: None,
                remaining: 0,
            };
        }

        let end = text
            .char_indices()
            .nth(n)
            .map(|(offset, _)| offset)
            .unwrap_or(text.len());

        Self {
            text,
            start: 0,
            end: Some(end),
            remaining: char_len - n + 1,
        }
    }

    /// Byte length of the character starting at `offset`
    #[inline]
    fn char_width_at(&self, offset: usize) -> usize {
        self.text[offset..].chars().next().map_or(0, char::len_utf8)
    }
}

impl<'a> Iterator for Ngrams<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.end?;
        let gram = &self.text[self.start..end];

        self.remaining -= 1;
        if self.remaining == 0 {
            self.end = None;
        } else {
            // A following window exists, so there is a character at `end`
            self.start += self.char_width_at(self.start);
            self.end = Some(end + self.char_width_at(end));
        }

        Some(gram)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Ngrams<'_> {}

impl FusedIterator for Ngrams<'_> {}

/// Extract n-grams of the given size from a string
pub fn ngrams(text: &str, n: usize) -> Ngrams<'_> {
    Ngrams::new(text, n)
}

/// Extract trigrams from a string
pub fn tokenize(text: &str) -> Ngrams<'_> {
    Ngrams::new(text, TRIGRAM)
}

/// Count occurrences of each n-gram in a string
pub fn gram_counts(text: &str, n: usize) -> FxHashMap<&str, u32> {
    let mut counts: FxHashMap<&str, u32> = FxHashMap::default();
    for gram in ngrams(text, n) {
        *counts.entry(gram).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple() {
        let trigrams: Vec<_> = tokenize("hello").collect();
        // "hello" -> "hel", "ell", "llo"
        assert_eq!(trigrams, vec!["hel", "ell", "llo"]);
    }

    #[test]
    fn test_tokenize_length() {
        for text in ["abc", "abcd", "mazerunner", "a b c d e"] {
            let len = text.chars().count();
            assert_eq!(tokenize(text).count(), len - 2, "text: {:?}", text);
        }
    }

    #[test]
    fn test_tokenize_short_input() {
        assert_eq!(tokenize("").count(), 0);
        assert_eq!(tokenize("a").count(), 0);
        assert_eq!(tokenize("ab").count(), 0);
    }

    #[test]
    fn test_tokenize_no_normalization() {
        let upper: Vec<_> = tokenize("ABC").collect();
        let lower: Vec<_> = tokenize("abc").collect();
        assert_ne!(upper, lower);

        // Whitespace and punctuation are ordinary characters
        let trigrams: Vec<_> = tokenize("a b!").collect();
        assert_eq!(trigrams, vec!["a b", " b!"]);
    }

    #[test]
    fn test_tokenize_multibyte() {
        let trigrams: Vec<_> = tokenize("héllö").collect();
        assert_eq!(trigrams, vec!["hél", "éll", "llö"]);

        let trigrams: Vec<_> = tokenize("日本語です").collect();
        assert_eq!(trigrams, vec!["日本語", "本語で", "語です"]);
    }

    #[test]
    fn test_tokenize_restartable() {
        let first: Vec<_> = tokenize("amazing").collect();
        let second: Vec<_> = tokenize("amazing").collect();
        assert_eq!(first, second);

        let iter = tokenize("amazing");
        let cloned: Vec<_> = iter.clone().collect();
        assert_eq!(cloned, iter.collect::<Vec<_>>());
    }

    #[test]
    fn test_exact_size_hint() {
        let mut iter = tokenize("running");
        assert_eq!(iter.len(), 5);
        iter.next();
        assert_eq!(iter.len(), 4);
        iter.by_ref().for_each(drop);
        assert_eq!(iter.len(), 0);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_other_gram_sizes() {
        let bigrams: Vec<_> = ngrams("abcd", 2).collect();
        assert_eq!(bigrams, vec!["ab", "bc", "cd"]);

        let unigrams: Vec<_> = ngrams("abc", 1).collect();
        assert_eq!(unigrams, vec!["a", "b", "c"]);

        // Window as long as the text yields the text itself
        let whole: Vec<_> = ngrams("abcd", 4).collect();
        assert_eq!(whole, vec!["abcd"]);

        assert_eq!(ngrams("abcd", 0).count(), 0);
        assert_eq!(ngrams("abcd", 5).count(), 0);
    }

    #[test]
    fn test_gram_counts() {
        let counts = gram_counts("aaaa", TRIGRAM);
        // "aaaa" -> "aaa", "aaa"
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("aaa"), Some(&2));

        let counts = gram_counts("mazerunner", TRIGRAM);
        assert_eq!(counts.values().sum::<u32>(), 8);
    }
}
