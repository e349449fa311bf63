//! Tokenizers over the shared primary text.
//!
//! A tokenizer only ever sees the span of the segment just appended to the
//! primary text and answers with token spans inside it. Offsets are byte
//! offsets into the full text and always fall on `char` boundaries.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::errors::TokenizeError;

/// Splits a span of the primary text into ordered token spans.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text[start..end]`.
    ///
    /// Returned spans must lie within `start..end`, be non-empty, ordered by
    /// start offset and non-overlapping. Whitespace may be skipped.
    fn tokenize(&self, text: &str, start: usize, end: usize) -> Result<Vec<Range<usize>>, TokenizeError>;
}

fn span_slice(text: &str, start: usize, end: usize) -> Result<&str, TokenizeError> {
    text.get(start..end).ok_or(TokenizeError::OutOfBounds {
        start,
        end,
        len: text.len(),
    })
}

/// Tokenizer based on Unicode word boundaries (UAX #29).
///
/// Words and punctuation become separate tokens; whitespace is dropped.
#[derive(Debug, Clone, Default)]
pub struct UnicodeWordTokenizer;

impl UnicodeWordTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str, start: usize, end: usize) -> Result<Vec<Range<usize>>, TokenizeError> {
        let slice = span_slice(text, start, end)?;
        Ok(slice
            .split_word_bound_indices()
            .filter(|(_, piece)| !piece.chars().all(char::is_whitespace))
            .map(|(offset, piece)| start + offset..start + offset + piece.len())
            .collect())
    }
}

/// Tokenizer that splits on a fixed set of separator characters.
///
/// Separators never end up inside a token, and runs of separators produce
/// no empty tokens.
#[derive(Debug, Clone)]
pub struct SeparatorTokenizer {
    separators: Vec<char>,
}

impl SeparatorTokenizer {
    pub fn new(separators: Vec<char>) -> Self {
        Self { separators }
    }
}

impl Tokenizer for SeparatorTokenizer {
    fn tokenize(&self, text: &str, start: usize, end: usize) -> Result<Vec<Range<usize>>, TokenizeError> {
        let slice = span_slice(text, start, end)?;
        let mut tokens = Vec::new();
        let mut piece_start = 0;
        for (offset, c) in slice.char_indices() {
            if self.separators.contains(&c) {
                if offset > piece_start {
                    tokens.push(start + piece_start..start + offset);
                }
                piece_start = offset + c.len_utf8();
            }
        }
        if slice.len() > piece_start {
            tokens.push(start + piece_start..start + slice.len());
        }
        Ok(tokens)
    }
}

/// Check that `tokens` honor the [`Tokenizer`] contract for `start..end`.
pub fn validate_tokens(tokens: &[Range<usize>], start: usize, end: usize) -> Result<(), TokenizeError> {
    let invalid = |token: &Range<usize>, reason| TokenizeError::InvalidSpan {
        start: token.start,
        end: token.end,
        span_start: start,
        span_end: end,
        reason,
    };

    let mut previous_end = start;
    for token in tokens {
        if token.start >= token.end {
            return Err(invalid(token, "empty token"));
        }
        if token.start < start || token.end > end {
            return Err(invalid(token, "outside the segment"));
        }
        if token.start < previous_end {
            return Err(invalid(token, "overlaps or precedes the previous token"));
        }
        previous_end = token.end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(text: &'a str, tokens: &[Range<usize>]) -> Vec<&'a str> {
        tokens.iter().map(|t| &text[t.clone()]).collect()
    }

    #[test]
    fn test_unicode_tokenizer_splits_punctuation() {
        let text = "Is this example more complicated than it is supposed to be?";
        let tokens = UnicodeWordTokenizer.tokenize(text, 16, text.len()).unwrap();
        assert_eq!(
            texts(text, &tokens),
            vec!["more", "complicated", "than", "it", "is", "supposed", "to", "be", "?"]
        );
        assert_eq!(tokens[0], 16..20);
    }

    #[test]
    fn test_unicode_tokenizer_multibyte() {
        let text = "Straße, café";
        let tokens = UnicodeWordTokenizer.tokenize(text, 0, text.len()).unwrap();
        assert_eq!(texts(text, &tokens), vec!["Straße", ",", "café"]);
    }

    #[test]
    fn test_unicode_tokenizer_rejects_bad_span() {
        let text = "café";
        // Byte 4 is inside the two-byte 'é'.
        let err = UnicodeWordTokenizer.tokenize(text, 0, 4).unwrap_err();
        assert_eq!(err, TokenizeError::OutOfBounds { start: 0, end: 4, len: 5 });
    }

    #[test]
    fn test_separator_tokenizer() {
        let text = "a b..c";
        let tokenizer = SeparatorTokenizer::new(vec![' ', '.']);
        let tokens = tokenizer.tokenize(text, 0, text.len()).unwrap();
        assert_eq!(texts(text, &tokens), vec!["a", "b", "c"]);

        let only_separators = tokenizer.tokenize(" . ", 0, 3).unwrap();
        assert!(only_separators.is_empty());
    }

    #[test]
    fn test_separator_tokenizer_offsets_are_absolute() {
        let text = "xx|one two";
        let tokenizer = SeparatorTokenizer::new(vec![' ']);
        let tokens = tokenizer.tokenize(text, 3, text.len()).unwrap();
        assert_eq!(tokens, vec![3..6, 7..10]);
    }

    #[test]
    fn test_validate_tokens() {
        assert!(validate_tokens(&[0..2, 3..5], 0, 5).is_ok());
        assert!(validate_tokens(&[], 4, 4).is_ok());
        assert!(validate_tokens(&[0..0], 0, 5).is_err());
        assert!(validate_tokens(&[0..6], 0, 5).is_err());
        assert!(validate_tokens(&[2..4, 3..5], 0, 5).is_err());
        assert!(validate_tokens(&[3..5, 0..2], 0, 5).is_err());
    }
}
