//! Primary text and token table.
//!
//! Segment texts are concatenated into one buffer and each newly appended
//! span is tokenized on its own. Token spans are absolute byte offsets into
//! the finished buffer.

use std::ops::Range;

use crate::errors::TokenizeError;
use crate::tokenizer::{validate_tokens, Tokenizer};

/// Where one segment landed in the primary text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpan {
    /// Byte span of the segment text, separator excluded.
    pub text: Range<usize>,
    /// Indices into [`PrimaryText::tokens`].
    pub tokens: Range<usize>,
}

/// Finished primary text with its token table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryText {
    pub text: String,
    pub tokens: Vec<Range<usize>>,
    /// One entry per appended segment, in order.
    pub segments: Vec<SegmentSpan>,
}

impl PrimaryText {
    pub fn token_text(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).and_then(|span| self.text.get(span.clone()))
    }
}

/// Incremental builder for [`PrimaryText`].
///
/// Without a tokenizer every non-empty segment becomes exactly one token.
pub struct TextBuilder<'a> {
    separator: &'a str,
    tokenizer: Option<&'a dyn Tokenizer>,
    built: PrimaryText,
}

impl<'a> TextBuilder<'a> {
    pub fn new(separator: &'a str, tokenizer: Option<&'a dyn Tokenizer>) -> Self {
        Self {
            separator,
            tokenizer,
            built: PrimaryText::default(),
        }
    }

    /// Append a segment and tokenize it.
    ///
    /// On error the buffer and token table are left as they were before
    /// the call.
    pub fn push_segment(&mut self, segment_text: &str) -> Result<&SegmentSpan, TokenizeError> {
        let rollback = self.built.text.len();
        if !self.built.segments.is_empty() {
            self.built.text.push_str(self.separator);
        }
        let start = self.built.text.len();
        self.built.text.push_str(segment_text);
        let end = self.built.text.len();

        let spans = match self.tokenize(start, end) {
            Ok(spans) => spans,
            Err(err) => {
                self.built.text.truncate(rollback);
                return Err(err);
            }
        };

        let first_token = self.built.tokens.len();
        self.built.tokens.extend(spans);
        let index = self.built.segments.len();
        self.built.segments.push(SegmentSpan {
            text: start..end,
            tokens: first_token..self.built.tokens.len(),
        });
        Ok(&self.built.segments[index])
    }

    fn tokenize(&self, start: usize, end: usize) -> Result<Vec<Range<usize>>, TokenizeError> {
        match self.tokenizer {
            Some(tokenizer) => {
                let spans = tokenizer.tokenize(&self.built.text, start, end)?;
                validate_tokens(&spans, start, end)?;
                Ok(spans)
            }
            None if start == end => Ok(Vec::new()),
            None => Ok(vec![start..end]),
        }
    }

    pub fn finish(self) -> PrimaryText {
        self.built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{SeparatorTokenizer, UnicodeWordTokenizer};

    struct Broken;

    impl Tokenizer for Broken {
        fn tokenize(&self, _text: &str, start: usize, end: usize) -> Result<Vec<Range<usize>>, TokenizeError> {
            Ok(vec![start..end + 1])
        }
    }

    #[test]
    fn test_concatenation_with_separator() {
        let mut builder = TextBuilder::new("##", None);
        builder.push_segment("one").unwrap();
        builder.push_segment("two").unwrap();
        builder.push_segment("three").unwrap();
        let text = builder.finish();

        assert_eq!(text.text, "one##two##three");
        assert_eq!(text.tokens, vec![0..3, 5..8, 10..15]);
        assert_eq!(text.segments[1].text, 5..8);
        assert_eq!(text.segments[2].tokens, 2..3);
    }

    #[test]
    fn test_tokenizes_only_the_appended_span() {
        let tokenizer = UnicodeWordTokenizer;
        let mut builder = TextBuilder::new(" ", Some(&tokenizer));
        builder.push_segment("Is this example").unwrap();
        let second = builder
            .push_segment("more complicated than it is supposed to be?")
            .unwrap()
            .clone();
        let text = builder.finish();

        assert_eq!(text.tokens.len(), 12);
        assert_eq!(second.tokens, 3..12);
        assert_eq!(text.token_text(3), Some("more"));
        assert_eq!(text.token_text(11), Some("?"));
        for span in &text.tokens[second.tokens.clone()] {
            assert!(span.start >= second.text.start && span.end <= second.text.end);
        }
    }

    #[test]
    fn test_separator_is_not_part_of_tokens() {
        let tokenizer = SeparatorTokenizer::new(vec!['|']);
        let mut builder = TextBuilder::new("|", Some(&tokenizer));
        builder.push_segment("a|b").unwrap();
        builder.push_segment("c").unwrap();
        let text = builder.finish();
        assert_eq!(text.text, "a|b|c");
        assert_eq!(text.segments[1].tokens, 2..3);
    }

    #[test]
    fn test_empty_segment_without_tokenizer_has_no_token() {
        let mut builder = TextBuilder::new(" ", None);
        builder.push_segment("").unwrap();
        builder.push_segment("x").unwrap();
        let text = builder.finish();
        assert_eq!(text.text, " x");
        assert_eq!(text.tokens, vec![1..2]);
        assert!(text.segments[0].tokens.is_empty());
    }

    #[test]
    fn test_invalid_tokens_roll_back() {
        let mut builder = TextBuilder::new(" ", Some(&Broken));
        let err = builder.push_segment("abc").unwrap_err();
        assert!(matches!(err, TokenizeError::InvalidSpan { .. }));
        let text = builder.finish();
        assert_eq!(text.text, "");
        assert!(text.tokens.is_empty());
        assert!(text.segments.is_empty());
    }
}
