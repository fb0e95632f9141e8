//! Partial token-path assignments tracked during branch exploration

use smallvec::SmallVec;

use crate::analysis::{Token, TokenSequence};
use crate::error::HoistingError;

/// One partial assignment of tokens to a requested set of lookahead indices.
///
/// `remaining` holds the still-unresolved requested indices relative to the
/// current cursor; every consumed element shifts them down by one, and an
/// index reaching zero records the element's token. Paths are deep-copied at
/// branch points, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TokenAnalysisPath {
    tokens: SmallVec<[Token; 4]>,
    remaining: SmallVec<[usize; 4]>,
    position: usize,
}

impl TokenAnalysisPath {
    fn new(indexes: &[usize]) -> Self {
        let mut remaining: SmallVec<[usize; 4]> = indexes.iter().copied().collect();
        remaining.sort_unstable();
        remaining.dedup();
        Self {
            tokens: SmallVec::new(),
            remaining,
            position: 1,
        }
    }

    fn is_done(&self) -> bool {
        self.remaining.is_empty()
    }

    fn advance(
        &mut self,
        make_token: &dyn Fn(usize) -> Result<Token, HoistingError>,
    ) -> Result<(), HoistingError> {
        if self.is_done() {
            self.position += 1;
            return Ok(());
        }
        if self.remaining[0] == 0 {
            self.tokens.push(make_token(self.position)?);
            self.remaining.remove(0);
        }
        for index in &mut self.remaining {
            *index -= 1;
        }
        self.position += 1;
        Ok(())
    }
}

/// A set of [`TokenAnalysisPath`] values sharing one requested-index set.
///
/// The `empty` sentinel is the identity element for [`merge`](Self::merge);
/// it models a cardinality branch that contributes nothing and is never
/// considered done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TokenAnalysisPaths {
    paths: Vec<TokenAnalysisPath>,
    empty: bool,
}

impl TokenAnalysisPaths {
    /// A fresh path set requesting `indexes` (0-based offsets).
    pub(crate) fn start(indexes: &[usize]) -> Self {
        Self {
            paths: vec![TokenAnalysisPath::new(indexes)],
            empty: false,
        }
    }

    /// The merge identity.
    pub(crate) fn empty() -> Self {
        Self {
            paths: Vec::new(),
            empty: true,
        }
    }

    /// True when every contained path has resolved all requested indices.
    pub(crate) fn is_done(&self) -> bool {
        !self.empty && self.paths.iter().all(TokenAnalysisPath::is_done)
    }

    /// Union of two path sets; duplicates collapse.
    pub(crate) fn merge(mut self, other: Self) -> Self {
        if other.empty {
            return self;
        }
        if self.empty {
            return other;
        }
        for path in other.paths {
            if !self.paths.contains(&path) {
                self.paths.push(path);
            }
        }
        self
    }

    /// Record one consumed token element on every open path.
    ///
    /// `make_token` receives the per-path cursor position, so the same
    /// element yields position-distinct tokens on paths of different depth.
    pub(crate) fn advance(
        &mut self,
        make_token: impl Fn(usize) -> Result<Token, HoistingError>,
    ) -> Result<(), HoistingError> {
        for path in &mut self.paths {
            path.advance(&make_token)?;
        }
        Ok(())
    }

    /// The smallest cursor position across contained paths.
    ///
    /// Used as the re-entry watermark for rule-call recursion detection.
    pub(crate) fn min_position(&self) -> usize {
        self.paths
            .iter()
            .map(|path| path.position)
            .min()
            .unwrap_or(1)
    }

    /// The resolved token sequences, in insertion order, deduplicated.
    pub(crate) fn token_sequences(&self) -> Vec<TokenSequence> {
        let mut sequences: Vec<TokenSequence> = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            if !sequences.contains(&path.tokens) {
                sequences.push(path.tokens.clone());
            }
        }
        sequences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;

    fn keyword(value: &str, position: usize) -> Token {
        Token::Keyword {
            value: CompactString::from(value),
            position,
        }
    }

    fn advance_keyword(paths: &mut TokenAnalysisPaths, value: &str) {
        let value = CompactString::from(value);
        paths
            .advance(|position| {
                Ok(Token::Keyword {
                    value: value.clone(),
                    position,
                })
            })
            .unwrap();
    }

    #[test]
    fn test_records_requested_indexes_only() {
        let mut paths = TokenAnalysisPaths::start(&[0, 2]);
        advance_keyword(&mut paths, "a");
        assert!(!paths.is_done());
        advance_keyword(&mut paths, "b");
        assert!(!paths.is_done());
        advance_keyword(&mut paths, "c");
        assert!(paths.is_done());

        let sequences = paths.token_sequences();
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].as_slice(), &[keyword("a", 1), keyword("c", 3)]);
    }

    #[test]
    fn test_empty_is_merge_identity() {
        let mut concrete = TokenAnalysisPaths::start(&[0]);
        advance_keyword(&mut concrete, "a");

        let merged = TokenAnalysisPaths::empty().merge(concrete.clone());
        assert_eq!(merged, concrete);
        let merged = concrete.clone().merge(TokenAnalysisPaths::empty());
        assert_eq!(merged, concrete);

        assert!(!TokenAnalysisPaths::empty().is_done());
    }

    #[test]
    fn test_merge_deduplicates() {
        let mut a = TokenAnalysisPaths::start(&[0]);
        advance_keyword(&mut a, "a");
        let b = a.clone();
        let merged = a.merge(b);
        assert_eq!(merged.token_sequences().len(), 1);
    }

    #[test]
    fn test_min_position_tracks_shallowest_path() {
        let mut deep = TokenAnalysisPaths::start(&[3]);
        advance_keyword(&mut deep, "a");
        advance_keyword(&mut deep, "b");
        let shallow = TokenAnalysisPaths::start(&[3]);
        let merged = deep.merge(shallow);
        assert_eq!(merged.min_position(), 1);
    }
}
