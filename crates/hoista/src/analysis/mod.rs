//! # Token Analysis
//!
//! Bounded lookahead enumeration over the grammar element tree.
//!
//! ## Overview
//!
//! Given an element and a set of requested lookahead indices, the analysis
//! produces every concrete token sequence the element can place at those
//! indices, exploring alternation by forking paths and repetition by
//! re-feeding results up to the configured token limit. On top of that it
//! provides the two comparisons guard construction needs:
//!
//! - [`TokenAnalysis::find_minimal_path_difference`] — the smallest
//!   lookahead-index subsets that uniquely identify each branch of an
//!   alternative
//! - [`TokenAnalysis::are_paths_identical`] — whether two branches are
//!   lexically indistinguishable within the limit
//!
//! All searches are bounded by `HoistingConfig::token_limit`, enforced as a
//! hard iteration cap; exceeding it fails with
//! [`HoistingError::AnalysisAborted`] rather than extending the search.

pub mod token;

mod paths;

pub use token::Token;

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::error::HoistingError;
use crate::grammar::{Cardinality, Element, ElementKind, Grammar, RuleKind};
use crate::hoisting::HoistingConfig;
use paths::TokenAnalysisPaths;

/// A resolved sequence of tokens, one per requested lookahead index.
pub type TokenSequence = SmallVec<[Token; 4]>;

type SequenceSet = HashSet<TokenSequence, ahash::RandomState>;

/// Internal signal: the symbolic equality check cannot decide. Selects the
/// enumerative fallback and never escapes this module.
#[derive(Debug)]
struct SymbolicAnalysisUnavailable;

/// Walks element subtrees to enumerate bounded lookahead token sequences.
pub struct TokenAnalysis<'a> {
    grammar: &'a Grammar,
    config: &'a HoistingConfig,
    /// Parser rules currently being inlined, with the lookahead watermark at
    /// entry; re-entering a rule at the same watermark is a non-consuming
    /// cycle.
    rule_stack: Vec<(compact_str::CompactString, usize)>,
}

impl<'a> TokenAnalysis<'a> {
    #[must_use]
    pub fn new(grammar: &'a Grammar, config: &'a HoistingConfig) -> Self {
        Self {
            grammar,
            config,
            rule_stack: Vec::new(),
        }
    }

    /// Enumerate the token sequences `element` can place at the requested
    /// 0-based lookahead indices.
    ///
    /// # Errors
    ///
    /// [`HoistingError::AnalysisAborted`] when some path through the element
    /// ends before supplying all requested indices, when repetition fails to
    /// converge within the token limit, or when rule inlining recurses
    /// without consuming input. [`HoistingError::NotAToken`] and
    /// [`HoistingError::UnsupportedConstruct`] indicate malformed input and
    /// propagate unchanged.
    pub fn token_paths(
        &mut self,
        element: &Element,
        indexes: &[usize],
    ) -> Result<Vec<TokenSequence>, HoistingError> {
        tracing::trace!(%element, ?indexes, "token path analysis");
        let result = self.walk(element, TokenAnalysisPaths::start(indexes))?;
        if !result.is_done() {
            return Err(HoistingError::aborted(format!(
                "a path through {element} ends before the requested lookahead"
            )));
        }
        Ok(result.token_sequences())
    }

    /// For each branch of an alternative, find the smallest set of
    /// lookahead-index subsets whose token sequences are disjoint from every
    /// other branch's sequences at the same subset.
    ///
    /// Subsets are tried by increasing size and, within a size, in ascending
    /// lexicographic order, so the lowest positions win when several
    /// minimal distinguishing sets exist. A branch is frozen as soon as one
    /// subset distinguishes it. The returned sequence lists are sorted.
    ///
    /// A combination some branch cannot answer (its paths end before the
    /// probed positions) is unusable for comparison and is skipped; if every
    /// combination within the limit is unusable or non-distinguishing, the
    /// search fails.
    ///
    /// # Errors
    ///
    /// [`HoistingError::AnalysisAborted`] when the limit is exhausted with
    /// branches still unresolved.
    pub fn find_minimal_path_difference(
        &mut self,
        branches: &[&Element],
    ) -> Result<Vec<Vec<TokenSequence>>, HoistingError> {
        let limit = self.config.token_limit;
        let mut resolved: Vec<Option<Vec<TokenSequence>>> = vec![None; branches.len()];

        for weight in 1..=limit {
            if resolved.iter().all(Option::is_some) {
                break;
            }
            'combinations: for combination in Combinations::new(limit, weight) {
                if resolved.iter().all(Option::is_some) {
                    break;
                }
                let mut sets: Vec<SequenceSet> = Vec::with_capacity(branches.len());
                for branch in branches {
                    match self.sequences_or_aborted(branch, &combination)? {
                        Some(set) => sets.push(set),
                        None => continue 'combinations,
                    }
                }

                for (index, slot) in resolved.iter_mut().enumerate() {
                    if slot.is_some() {
                        continue;
                    }
                    let distinct = sets
                        .iter()
                        .enumerate()
                        .all(|(other, set)| other == index || sets[index].is_disjoint(set));
                    if distinct {
                        let mut sequences: Vec<TokenSequence> =
                            sets[index].iter().cloned().collect();
                        sequences.sort_unstable();
                        *slot = Some(sequences);
                    }
                }
            }
        }

        resolved
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    HoistingError::aborted(format!(
                        "alternative {} cannot be distinguished within the token limit",
                        index + 1
                    ))
                })
            })
            .collect()
    }

    /// Whether two branches produce the same token sequences for every
    /// window within the limit.
    ///
    /// The symbolic check runs first; it is an acknowledged extension point
    /// that always reports "not decidable", so the enumerative fallback
    /// decides: both branches running out of length at the same window means
    /// identical, only one running out means different, and differing
    /// sequence sets at any window mean different.
    ///
    /// # Errors
    ///
    /// [`HoistingError::AnalysisAborted`] when the limit is exhausted
    /// without resolution. Branches identical for every window up to the
    /// limit are *not* assumed identical — merging genuinely different
    /// branches would under-guard one of them.
    pub fn are_paths_identical(
        &mut self,
        a: &Element,
        b: &Element,
    ) -> Result<bool, HoistingError> {
        match Self::are_paths_identical_symbolic(a, b) {
            Ok(identical) => Ok(identical),
            Err(SymbolicAnalysisUnavailable) => self.are_paths_identical_fallback(a, b),
        }
    }

    fn are_paths_identical_symbolic(
        _a: &Element,
        _b: &Element,
    ) -> Result<bool, SymbolicAnalysisUnavailable> {
        // Extension point: a symbolic path-equality decision procedure.
        Err(SymbolicAnalysisUnavailable)
    }

    fn are_paths_identical_fallback(
        &mut self,
        a: &Element,
        b: &Element,
    ) -> Result<bool, HoistingError> {
        for window in 0..self.config.token_limit {
            let indexes: Vec<usize> = (0..=window).collect();
            let sequences_a = self.sequences_or_aborted(a, &indexes)?;
            let sequences_b = self.sequences_or_aborted(b, &indexes)?;
            match (sequences_a, sequences_b) {
                (None, None) => return Ok(true),
                (None, Some(_)) | (Some(_), None) => return Ok(false),
                (Some(set_a), Some(set_b)) => {
                    if set_a != set_b {
                        return Ok(false);
                    }
                }
            }
        }
        Err(HoistingError::aborted(
            "alternatives remain indistinguishable at the token limit",
        ))
    }

    fn sequences_or_aborted(
        &mut self,
        element: &Element,
        indexes: &[usize],
    ) -> Result<Option<SequenceSet>, HoistingError> {
        match self.token_paths(element, indexes) {
            Ok(sequences) => Ok(Some(sequences.into_iter().collect())),
            Err(HoistingError::AnalysisAborted { .. }) => Ok(None),
            Err(other) => Err(other),
        }
    }

    /// Walk `element` honoring its cardinality.
    fn walk(
        &mut self,
        element: &Element,
        prefix: TokenAnalysisPaths,
    ) -> Result<TokenAnalysisPaths, HoistingError> {
        if prefix.is_done() {
            return Ok(prefix);
        }
        match element.cardinality {
            Cardinality::One => self.walk_once(element, prefix),
            Cardinality::Optional => {
                let taken = self.walk_once(element, prefix.clone())?;
                Ok(prefix.merge(taken))
            }
            Cardinality::ZeroOrMore | Cardinality::OneOrMore => {
                let mut result = if element.cardinality.is_optional() {
                    prefix.clone()
                } else {
                    TokenAnalysisPaths::empty()
                };
                let mut current = prefix;
                for _ in 0..self.config.token_limit {
                    let next = self.walk_once(element, current.clone())?;
                    if next.is_done() || next == current {
                        // All requested indices resolved, or a fixed point:
                        // further iterations contribute nothing new.
                        return Ok(result.merge(next));
                    }
                    result = result.merge(next.clone());
                    current = next;
                }
                Err(HoistingError::aborted(format!(
                    "repetition of {element} did not converge within the token limit"
                )))
            }
        }
    }

    /// Walk a single occurrence of `element`, ignoring its cardinality.
    fn walk_once(
        &mut self,
        element: &Element,
        prefix: TokenAnalysisPaths,
    ) -> Result<TokenAnalysisPaths, HoistingError> {
        match &element.kind {
            ElementKind::Group(children) => {
                let mut current = prefix;
                for child in children {
                    if current.is_done() {
                        break;
                    }
                    current = self.walk(child, current)?;
                }
                Ok(current)
            }
            ElementKind::Alternatives(branches) => {
                let mut result = TokenAnalysisPaths::empty();
                for branch in branches {
                    result = result.merge(self.walk(branch, prefix.clone())?);
                }
                Ok(result)
            }
            ElementKind::UnorderedGroup(children) => {
                // Any order, each element consumed once: modeled as repeated
                // alternation, looping while any member is still mandatory.
                let cardinality = if children.iter().all(|c| c.cardinality.is_optional()) {
                    Cardinality::ZeroOrMore
                } else {
                    Cardinality::OneOrMore
                };
                let mut rewritten = Element::new(ElementKind::Alternatives(children.clone()));
                rewritten.cardinality = cardinality;
                self.walk(&rewritten, prefix)
            }
            ElementKind::Keyword(_) => self.consume_token(element, prefix),
            ElementKind::RuleCall(name) => match self.grammar.rule_kind(name) {
                Some(RuleKind::Terminal | RuleKind::Enum) => self.consume_token(element, prefix),
                Some(RuleKind::Parser) => {
                    let frame = (name.clone(), prefix.min_position());
                    if self.rule_stack.contains(&frame) {
                        return Err(HoistingError::aborted(format!(
                            "rule '{name}' recurses without consuming input"
                        )));
                    }
                    let body = self.grammar.parser_rule(name).ok_or_else(|| {
                        HoistingError::UnsupportedConstruct {
                            construct: format!("reference to undefined rule '{name}'"),
                        }
                    })?;
                    self.rule_stack.push(frame);
                    let result = self.walk(body, prefix);
                    self.rule_stack.pop();
                    result
                }
                None => Err(HoistingError::UnsupportedConstruct {
                    construct: format!("reference to undefined rule '{name}'"),
                }),
            },
            ElementKind::Assignment { element: inner, .. } => self.walk(inner, prefix),
            ElementKind::Action(_) | ElementKind::Predicate(_) => Ok(prefix),
        }
    }

    fn consume_token(
        &self,
        element: &Element,
        mut prefix: TokenAnalysisPaths,
    ) -> Result<TokenAnalysisPaths, HoistingError> {
        prefix.advance(|position| Token::from_element(self.grammar, Some(element), position))?;
        Ok(prefix)
    }
}

/// Iterates the `k`-element subsets of `0..n` in ascending lexicographic
/// order, the order that makes the minimal-difference search prefer the
/// lowest lookahead positions.
struct Combinations {
    indexes: SmallVec<[usize; 4]>,
    n: usize,
    exhausted: bool,
    first: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            indexes: (0..k).collect(),
            n,
            exhausted: k > n || k == 0,
            first: true,
        }
    }
}

impl Iterator for Combinations {
    type Item = SmallVec<[usize; 4]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        if self.first {
            self.first = false;
            return Some(self.indexes.clone());
        }
        let k = self.indexes.len();
        let mut i = k;
        loop {
            if i == 0 {
                self.exhausted = true;
                return None;
            }
            i -= 1;
            if self.indexes[i] < self.n - (k - i) {
                break;
            }
        }
        self.indexes[i] += 1;
        for j in i + 1..k {
            self.indexes[j] = self.indexes[j - 1] + 1;
        }
        Some(self.indexes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    fn config(token_limit: usize) -> HoistingConfig {
        HoistingConfig {
            token_limit,
            debug: false,
        }
    }

    fn combos(n: usize, k: usize) -> Vec<Vec<usize>> {
        Combinations::new(n, k).map(|c| c.to_vec()).collect()
    }

    #[test]
    fn test_combinations_lexicographic() {
        assert_eq!(combos(3, 1), vec![vec![0], vec![1], vec![2]]);
        assert_eq!(combos(3, 2), vec![vec![0, 1], vec![0, 2], vec![1, 2]]);
        assert_eq!(combos(3, 3), vec![vec![0, 1, 2]]);
        assert!(combos(2, 3).is_empty());
    }

    #[test]
    fn test_token_paths_sequence() {
        let grammar = GrammarBuilder::new()
            .parser_rule(
                "S",
                Element::group(vec![Element::keyword("a"), Element::keyword("b")]),
            )
            .build()
            .unwrap();
        let config = config(10);
        let mut analysis = TokenAnalysis::new(&grammar, &config);

        let body = grammar.parser_rule("S").unwrap();
        let sequences = analysis.token_paths(body, &[0, 1]).unwrap();
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0][0].position(), 1);
        assert_eq!(sequences[0][1].position(), 2);
    }

    #[test]
    fn test_token_paths_short_path_aborts() {
        let grammar = GrammarBuilder::new()
            .parser_rule("S", Element::keyword("a"))
            .build()
            .unwrap();
        let config = config(10);
        let mut analysis = TokenAnalysis::new(&grammar, &config);

        let body = grammar.parser_rule("S").unwrap();
        let result = analysis.token_paths(body, &[1]);
        assert!(matches!(
            result,
            Err(HoistingError::AnalysisAborted { .. })
        ));
    }

    #[test]
    fn test_token_paths_star_branches() {
        // 'a'* 'b' at index 0 can see 'a' (loop taken) or 'b' (loop skipped)
        let grammar = GrammarBuilder::new()
            .parser_rule(
                "S",
                Element::group(vec![
                    Element::keyword("a").star(),
                    Element::keyword("b"),
                ]),
            )
            .build()
            .unwrap();
        let config = config(10);
        let mut analysis = TokenAnalysis::new(&grammar, &config);

        let body = grammar.parser_rule("S").unwrap();
        let sequences = analysis.token_paths(body, &[0]).unwrap();
        let mut values: Vec<String> = sequences
            .iter()
            .map(|sequence| sequence[0].to_string())
            .collect();
        values.sort();
        assert_eq!(values, vec!["'a'@1", "'b'@1"]);
    }

    #[test]
    fn test_left_recursive_rule_aborts() {
        let grammar = GrammarBuilder::new()
            .parser_rule(
                "A",
                Element::alternatives(vec![
                    Element::group(vec![Element::rule_call("A"), Element::keyword("x")]),
                    Element::keyword("y"),
                ]),
            )
            .build()
            .unwrap();
        let config = config(10);
        let mut analysis = TokenAnalysis::new(&grammar, &config);

        let body = grammar.parser_rule("A").unwrap();
        let result = analysis.token_paths(body, &[0]);
        assert!(matches!(
            result,
            Err(HoistingError::AnalysisAborted { .. })
        ));
    }

    #[test]
    fn test_unordered_group_token_paths() {
        let grammar = GrammarBuilder::new()
            .parser_rule(
                "S",
                Element::unordered_group(vec![
                    Element::keyword("a"),
                    Element::keyword("b"),
                ]),
            )
            .build()
            .unwrap();
        let config = config(10);
        let mut analysis = TokenAnalysis::new(&grammar, &config);

        let body = grammar.parser_rule("S").unwrap();
        let sequences = analysis.token_paths(body, &[0]).unwrap();
        let mut values: Vec<String> = sequences
            .iter()
            .map(|sequence| sequence[0].to_string())
            .collect();
        values.sort();
        assert_eq!(values, vec!["'a'@1", "'b'@1"]);
    }
}
