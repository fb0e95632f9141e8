//! # Guard Expressions
//!
//! Composable boolean-expression trees rendered into generated parser code.
//!
//! ## Overview
//!
//! A [`Guard`] is the condition a generated parser evaluates before
//! committing to an alternative. Guards form a closed algebra: trivial
//! guards (no runtime condition), semantic predicates, token guards over
//! lookahead positions, conjunctive groups and alternative sets, and
//! disjunctive merged paths. Trees are immutable once built; the
//! constructors ([`Guard::conjunction`], [`Guard::alternatives`],
//! [`Guard::merged`], [`TokenGuard::from_sequences`]) are pure reducers that
//! normalize away empty and singleton levels.
//!
//! Rendering is context-aware: [`Guard::render_in`] takes the surrounding
//! logical connective and omits parentheses when a node's own connective
//! matches it, so `(a && (b && c))` flattens to `a && b && c`. The
//! context-free [`Guard::render`] always parenthesizes multi-term results.
//!
//! Token guards render *negated* match conditions: a branch's clause reads
//! "the lookahead already rules this branch out, or its own predicate
//! holds". Consequently a token sequence (all positions must match for the
//! branch to be selected) renders as a disjunction of negated per-position
//! conditions, and a set of alternative sequences as a conjunction of those.

use compact_str::CompactString;

use crate::analysis::{Token, TokenSequence};

/// A logical connective, used as rendering context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    /// `&&`
    Conjunction,
    /// `||`
    Disjunction,
}

impl Connective {
    const fn separator(self) -> &'static str {
        match self {
            Self::Conjunction => " && ",
            Self::Disjunction => " || ",
        }
    }
}

/// A guard over lookahead tokens: the negated condition that the input
/// matches one of the distinguishing token sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGuard {
    /// One token at one position
    Single(Token),
    /// One sequence of tokens at several positions
    Sequence(Vec<Token>),
    /// Several alternative sequences
    Alternative(Vec<TokenGuard>),
}

impl TokenGuard {
    /// Build a token guard from the distinguishing sequences of one branch,
    /// collapsing singleton levels.
    #[must_use]
    pub fn from_sequences(sequences: Vec<TokenSequence>) -> Self {
        let mut guards: Vec<Self> = sequences.into_iter().map(Self::from_sequence).collect();
        if guards.len() == 1 {
            guards.pop().unwrap()
        } else {
            Self::Alternative(guards)
        }
    }

    fn from_sequence(sequence: TokenSequence) -> Self {
        if sequence.len() == 1 {
            Self::Single(sequence.into_iter().next().unwrap())
        } else {
            Self::Sequence(sequence.into_vec())
        }
    }

    /// Render with an optional surrounding connective.
    #[must_use]
    pub fn render_in(&self, context: Option<Connective>) -> String {
        match self {
            Self::Single(token) => token.negated_condition(),
            Self::Sequence(tokens) => match tokens.as_slice() {
                [] => "true".to_string(),
                [single] => single.negated_condition(),
                _ => {
                    let joined = tokens
                        .iter()
                        .map(Token::negated_condition)
                        .collect::<Vec<_>>()
                        .join(Connective::Disjunction.separator());
                    parenthesize(joined, Connective::Disjunction, context)
                }
            },
            Self::Alternative(guards) => match guards.as_slice() {
                [] => "true".to_string(),
                [single] => single.render_in(context),
                _ => {
                    let joined = guards
                        .iter()
                        .map(|guard| guard.render_in(Some(Connective::Conjunction)))
                        .collect::<Vec<_>>()
                        .join(Connective::Conjunction.separator());
                    parenthesize(joined, Connective::Conjunction, context)
                }
            },
        }
    }

    /// Context-free rendering.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_in(None)
    }
}

/// Ordered conjunction of the non-trivial guards of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupGuard {
    /// Non-trivial child guards, in element order
    pub guards: Vec<Guard>,
    /// Whether the folded sequence unconditionally consumes a token
    pub has_terminal: bool,
}

/// One branch's clause: lookahead rules the branch out, or its guard holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGuard {
    /// The branch's distinguishing token guard
    pub token: TokenGuard,
    /// The branch's own hoisting guard
    pub guard: Box<Guard>,
}

/// Conjunction of per-branch path clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternativesGuard {
    /// One clause per guarded branch
    pub paths: Vec<Guard>,
    /// True when every branch unconditionally consumes a token
    pub has_terminal: bool,
}

/// Disjunction of the guards of branches proven lexically identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPathGuard {
    pub guards: Vec<Guard>,
}

/// A composable boolean guard expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guard {
    /// No condition, no token consumed (e.g. an action)
    Unguarded,
    /// No condition, but a concrete token is consumed
    Terminal,
    /// A semantic predicate, inserted verbatim
    Predicate(CompactString),
    /// A bare token guard
    Token(TokenGuard),
    /// Conjunction over a sequence's guards
    Group(GroupGuard),
    /// One branch's token-or-guard clause
    Path(PathGuard),
    /// Conjunction of branch clauses
    Alternatives(AlternativesGuard),
    /// Disjunction of identical branches' guards
    MergedPath(MergedPathGuard),
}

impl Guard {
    /// Fold the guards of a sequence into a conjunction.
    ///
    /// Trivial members are dropped; an empty result collapses to
    /// [`Guard::Terminal`] or [`Guard::Unguarded`] depending on
    /// `has_terminal`, and a single member whose terminal flag agrees is
    /// returned unchanged.
    #[must_use]
    pub fn conjunction(guards: Vec<Self>, has_terminal: bool) -> Self {
        let mut guards: Vec<Self> = guards.into_iter().filter(|g| !g.is_trivial()).collect();
        if guards.is_empty() {
            return if has_terminal {
                Self::Terminal
            } else {
                Self::Unguarded
            };
        }
        if guards.len() == 1 && guards[0].has_terminal() == has_terminal {
            return guards.pop().unwrap();
        }
        Self::Group(GroupGuard {
            guards,
            has_terminal,
        })
    }

    /// Combine the guards of lexically identical branches disjunctively.
    #[must_use]
    pub fn merged(mut guards: Vec<Self>) -> Self {
        if guards.len() == 1 {
            return guards.pop().unwrap();
        }
        Self::MergedPath(MergedPathGuard { guards })
    }

    /// Conjoin per-branch path clauses into an alternatives guard.
    ///
    /// Trivial clauses (branches whose own guard is trivial) impose no
    /// constraint and are dropped.
    #[must_use]
    pub fn alternatives(paths: Vec<Self>, has_terminal: bool) -> Self {
        let mut paths: Vec<Self> = paths.into_iter().filter(|p| !p.is_trivial()).collect();
        if paths.is_empty() {
            return if has_terminal {
                Self::Terminal
            } else {
                Self::Unguarded
            };
        }
        if paths.len() == 1 && paths[0].has_terminal() == has_terminal {
            return paths.pop().unwrap();
        }
        Self::Alternatives(AlternativesGuard {
            paths,
            has_terminal,
        })
    }

    /// True when this guard imposes no runtime condition.
    #[must_use]
    pub fn is_trivial(&self) -> bool {
        match self {
            Self::Unguarded | Self::Terminal => true,
            Self::Predicate(_) | Self::Token(_) => false,
            Self::Group(group) => group.guards.iter().all(Self::is_trivial),
            Self::Path(path) => path.guard.is_trivial(),
            Self::Alternatives(alternatives) => alternatives.paths.iter().all(Self::is_trivial),
            // A disjunction containing an unconditional branch always passes
            Self::MergedPath(merged) => {
                merged.guards.is_empty() || merged.guards.iter().any(Self::is_trivial)
            }
        }
    }

    /// True when evaluating past this guard implies a concrete input token
    /// has been unconditionally consumed.
    #[must_use]
    pub fn has_terminal(&self) -> bool {
        match self {
            Self::Unguarded | Self::Predicate(_) | Self::Token(_) => false,
            Self::Terminal => true,
            Self::Group(group) => group.has_terminal,
            Self::Path(path) => path.guard.has_terminal(),
            Self::Alternatives(alternatives) => alternatives.has_terminal,
            Self::MergedPath(merged) => {
                !merged.guards.is_empty() && merged.guards.iter().all(Self::has_terminal)
            }
        }
    }

    /// Context-free rendering; multi-term results are parenthesized.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_in(None)
    }

    /// Render with the surrounding connective; parentheses are omitted when
    /// this node's own top-level connective matches it.
    #[must_use]
    pub fn render_in(&self, context: Option<Connective>) -> String {
        match self {
            Self::Unguarded | Self::Terminal => "true".to_string(),
            Self::Predicate(source) => format!("({source})"),
            Self::Token(token) => token.render_in(context),
            Self::Group(group) => render_terms(&group.guards, Connective::Conjunction, context),
            Self::Path(path) => {
                let rendered = format!(
                    "{} || {}",
                    path.token.render_in(Some(Connective::Disjunction)),
                    path.guard.render_in(Some(Connective::Disjunction)),
                );
                parenthesize(rendered, Connective::Disjunction, context)
            }
            Self::Alternatives(alternatives) => {
                render_terms(&alternatives.paths, Connective::Conjunction, context)
            }
            Self::MergedPath(merged) => {
                render_terms(&merged.guards, Connective::Disjunction, context)
            }
        }
    }

    /// The rendered guard wrapped in the target parser's predicate syntax,
    /// or the empty string for a trivial guard.
    #[must_use]
    pub fn render_predicate(&self) -> String {
        if self.is_trivial() {
            String::new()
        } else {
            format!("{{{}}}?=>", self.render())
        }
    }
}

fn render_terms(guards: &[Guard], own: Connective, context: Option<Connective>) -> String {
    match guards {
        [] => "true".to_string(),
        [single] => single.render_in(context),
        _ => {
            let joined = guards
                .iter()
                .map(|guard| guard.render_in(Some(own)))
                .collect::<Vec<_>>()
                .join(own.separator());
            parenthesize(joined, own, context)
        }
    }
}

fn parenthesize(rendered: String, own: Connective, context: Option<Connective>) -> String {
    if context == Some(own) {
        rendered
    } else {
        format!("({rendered})")
    }
}

/// Return whichever of `guard` and its path-distributed form renders
/// strictly shorter.
///
/// Distribution uses `t || (a && b) == (t || a) && (t || b)` to splice a
/// path's conjunctive inner guard into the surrounding alternatives, which
/// sometimes removes a nesting level the context-aware renderer cannot
/// flatten on its own.
#[must_use]
pub fn prefer_shorter(guard: Guard) -> Guard {
    match distribute_paths(&guard) {
        Some(flattened) if flattened.render().len() < guard.render().len() => flattened,
        _ => guard,
    }
}

fn distribute_paths(guard: &Guard) -> Option<Guard> {
    let Guard::Alternatives(alternatives) = guard else {
        return None;
    };
    let mut changed = false;
    let mut paths = Vec::with_capacity(alternatives.paths.len());
    for clause in &alternatives.paths {
        let Guard::Path(path) = clause else {
            paths.push(clause.clone());
            continue;
        };
        let inner: &[Guard] = match path.guard.as_ref() {
            Guard::Group(group) => &group.guards,
            Guard::Alternatives(nested) => &nested.paths,
            _ => {
                paths.push(clause.clone());
                continue;
            }
        };
        changed = true;
        for term in inner {
            paths.push(Guard::Path(PathGuard {
                token: path.token.clone(),
                guard: Box::new(term.clone()),
            }));
        }
    }
    changed.then(|| {
        Guard::Alternatives(AlternativesGuard {
            paths,
            has_terminal: alternatives.has_terminal,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn keyword(value: &str, position: usize) -> Token {
        Token::Keyword {
            value: value.into(),
            position,
        }
    }

    #[test]
    fn test_conjunction_normalization() {
        assert_eq!(Guard::conjunction(vec![], false), Guard::Unguarded);
        assert_eq!(Guard::conjunction(vec![], true), Guard::Terminal);
        assert_eq!(
            Guard::conjunction(vec![Guard::Terminal, Guard::Unguarded], true),
            Guard::Terminal
        );

        let predicate = Guard::Predicate("p0".into());
        assert_eq!(
            Guard::conjunction(vec![predicate.clone()], false),
            predicate
        );
        // A terminal-consuming singleton keeps its wrapper so the flag survives
        let wrapped = Guard::conjunction(vec![predicate.clone()], true);
        assert!(wrapped.has_terminal());
        assert_eq!(wrapped.render(), "(p0)");
    }

    #[test]
    fn test_merged_triviality() {
        let merged = Guard::merged(vec![Guard::Terminal, Guard::Predicate("p0".into())]);
        assert!(merged.is_trivial(), "disjunction with true is true");

        let merged = Guard::merged(vec![
            Guard::Predicate("p0".into()),
            Guard::Predicate("p1".into()),
        ]);
        assert!(!merged.is_trivial());
        assert_eq!(merged.render(), "((p0) || (p1))");
    }

    #[test]
    fn test_context_aware_parentheses() {
        let group = Guard::Group(GroupGuard {
            guards: vec![
                Guard::Predicate("p0".into()),
                Guard::Predicate("p1".into()),
            ],
            has_terminal: false,
        });
        assert_eq!(group.render(), "((p0) && (p1))");
        assert_eq!(
            group.render_in(Some(Connective::Conjunction)),
            "(p0) && (p1)"
        );
        assert_eq!(
            group.render_in(Some(Connective::Disjunction)),
            "((p0) && (p1))"
        );
    }

    #[test]
    fn test_token_guard_rendering() {
        let single = TokenGuard::from_sequences(vec![smallvec![keyword("a", 1)]]);
        assert_eq!(single.render(), "!\"a\".equals(input.LT(1).getText())");

        let sequence =
            TokenGuard::from_sequences(vec![smallvec![keyword("a", 1), keyword("b", 2)]]);
        assert_eq!(
            sequence.render(),
            "(!\"a\".equals(input.LT(1).getText()) || !\"b\".equals(input.LT(2).getText()))"
        );

        let alternative = TokenGuard::from_sequences(vec![
            smallvec![keyword("a", 1)],
            smallvec![keyword("b", 1)],
        ]);
        assert_eq!(
            alternative.render(),
            "(!\"a\".equals(input.LT(1).getText()) && !\"b\".equals(input.LT(1).getText()))"
        );
    }

    #[test]
    fn test_path_rendering() {
        let path = Guard::Path(PathGuard {
            token: TokenGuard::Single(keyword("a", 1)),
            guard: Box::new(Guard::Predicate("p0".into())),
        });
        assert_eq!(
            path.render(),
            "(!\"a\".equals(input.LT(1).getText()) || (p0))"
        );
        assert_eq!(
            path.render_in(Some(Connective::Disjunction)),
            "!\"a\".equals(input.LT(1).getText()) || (p0)"
        );
    }

    #[test]
    fn test_render_predicate_wrapping() {
        assert_eq!(Guard::Unguarded.render_predicate(), "");
        assert_eq!(Guard::Terminal.render_predicate(), "");
        assert_eq!(
            Guard::Predicate("p0".into()).render_predicate(),
            "{(p0)}?=>"
        );
    }
}
