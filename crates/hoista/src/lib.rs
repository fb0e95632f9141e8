//! # Hoista
//!
//! Semantic predicate hoisting for LL(*)-style parser generators.
//!
//! ## Overview
//!
//! Given a grammar rule whose alternatives may share a common token prefix,
//! hoista computes for each branch a boolean guard over bounded-lookahead
//! token positions (plus any semantic predicates embedded in the grammar)
//! that lets the generated parser choose the correct branch without
//! backtracking, and renders that guard as an expression string for
//! splicing into generated parser code.
//!
//! - **Token analysis**: enumerates the token sequences each branch can
//!   place at candidate lookahead positions, handling optional and repeated
//!   sub-elements, nested rule calls, and recursion — all bounded by a
//!   configurable token limit.
//! - **Minimal difference search**: tries lookahead-position subsets of
//!   increasing size until every branch's candidate token set is unique,
//!   preferring the lowest positions.
//! - **Guard algebra**: composes trivial, predicate, token, group, path,
//!   alternative, and merged-path guards into a renderable boolean formula
//!   with context-aware parenthesization.
//!
//! Searches that cannot resolve within the limit fail predictably with
//! [`HoistingError::AnalysisAborted`]; nothing loops unboundedly and no
//! under-guarded expression is ever emitted.
//!
//! ## Quick Start
//!
//! ```rust
//! use hoista::{Element, GrammarBuilder, HoistingConfig, HoistingProcessor};
//!
//! // S: <p0> 'a' | <p1> 'b';
//! let grammar = GrammarBuilder::new()
//!     .parser_rule(
//!         "S",
//!         Element::alternatives(vec![
//!             Element::group(vec![Element::predicate("p0"), Element::keyword("a")]),
//!             Element::group(vec![Element::predicate("p1"), Element::keyword("b")]),
//!         ]),
//!     )
//!     .build()
//!     .expect("valid grammar");
//!
//! let mut processor = HoistingProcessor::new(&grammar, HoistingConfig::default());
//! let guard = processor.guard_for_rule("S").expect("hoistable rule");
//! assert_eq!(
//!     guard.render(),
//!     "((!\"a\".equals(input.LT(1).getText()) || (p0)) \
//!      && (!\"b\".equals(input.LT(1).getText()) || (p1)))"
//! );
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Element tree, rule table, and builder
//! - [`analysis`] - Bounded lookahead token analysis
//! - [`guard`] - Guard expression algebra and rendering
//! - [`hoisting`] - The processor orchestrating guard synthesis
//! - [`error`] - Failure conditions

pub mod analysis;
pub mod error;
pub mod grammar;
pub mod guard;
pub mod hoisting;

// Re-export commonly used types
pub use analysis::{Token, TokenAnalysis, TokenSequence};
pub use error::{HoistingError, RuleDiagnostic};
pub use grammar::{Cardinality, Element, ElementKind, Grammar, GrammarBuilder, GrammarError, RuleKind};
pub use guard::{Connective, Guard, TokenGuard};
pub use hoisting::{HoistingConfig, HoistingProcessor, HoistingResult};
