//! # Grammar Module
//!
//! The grammar surface the hoisting analysis consumes.
//!
//! ## Overview
//!
//! A [`Grammar`] is a table of named rules: parser rules carry an
//! [`Element`] body, terminal and enum rules only contribute their name (the
//! analysis treats calls to them as atomic lookahead tokens). Grammars are
//! assembled through [`GrammarBuilder`], which validates rule references at
//! build time.
//!
//! ```rust
//! use hoista::grammar::{Element, GrammarBuilder};
//!
//! let grammar = GrammarBuilder::new()
//!     .terminal_rule("ID")
//!     .parser_rule(
//!         "Decl",
//!         Element::group(vec![Element::keyword("let"), Element::rule_call("ID")]),
//!     )
//!     .build()
//!     .expect("valid grammar");
//! assert!(grammar.parser_rule("Decl").is_some());
//! ```

pub mod builder;
pub mod element;

pub use builder::*;
pub use element::*;

use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use thiserror::Error;

/// The kind of a named grammar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    /// A parser rule; calls to it are inlined during analysis
    Parser,
    /// A terminal rule; calls to it are single lookahead tokens
    Terminal,
    /// An enum rule; calls to it are single lookahead tokens
    Enum,
}

/// Errors detected while building a grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GrammarError {
    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(CompactString),

    #[error("rule '{0}' is referenced but never defined")]
    UndefinedRule(CompactString),
}

/// An immutable rule table.
///
/// The element trees inside a grammar never change once built; the hoisting
/// processor relies on this to key its per-group cache by node identity.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) parser_rules: HashMap<CompactString, Element, ahash::RandomState>,
    pub(crate) terminal_rules: HashSet<CompactString, ahash::RandomState>,
    pub(crate) enum_rules: HashSet<CompactString, ahash::RandomState>,
}

impl Grammar {
    /// Look up the kind of a named rule.
    #[must_use]
    pub fn rule_kind(&self, name: &str) -> Option<RuleKind> {
        if self.parser_rules.contains_key(name) {
            Some(RuleKind::Parser)
        } else if self.terminal_rules.contains(name) {
            Some(RuleKind::Terminal)
        } else if self.enum_rules.contains(name) {
            Some(RuleKind::Enum)
        } else {
            None
        }
    }

    /// The body of a parser rule.
    #[must_use]
    pub fn parser_rule(&self, name: &str) -> Option<&Element> {
        self.parser_rules.get(name)
    }

    /// Parser rule names in sorted order.
    ///
    /// Sorted so whole-grammar processing is deterministic.
    #[must_use]
    pub fn parser_rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parser_rules.keys().map(CompactString::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of parser rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parser_rules.len()
    }

    /// True when the grammar has no parser rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parser_rules.is_empty()
    }
}
