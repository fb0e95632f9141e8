//! Grammar element tree
//!
//! This module defines `Element`, the read-only abstract syntax the hoisting
//! analysis consumes. An element is a node kind plus a cardinality tag; the
//! tree is produced by an external grammar front end and never mutated by
//! this crate.

use compact_str::CompactString;
use std::fmt;

/// How often an element may occur at its position in the grammar.
///
/// These are the only four cardinalities a grammar element can carry;
/// the enum is closed so an unknown cardinality cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cardinality {
    /// Exactly once (no suffix)
    #[default]
    One,
    /// Zero or one occurrence (`?`)
    Optional,
    /// Zero or more occurrences (`*`)
    ZeroOrMore,
    /// One or more occurrences (`+`)
    OneOrMore,
}

impl Cardinality {
    /// True when the element may legitimately contribute nothing (`?` or `*`).
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::Optional | Self::ZeroOrMore)
    }

    /// True when the element may repeat (`*` or `+`).
    #[must_use]
    pub const fn is_multiple(self) -> bool {
        matches!(self, Self::ZeroOrMore | Self::OneOrMore)
    }

    /// The cardinality suffix as written in a grammar.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::One => "",
            Self::Optional => "?",
            Self::ZeroOrMore => "*",
            Self::OneOrMore => "+",
        }
    }
}

/// A node of the grammar element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub cardinality: Cardinality,
}

/// The element kinds the analysis models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// A literal keyword token
    Keyword(CompactString),
    /// A reference to another rule (parser, terminal, or enum)
    RuleCall(CompactString),
    /// Ordered alternative branches
    Alternatives(Vec<Element>),
    /// Sequential elements
    Group(Vec<Element>),
    /// Elements in any order, each consumed once
    UnorderedGroup(Vec<Element>),
    /// A feature assignment wrapping a sub-element
    Assignment {
        /// Assigned feature name
        feature: CompactString,
        /// The wrapped element
        element: Box<Element>,
    },
    /// A pure side-effect marker; contributes no tokens
    Action(CompactString),
    /// An embedded semantic predicate (foreign boolean expression,
    /// inserted verbatim into generated guards)
    Predicate(CompactString),
}

impl Element {
    #[must_use]
    pub const fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            cardinality: Cardinality::One,
        }
    }

    /// Create a keyword element
    #[must_use]
    pub fn keyword(value: impl Into<CompactString>) -> Self {
        Self::new(ElementKind::Keyword(value.into()))
    }

    /// Create a rule call element
    #[must_use]
    pub fn rule_call(name: impl Into<CompactString>) -> Self {
        Self::new(ElementKind::RuleCall(name.into()))
    }

    /// Create a group (sequence) element
    ///
    /// A single-element group collapses to that element.
    #[must_use]
    pub fn group<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut vec: Vec<_> = elements.into_iter().collect();
        if vec.len() == 1 {
            vec.pop().unwrap()
        } else {
            Self::new(ElementKind::Group(vec))
        }
    }

    /// Create an alternatives element
    ///
    /// A single-branch alternatives collapses to that branch.
    #[must_use]
    pub fn alternatives<I>(branches: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut vec: Vec<_> = branches.into_iter().collect();
        if vec.len() == 1 {
            vec.pop().unwrap()
        } else {
            Self::new(ElementKind::Alternatives(vec))
        }
    }

    /// Create an unordered group element
    #[must_use]
    pub fn unordered_group<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::new(ElementKind::UnorderedGroup(elements.into_iter().collect()))
    }

    /// Create an assignment wrapping `element`
    #[must_use]
    pub fn assignment(feature: impl Into<CompactString>, element: Self) -> Self {
        Self::new(ElementKind::Assignment {
            feature: feature.into(),
            element: Box::new(element),
        })
    }

    /// Create an action element
    #[must_use]
    pub fn action(text: impl Into<CompactString>) -> Self {
        Self::new(ElementKind::Action(text.into()))
    }

    /// Create a semantic predicate element
    #[must_use]
    pub fn predicate(source: impl Into<CompactString>) -> Self {
        Self::new(ElementKind::Predicate(source.into()))
    }

    /// Set cardinality to `?`
    #[must_use]
    pub fn opt(mut self) -> Self {
        self.cardinality = Cardinality::Optional;
        self
    }

    /// Set cardinality to `*`
    #[must_use]
    pub fn star(mut self) -> Self {
        self.cardinality = Cardinality::ZeroOrMore;
        self
    }

    /// Set cardinality to `+`
    #[must_use]
    pub fn plus(mut self) -> Self {
        self.cardinality = Cardinality::OneOrMore;
        self
    }

    /// A short, kind-level description used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            ElementKind::Keyword(_) => "keyword",
            ElementKind::RuleCall(_) => "rule call",
            ElementKind::Alternatives(_) => "alternatives",
            ElementKind::Group(_) => "group",
            ElementKind::UnorderedGroup(_) => "unordered group",
            ElementKind::Assignment { .. } => "assignment",
            ElementKind::Action(_) => "action",
            ElementKind::Predicate(_) => "semantic predicate",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, elements: &[Element], sep: &str) -> fmt::Result {
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                write!(f, "{element}")?;
            }
            Ok(())
        }

        match &self.kind {
            ElementKind::Keyword(value) => write!(f, "'{value}'")?,
            ElementKind::RuleCall(name) => write!(f, "{name}")?,
            ElementKind::Alternatives(branches) => {
                f.write_str("(")?;
                join(f, branches, " | ")?;
                f.write_str(")")?;
            }
            ElementKind::Group(elements) => {
                f.write_str("(")?;
                join(f, elements, " ")?;
                f.write_str(")")?;
            }
            ElementKind::UnorderedGroup(elements) => {
                f.write_str("(")?;
                join(f, elements, " & ")?;
                f.write_str(")")?;
            }
            ElementKind::Assignment { feature, element } => {
                write!(f, "{feature}={element}")?;
            }
            ElementKind::Action(text) => write!(f, "{{{text}}}")?,
            ElementKind::Predicate(source) => write!(f, "<{source}>")?,
        }
        f.write_str(self.cardinality.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cardinality_predicates() {
        assert!(!Cardinality::One.is_optional());
        assert!(Cardinality::Optional.is_optional());
        assert!(Cardinality::ZeroOrMore.is_optional());
        assert!(!Cardinality::OneOrMore.is_optional());

        assert!(!Cardinality::One.is_multiple());
        assert!(!Cardinality::Optional.is_multiple());
        assert!(Cardinality::ZeroOrMore.is_multiple());
        assert!(Cardinality::OneOrMore.is_multiple());
    }

    #[test]
    fn test_singleton_collapse() {
        let element = Element::group(vec![Element::keyword("a")]);
        assert!(matches!(element.kind, ElementKind::Keyword(_)));

        let element = Element::alternatives(vec![Element::keyword("a")]);
        assert!(matches!(element.kind, ElementKind::Keyword(_)));
    }

    #[test]
    fn test_display() {
        let element = Element::group(vec![
            Element::keyword("a"),
            Element::rule_call("Expr").star(),
        ]);
        assert_eq!(element.to_string(), "('a' Expr*)");

        let element = Element::alternatives(vec![
            Element::predicate("p0"),
            Element::action("Init"),
        ]);
        assert_eq!(element.to_string(), "(<p0> | {Init})");
    }
}
