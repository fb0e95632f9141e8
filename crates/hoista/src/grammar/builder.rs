//! Grammar construction and validation

use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};

use crate::grammar::{Element, ElementKind, Grammar, GrammarError};

/// Builder for [`Grammar`] values.
///
/// Rules may be registered in any order; validation happens in
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    parser_rules: Vec<(CompactString, Element)>,
    terminal_rules: Vec<CompactString>,
    enum_rules: Vec<CompactString>,
}

impl GrammarBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser rule with its element body.
    #[must_use]
    pub fn parser_rule(mut self, name: impl Into<CompactString>, body: Element) -> Self {
        self.parser_rules.push((name.into(), body));
        self
    }

    /// Register a terminal rule. Only the name matters to the analysis.
    #[must_use]
    pub fn terminal_rule(mut self, name: impl Into<CompactString>) -> Self {
        self.terminal_rules.push(name.into());
        self
    }

    /// Register an enum rule. Only the name matters to the analysis.
    #[must_use]
    pub fn enum_rule(mut self, name: impl Into<CompactString>) -> Self {
        self.enum_rules.push(name.into());
        self
    }

    /// Validate and build the grammar.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::DuplicateRule`] when a name is registered
    /// twice, and [`GrammarError::UndefinedRule`] when a rule body calls a
    /// rule that was never registered.
    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut seen: HashSet<&CompactString, ahash::RandomState> =
            HashSet::with_hasher(ahash::RandomState::new());
        for name in self
            .parser_rules
            .iter()
            .map(|(name, _)| name)
            .chain(&self.terminal_rules)
            .chain(&self.enum_rules)
        {
            if !seen.insert(name) {
                return Err(GrammarError::DuplicateRule(name.clone()));
            }
        }

        for (_, body) in &self.parser_rules {
            check_rule_calls(body, &seen)?;
        }
        drop(seen);

        let mut parser_rules: HashMap<CompactString, Element, ahash::RandomState> =
            HashMap::with_hasher(ahash::RandomState::new());
        parser_rules.extend(self.parser_rules);
        let mut terminal_rules: HashSet<CompactString, ahash::RandomState> =
            HashSet::with_hasher(ahash::RandomState::new());
        terminal_rules.extend(self.terminal_rules);
        let mut enum_rules: HashSet<CompactString, ahash::RandomState> =
            HashSet::with_hasher(ahash::RandomState::new());
        enum_rules.extend(self.enum_rules);

        Ok(Grammar {
            parser_rules,
            terminal_rules,
            enum_rules,
        })
    }
}

fn check_rule_calls(
    element: &Element,
    defined: &HashSet<&CompactString, ahash::RandomState>,
) -> Result<(), GrammarError> {
    match &element.kind {
        ElementKind::RuleCall(name) => {
            if !defined.contains(name) {
                return Err(GrammarError::UndefinedRule(name.clone()));
            }
        }
        ElementKind::Alternatives(children)
        | ElementKind::Group(children)
        | ElementKind::UnorderedGroup(children) => {
            for child in children {
                check_rule_calls(child, defined)?;
            }
        }
        ElementKind::Assignment { element, .. } => {
            check_rule_calls(element, defined)?;
        }
        ElementKind::Keyword(_) | ElementKind::Action(_) | ElementKind::Predicate(_) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simple() {
        let grammar = GrammarBuilder::new()
            .parser_rule("S", Element::keyword("a"))
            .build();
        assert!(grammar.is_ok(), "Should build single-rule grammar");
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let result = GrammarBuilder::new()
            .parser_rule("S", Element::keyword("a"))
            .terminal_rule("S")
            .build();
        assert_eq!(
            result.unwrap_err(),
            GrammarError::DuplicateRule("S".into())
        );
    }

    #[test]
    fn test_undefined_rule_call_rejected() {
        let result = GrammarBuilder::new()
            .parser_rule("S", Element::rule_call("Missing"))
            .build();
        assert_eq!(
            result.unwrap_err(),
            GrammarError::UndefinedRule("Missing".into())
        );
    }

    #[test]
    fn test_nested_rule_calls_validated() {
        let result = GrammarBuilder::new()
            .parser_rule(
                "S",
                Element::alternatives(vec![
                    Element::keyword("a"),
                    Element::assignment("value", Element::rule_call("Missing")),
                ]),
            )
            .build();
        assert!(result.is_err(), "Should reject nested undefined rule call");
    }
}
