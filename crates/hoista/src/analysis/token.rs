//! Lookahead tokens and their runtime match conditions

use compact_str::CompactString;
use std::fmt;

use crate::error::HoistingError;
use crate::grammar::{Element, ElementKind, Grammar, RuleKind};

/// An atomic lookahead unit at a specific 1-based position.
///
/// Position is part of a token's identity: the same keyword observed at two
/// different lookahead positions is two different tokens for analysis
/// purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Token {
    /// A keyword literal
    Keyword {
        value: CompactString,
        position: usize,
    },
    /// A terminal or enum rule token
    TerminalRule {
        name: CompactString,
        position: usize,
    },
    /// End of input
    Eof {
        position: usize,
    },
}

impl Token {
    /// The 1-based lookahead position this token was observed at.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Keyword { position, .. }
            | Self::TerminalRule { position, .. }
            | Self::Eof { position } => *position,
        }
    }

    /// True when `element` contributes exactly one lookahead token.
    ///
    /// Keywords and calls to terminal or enum rules are tokens; the
    /// synthetic no-element case (end of input) is also a token.
    #[must_use]
    pub fn is_token(grammar: &Grammar, element: Option<&Element>) -> bool {
        match element {
            None => true,
            Some(element) => match &element.kind {
                ElementKind::Keyword(_) => true,
                ElementKind::RuleCall(name) => matches!(
                    grammar.rule_kind(name),
                    Some(RuleKind::Terminal | RuleKind::Enum)
                ),
                _ => false,
            },
        }
    }

    /// Construct the token for `element` at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`HoistingError::NotAToken`] for element kinds that do not
    /// produce a single token; this indicates a dispatch defect in the
    /// caller, not a grammar property.
    pub fn from_element(
        grammar: &Grammar,
        element: Option<&Element>,
        position: usize,
    ) -> Result<Self, HoistingError> {
        let Some(element) = element else {
            return Ok(Self::Eof { position });
        };
        match &element.kind {
            ElementKind::Keyword(value) => Ok(Self::Keyword {
                value: value.clone(),
                position,
            }),
            ElementKind::RuleCall(name)
                if matches!(
                    grammar.rule_kind(name),
                    Some(RuleKind::Terminal | RuleKind::Enum)
                ) =>
            {
                Ok(Self::TerminalRule {
                    name: name.clone(),
                    position,
                })
            }
            _ => Err(HoistingError::NotAToken {
                element: element.to_string(),
            }),
        }
    }

    /// Render the runtime check that the token at this lookahead position is
    /// *not* this token.
    ///
    /// Guards are phrased negatively: a branch's guard passes when the
    /// lookahead already rules the branch out, or its semantic predicate
    /// holds.
    #[must_use]
    pub fn negated_condition(&self) -> String {
        match self {
            Self::Keyword { value, position } => {
                format!("!\"{value}\".equals(input.LT({position}).getText())")
            }
            Self::TerminalRule { name, position } => {
                format!("input.LA({position}) != {name}")
            }
            Self::Eof { position } => format!("input.LA({position}) != EOF"),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword { value, position } => write!(f, "'{value}'@{position}"),
            Self::TerminalRule { name, position } => write!(f, "{name}@{position}"),
            Self::Eof { position } => write!(f, "EOF@{position}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;

    fn grammar() -> Grammar {
        GrammarBuilder::new()
            .terminal_rule("ID")
            .enum_rule("Color")
            .parser_rule("S", Element::keyword("a"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_is_token() {
        let grammar = grammar();
        assert!(Token::is_token(&grammar, Some(&Element::keyword("a"))));
        assert!(Token::is_token(&grammar, Some(&Element::rule_call("ID"))));
        assert!(Token::is_token(&grammar, Some(&Element::rule_call("Color"))));
        assert!(Token::is_token(&grammar, None));
        assert!(!Token::is_token(&grammar, Some(&Element::rule_call("S"))));
        assert!(!Token::is_token(&grammar, Some(&Element::action("X"))));
        assert!(!Token::is_token(&grammar, Some(&Element::predicate("p0"))));
    }

    #[test]
    fn test_from_element_rejects_non_tokens() {
        let grammar = grammar();
        let result = Token::from_element(&grammar, Some(&Element::predicate("p0")), 1);
        assert!(matches!(result, Err(HoistingError::NotAToken { .. })));
    }

    #[test]
    fn test_negated_conditions() {
        let grammar = grammar();
        let keyword = Token::from_element(&grammar, Some(&Element::keyword("ab")), 2).unwrap();
        assert_eq!(
            keyword.negated_condition(),
            "!\"ab\".equals(input.LT(2).getText())"
        );

        let terminal = Token::from_element(&grammar, Some(&Element::rule_call("ID")), 1).unwrap();
        assert_eq!(terminal.negated_condition(), "input.LA(1) != ID");

        let eof = Token::from_element(&grammar, None, 3).unwrap();
        assert_eq!(eof.negated_condition(), "input.LA(3) != EOF");
    }
}
