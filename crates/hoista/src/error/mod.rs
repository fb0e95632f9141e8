//! # Error Types
//!
//! Failure conditions raised by token analysis and guard construction.
//!
//! All analysis operations return `Result` values; nothing in this crate
//! panics on malformed grammars. A [`HoistingError`] aborts hoisting for the
//! rule in which it occurred; the whole-grammar driver converts it into a
//! [`RuleDiagnostic`] naming the rule and keeps processing the remaining
//! rules.
//!
//! When the `diagnostics` feature is enabled, errors integrate with
//! [`miette`] for rich reporting.

use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Why hoisting failed for a rule or element.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum HoistingError {
    /// The bounded token analysis could not resolve within the configured
    /// limit, or a branch's structure makes the requested lookahead
    /// positions unanswerable. Recoverable: the caller may treat the
    /// branches as not (yet) distinguishable.
    #[error("token analysis aborted: {reason}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(hoista::analysis_aborted)))]
    AnalysisAborted {
        reason: String,
    },

    /// An element kind the guard algorithm does not model.
    #[error("unsupported construct: {construct}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(hoista::unsupported_construct)))]
    UnsupportedConstruct {
        construct: String,
    },

    /// Internal invariant violation: a token was requested from an element
    /// that can never produce one. Indicates a defect, not a property of
    /// the grammar.
    #[error("element is not a token: {element}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(hoista::not_a_token)))]
    NotAToken {
        element: String,
    },

    /// A rule's guard computation re-entered itself before completing.
    #[error("rule '{rule}' requires its own guard to compute its guard")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(hoista::recursive_rule)))]
    RecursiveRule {
        rule: CompactString,
    },
}

impl HoistingError {
    /// Shorthand for an [`AnalysisAborted`](Self::AnalysisAborted) value.
    #[must_use]
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::AnalysisAborted {
            reason: reason.into(),
        }
    }
}

/// A per-rule hoisting failure, produced by whole-grammar processing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[error("cannot hoist rule '{rule}'")]
#[cfg_attr(feature = "diagnostics", diagnostic(code(hoista::rule_failed)))]
pub struct RuleDiagnostic {
    /// The rule whose hoisting was abandoned
    pub rule: CompactString,
    /// The underlying failure
    #[source]
    pub source: HoistingError,
}
