//! # Hoisting Processor
//!
//! Walks rule element trees bottom-up and assembles guard expressions.
//!
//! ## Overview
//!
//! [`HoistingProcessor`] is the orchestrator: it dispatches on element
//! kinds, folds group sequences (stopping at the first unconditionally
//! consumed token, past which a predicate can no longer influence branch
//! selection), merges lexically identical alternatives, and invokes
//! [`TokenAnalysis`] to find minimal distinguishing lookahead positions for
//! the remaining branches.
//!
//! Guards are cached per rule and per group. The rule cache distinguishes
//! "currently being computed" from "absent", so a rule whose guard depends
//! on itself fails with [`HoistingError::RecursiveRule`] instead of
//! re-entering forever.
//!
//! A failure while processing one rule aborts hoisting for that rule only;
//! [`HoistingProcessor::process_grammar`] translates it into a
//! [`RuleDiagnostic`] and keeps going. No partial guard is ever emitted for
//! a failed rule.

pub mod config;

pub use config::HoistingConfig;

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::analysis::TokenAnalysis;
use crate::error::{HoistingError, RuleDiagnostic};
use crate::grammar::{Cardinality, Element, ElementKind, Grammar, RuleKind};
use crate::guard::{self, Guard, PathGuard, TokenGuard};

/// Cache state of a rule's guard computation.
#[derive(Debug, Clone)]
enum RuleEntry {
    /// The rule's guard is being computed further up the call stack
    InProgress,
    /// The rule's guard is available
    Ready(Guard),
}

/// Identity of an element node within the borrowed grammar tree.
///
/// Addresses are stable and unique for the processor's lifetime because the
/// grammar is borrowed immutably; synthesized elements are never cached, so
/// their transient addresses never enter the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ElementId(usize);

impl ElementId {
    fn of(element: &Element) -> Self {
        Self(std::ptr::from_ref(element) as usize)
    }
}

/// Guards for a whole grammar, plus per-rule failures.
#[derive(Debug)]
pub struct HoistingResult {
    /// Successfully hoisted rules
    pub guards: HashMap<CompactString, Guard, ahash::RandomState>,
    /// Rules whose hoisting was abandoned, with the reason
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl HoistingResult {
    /// The guard computed for `rule`, if hoisting succeeded for it.
    #[must_use]
    pub fn guard(&self, rule: &str) -> Option<&Guard> {
        self.guards.get(rule)
    }

    /// True when every rule hoisted successfully.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Synthesizes guards for the rules of one grammar.
pub struct HoistingProcessor<'g> {
    grammar: &'g Grammar,
    config: HoistingConfig,
    rule_cache: HashMap<CompactString, RuleEntry, ahash::RandomState>,
    group_cache: HashMap<ElementId, Guard, ahash::RandomState>,
}

impl<'g> HoistingProcessor<'g> {
    #[must_use]
    pub fn new(grammar: &'g Grammar, config: HoistingConfig) -> Self {
        debug_assert!(config.token_limit > 0, "token limit must be positive");
        Self {
            grammar,
            config,
            rule_cache: HashMap::with_hasher(ahash::RandomState::new()),
            group_cache: HashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    /// Compute guards for every parser rule, in sorted rule-name order.
    ///
    /// Failures are collected per rule; the remaining rules still hoist.
    pub fn process_grammar(&mut self) -> HoistingResult {
        let grammar = self.grammar;
        let mut guards = HashMap::with_hasher(ahash::RandomState::new());
        let mut diagnostics = Vec::new();
        for name in grammar.parser_rule_names() {
            match self.guard_for_rule(name) {
                Ok(guard) => {
                    guards.insert(CompactString::from(name), guard);
                }
                Err(source) => {
                    if self.config.debug {
                        tracing::debug!(rule = name, error = %source, "hoisting failed");
                    }
                    diagnostics.push(RuleDiagnostic {
                        rule: CompactString::from(name),
                        source,
                    });
                }
            }
        }
        HoistingResult {
            guards,
            diagnostics,
        }
    }

    /// The guard of a parser rule, computed once and cached.
    ///
    /// # Errors
    ///
    /// Any [`HoistingError`] raised while analyzing the rule's body;
    /// [`HoistingError::RecursiveRule`] when the computation re-enters
    /// itself.
    pub fn guard_for_rule(&mut self, name: &str) -> Result<Guard, HoistingError> {
        match self.rule_cache.get(name) {
            Some(RuleEntry::Ready(guard)) => return Ok(guard.clone()),
            Some(RuleEntry::InProgress) => {
                return Err(HoistingError::RecursiveRule {
                    rule: CompactString::from(name),
                });
            }
            None => {}
        }
        let grammar = self.grammar;
        let body = grammar
            .parser_rule(name)
            .ok_or_else(|| HoistingError::UnsupportedConstruct {
                construct: format!("reference to undefined rule '{name}'"),
            })?;
        if self.config.debug {
            tracing::debug!(rule = name, "computing hoisting guard");
        }
        self.rule_cache
            .insert(CompactString::from(name), RuleEntry::InProgress);
        match self.element_guard(body, true) {
            Ok(guard) => {
                self.rule_cache
                    .insert(CompactString::from(name), RuleEntry::Ready(guard.clone()));
                Ok(guard)
            }
            Err(error) => {
                self.rule_cache.remove(name);
                Err(error)
            }
        }
    }

    /// The guard of an arbitrary element.
    ///
    /// # Errors
    ///
    /// As [`guard_for_rule`](Self::guard_for_rule);
    /// [`HoistingError::UnsupportedConstruct`] for unordered groups.
    pub fn guard_for_element(&mut self, element: &Element) -> Result<Guard, HoistingError> {
        // Caller-supplied elements may be transient, so identity caching is
        // off for them; rule calls inside still hit the rule cache.
        self.element_guard(element, false)
    }

    fn element_guard(
        &mut self,
        element: &Element,
        cacheable: bool,
    ) -> Result<Guard, HoistingError> {
        let guard = match &element.kind {
            ElementKind::Alternatives(branches) => self.alternatives_guard(branches, cacheable)?,
            ElementKind::Group(children) => self.group_guard(element, children, cacheable)?,
            ElementKind::Predicate(source) => Guard::Predicate(source.clone()),
            ElementKind::Keyword(_) => Guard::Terminal,
            ElementKind::RuleCall(name) => match self.grammar.rule_kind(name) {
                Some(RuleKind::Terminal | RuleKind::Enum) => Guard::Terminal,
                Some(RuleKind::Parser) => self.guard_for_rule(name)?,
                None => {
                    return Err(HoistingError::UnsupportedConstruct {
                        construct: format!("reference to undefined rule '{name}'"),
                    });
                }
            },
            ElementKind::Action(_) => Guard::Unguarded,
            ElementKind::Assignment { element: inner, .. } => {
                self.element_guard(inner, cacheable)?
            }
            ElementKind::UnorderedGroup(_) => {
                return Err(HoistingError::UnsupportedConstruct {
                    construct: format!("unordered group {element} in guard construction"),
                });
            }
        };
        match element.cardinality {
            // The first iteration of `+` is mandatory, so its guard stands.
            Cardinality::One | Cardinality::OneOrMore => Ok(guard),
            Cardinality::Optional | Cardinality::ZeroOrMore => {
                if guard.is_trivial() {
                    // Zero occurrences are allowed, so no token is consumed
                    // unconditionally either.
                    Ok(Guard::Unguarded)
                } else {
                    // Without a surrounding sequence there is no follow
                    // context to distinguish "taken" from "skipped".
                    Err(HoistingError::aborted(format!(
                        "optional element {element} carries a guard but has no group context"
                    )))
                }
            }
        }
    }

    fn group_guard(
        &mut self,
        group: &Element,
        children: &[Element],
        cacheable: bool,
    ) -> Result<Guard, HoistingError> {
        if cacheable {
            if let Some(cached) = self.group_cache.get(&ElementId::of(group)) {
                return Ok(cached.clone());
            }
        }
        let guard = self.fold_group(children, cacheable)?;
        if cacheable {
            self.group_cache.insert(ElementId::of(group), guard.clone());
        }
        Ok(guard)
    }

    /// Fold child guards into a conjunction, left to right.
    ///
    /// Folding stops after the first child that unconditionally consumes a
    /// token: any predicate beyond it is evaluated only after that token is
    /// committed and cannot contribute to branch selection.
    fn fold_group(
        &mut self,
        children: &[Element],
        cacheable: bool,
    ) -> Result<Guard, HoistingError> {
        let mut guards = Vec::new();
        let mut has_terminal = false;
        for (index, child) in children.iter().enumerate() {
            if child.cardinality.is_optional() {
                // `?`/`*` in sequence context: the guard decision is between
                // taking one iteration and skipping straight to the rest.
                let mut stripped = child.clone();
                stripped.cardinality = Cardinality::One;
                let rest = children[index + 1..].to_vec();
                let mut taken = Vec::with_capacity(rest.len() + 1);
                taken.push(stripped);
                taken.extend(rest.iter().cloned());
                let expanded = Element::new(ElementKind::Alternatives(vec![
                    Element::group(taken),
                    Element::group(rest),
                ]));
                let guard = self.element_guard(&expanded, false)?;
                has_terminal |= guard.has_terminal();
                guards.push(guard);
                // The rest of the sequence is folded into both branches.
                return Ok(Guard::conjunction(guards, has_terminal));
            }
            let guard = self.element_guard(child, cacheable)?;
            let terminal = guard.has_terminal();
            guards.push(guard);
            if terminal {
                has_terminal = true;
                break;
            }
        }
        Ok(Guard::conjunction(guards, has_terminal))
    }

    fn alternatives_guard(
        &mut self,
        branches: &[Element],
        cacheable: bool,
    ) -> Result<Guard, HoistingError> {
        let mut states: Vec<(&Element, Vec<Guard>)> = Vec::with_capacity(branches.len());
        for branch in branches {
            let guard = self.element_guard(branch, cacheable)?;
            states.push((branch, vec![guard]));
        }
        let has_terminal = states.iter().all(|(_, guards)| guards[0].has_terminal());
        if states.iter().all(|(_, guards)| guards[0].is_trivial()) {
            return Ok(if has_terminal {
                Guard::Terminal
            } else {
                Guard::Unguarded
            });
        }

        let mut analysis = TokenAnalysis::new(self.grammar, &self.config);

        // Branches that cannot be told apart lexically are merged: both
        // guards are offered, whichever fires selects the shared shape.
        let mut index = 0;
        while index < states.len() {
            let mut other = index + 1;
            while other < states.len() {
                let (a, b) = (states[index].0, states[other].0);
                if analysis.are_paths_identical(a, b)? {
                    let (_, moved) = states.remove(other);
                    states[index].1.extend(moved);
                } else {
                    other += 1;
                }
            }
            index += 1;
        }

        if states.len() == 1 {
            let (_, guards) = states.pop().unwrap();
            return Ok(Guard::merged(guards));
        }

        let elements: Vec<&Element> = states.iter().map(|(element, _)| *element).collect();
        let differences = analysis.find_minimal_path_difference(&elements)?;

        let mut paths = Vec::with_capacity(states.len());
        for ((_, guards), sequences) in states.into_iter().zip(differences) {
            let inner = Guard::merged(guards);
            if inner.is_trivial() {
                // An unconstrained branch is taken whenever the others are
                // ruled out; it contributes no clause.
                continue;
            }
            paths.push(Guard::Path(PathGuard {
                token: TokenGuard::from_sequences(sequences),
                guard: Box::new(inner),
            }));
        }
        Ok(guard::prefer_shorter(Guard::alternatives(
            paths,
            has_terminal,
        )))
    }
}
